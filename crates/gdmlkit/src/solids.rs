//! Solid registry: primitives and boolean combinations.
//!
//! Solids form a DAG keyed by name. A boolean may only reference solids that
//! are already registered, so registration order is always a valid
//! dependency order.

use std::collections::HashMap;

use gdmlkit_ir::{Shape, Solid, Transform};

use crate::error::{EntityKind, GeometryError, Result};
use crate::refs::SolidRef;

/// Owns every solid of a geometry, in creation order.
#[derive(Debug, Clone, Default)]
pub struct SolidRegistry {
    solids: Vec<Solid>,
    index: HashMap<String, usize>,
}

impl SolidRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered solids.
    pub fn len(&self) -> usize {
        self.solids.len()
    }

    /// True if no solid is registered.
    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    /// Iterate solids in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Solid> {
        self.solids.iter()
    }

    /// Look up a solid by name.
    pub fn get(&self, name: &str) -> Option<&Solid> {
        self.index.get(name).map(|&i| &self.solids[i])
    }

    /// True if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Reference to an already registered solid.
    pub fn resolve(&self, name: &str) -> Result<SolidRef> {
        if self.contains(name) {
            Ok(SolidRef::new(name))
        } else {
            Err(GeometryError::unknown(EntityKind::Solid, name))
        }
    }

    /// Register a solid with an arbitrary shape.
    ///
    /// Boolean shapes are checked like [`define_union`](Self::define_union).
    pub fn define_primitive(&mut self, name: impl Into<String>, shape: Shape) -> Result<SolidRef> {
        self.insert(name.into(), shape)
    }

    /// Register a box with full lengths `x`, `y`, `z`.
    pub fn define_box(&mut self, name: impl Into<String>, x: f64, y: f64, z: f64) -> Result<SolidRef> {
        self.insert(name.into(), Shape::cuboid(x, y, z))
    }

    /// Register a solid cylinder along Z.
    pub fn define_tube(&mut self, name: impl Into<String>, rmax: f64, z: f64) -> Result<SolidRef> {
        self.insert(name.into(), Shape::tube(rmax, z))
    }

    /// Register a tube with a bore along Z.
    pub fn define_hollow_tube(
        &mut self,
        name: impl Into<String>,
        rmin: f64,
        rmax: f64,
        z: f64,
    ) -> Result<SolidRef> {
        self.insert(name.into(), Shape::hollow_tube(rmin, rmax, z))
    }

    /// Register a solid cone along Z from radius `rmax1` to `rmax2`.
    pub fn define_cone(
        &mut self,
        name: impl Into<String>,
        z: f64,
        rmax1: f64,
        rmax2: f64,
    ) -> Result<SolidRef> {
        self.insert(name.into(), Shape::cone(z, rmax1, rmax2))
    }

    /// Register `first ∪ second`, with `second` placed by `transform` in
    /// `first`'s frame.
    pub fn define_union(
        &mut self,
        name: impl Into<String>,
        first: &SolidRef,
        second: &SolidRef,
        transform: Transform,
    ) -> Result<SolidRef> {
        self.insert(
            name.into(),
            Shape::Union {
                first: first.name().to_string(),
                second: second.name().to_string(),
                transform,
            },
        )
    }

    /// Register `first − second`, with `second` placed by `transform` in
    /// `first`'s frame.
    pub fn define_subtraction(
        &mut self,
        name: impl Into<String>,
        first: &SolidRef,
        second: &SolidRef,
        transform: Transform,
    ) -> Result<SolidRef> {
        self.insert(
            name.into(),
            Shape::Subtraction {
                first: first.name().to_string(),
                second: second.name().to_string(),
                transform,
            },
        )
    }

    /// Extent along Z of a solid. Booleans report their first operand's
    /// extent, since their frame is the first operand's frame.
    pub fn axial_length(&self, solid: &SolidRef) -> Result<f64> {
        let mut current = solid.name();
        // Bounded walk: a well-formed registry never revisits a solid.
        for _ in 0..=self.solids.len() {
            let entry = self
                .get(current)
                .ok_or_else(|| GeometryError::unknown(EntityKind::Solid, current))?;
            match entry.shape.axial_length() {
                Some(len) => return Ok(len),
                None => {
                    if let Some((first, _)) = entry.shape.operands() {
                        current = first;
                    }
                }
            }
        }
        Err(GeometryError::cycle(
            EntityKind::Solid,
            vec![solid.name().to_string()],
        ))
    }

    /// Leaf operands of a left-spine union chain, base first, each paired
    /// with the transform it was joined with (identity for the base).
    ///
    /// Non-union solids flatten to themselves.
    pub fn flatten_union(&self, solid: &SolidRef) -> Result<Vec<(String, Transform)>> {
        let mut members = Vec::new();
        let mut current = solid.name();
        loop {
            let entry = self
                .get(current)
                .ok_or_else(|| GeometryError::unknown(EntityKind::Solid, current))?;
            match &entry.shape {
                Shape::Union {
                    first,
                    second,
                    transform,
                } => {
                    members.push((second.clone(), *transform));
                    current = first;
                }
                _ => {
                    members.push((current.to_string(), Transform::IDENTITY));
                    break;
                }
            }
            if members.len() > self.solids.len() {
                return Err(GeometryError::cycle(
                    EntityKind::Solid,
                    vec![solid.name().to_string()],
                ));
            }
        }
        members.reverse();
        Ok(members)
    }

    /// Fail unless every name in `names` is free.
    pub(crate) fn ensure_free<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for name in names {
            if self.contains(name) || !seen.insert(name) {
                return Err(GeometryError::duplicate(EntityKind::Solid, name));
            }
        }
        Ok(())
    }

    pub(crate) fn into_vec(self) -> Vec<Solid> {
        self.solids
    }

    /// Append solids whose names and references were checked by the caller.
    pub(crate) fn absorb(&mut self, solids: Vec<Solid>) {
        for solid in solids {
            self.index.insert(solid.name.clone(), self.solids.len());
            self.solids.push(solid);
        }
    }

    fn insert(&mut self, name: String, shape: Shape) -> Result<SolidRef> {
        if self.contains(&name) {
            return Err(GeometryError::duplicate(EntityKind::Solid, name));
        }
        if let Some((first, second)) = shape.operands() {
            for operand in [first, second] {
                if operand == name {
                    return Err(GeometryError::cycle(
                        EntityKind::Solid,
                        vec![name.clone(), name.clone()],
                    ));
                }
                if !self.contains(operand) {
                    return Err(GeometryError::unknown(EntityKind::Solid, operand));
                }
            }
        }

        tracing::debug!(solid = %name, kind = shape.tag(), "defined solid");
        self.index.insert(name.clone(), self.solids.len());
        self.solids.push(Solid {
            name: name.clone(),
            shape,
        });
        Ok(SolidRef::new(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdmlkit_ir::Rotation;

    #[test]
    fn define_primitives_and_subtraction() {
        let mut solids = SolidRegistry::new();
        let body = solids.define_box("body", 134.0, 134.0, 30.0).unwrap();
        let bore = solids.define_tube("bore", 51.0, 30.0).unwrap();
        let result = solids
            .define_subtraction("bodyWithBore", &body, &bore, Transform::IDENTITY)
            .unwrap();

        assert_eq!(solids.len(), 3);
        let shape = &solids.get(result.name()).unwrap().shape;
        assert_eq!(shape.operands(), Some(("body", "bore")));
    }

    #[test]
    fn duplicate_name_leaves_registry_unchanged() {
        let mut solids = SolidRegistry::new();
        solids.define_box("worldBox", 4000.0, 4000.0, 4000.0).unwrap();

        let err = solids.define_tube("worldBox", 1.0, 1.0).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::DuplicateName {
                kind: EntityKind::Solid,
                ..
            }
        ));
        assert_eq!(solids.len(), 1);
        assert!(matches!(solids.get("worldBox").unwrap().shape, Shape::Box { .. }));
    }

    #[test]
    fn unknown_operand_creates_nothing() {
        let mut solids = SolidRegistry::new();
        let a = solids.define_box("a", 1.0, 1.0, 1.0).unwrap();
        let ghost = SolidRef::new("ghost");

        let err = solids
            .define_union("aux", &a, &ghost, Transform::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, GeometryError::UnknownReference { ref name, .. } if name == "ghost"));
        assert!(!solids.contains("aux"));
        assert_eq!(solids.len(), 1);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut solids = SolidRegistry::new();
        let a = solids.define_box("a", 1.0, 1.0, 1.0).unwrap();
        let loop_ref = SolidRef::new("loop");
        let err = solids
            .define_union("loop", &a, &loop_ref, Transform::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, GeometryError::CyclicDependency { .. }));
    }

    #[test]
    fn axial_length_follows_first_operand() {
        let mut solids = SolidRegistry::new();
        let flange = solids.define_tube("flange", 67.0, 14.0).unwrap();
        let section = solids.define_tube("section", 46.0, 323.0).unwrap();
        let joined = solids
            .define_union("joined", &flange, &section, Transform::along_z(168.5))
            .unwrap();
        let cone = solids.define_cone("cone", 21.65, 21.5, 34.0).unwrap();

        assert_eq!(solids.axial_length(&joined).unwrap(), 14.0);
        assert_eq!(solids.axial_length(&cone).unwrap(), 21.65);
    }

    #[test]
    fn flatten_left_spine_union() {
        let mut solids = SolidRegistry::new();
        let disk = solids.define_tube("disk", 45.0, 1.0).unwrap();
        let line = solids.define_box("line", 0.3, 17.0, 1.0).unwrap();
        let aux0 = solids
            .define_union("aux0", &disk, &line, Transform::IDENTITY)
            .unwrap();
        let rotated = Transform::rotation(Rotation::about_z(45.0));
        let aux1 = solids.define_union("aux1", &aux0, &line, rotated).unwrap();

        let members = solids.flatten_union(&aux1).unwrap();
        let names: Vec<&str> = members.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["disk", "line", "line"]);
        assert_eq!(members[2].1, rotated);
        assert!(members[0].1.is_identity());
    }
}
