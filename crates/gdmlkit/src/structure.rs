//! Scene graph: assemblies of placements rooted at the world volume.
//!
//! An assembly is sealed as soon as it is placed somewhere, so a placed
//! subtree never changes afterwards. Together with the rule that only
//! existing entities can be placed, this keeps the placement graph acyclic.

use std::collections::{HashMap, HashSet};

use gdmlkit_ir::{Assembly, Placement, PlacementTarget, Transform, World};

use crate::error::{EntityKind, GeometryError, Result};
use crate::refs::{AssemblyRef, VolumeRef};
use crate::volumes::VolumeRegistry;

/// Container receiving a placement.
#[derive(Debug, Clone, Copy)]
pub enum Parent<'a> {
    /// An assembly that has not been placed yet.
    Assembly(&'a AssemblyRef),
    /// The world volume.
    World,
}

impl<'a> From<&'a AssemblyRef> for Parent<'a> {
    fn from(assembly: &'a AssemblyRef) -> Self {
        Parent::Assembly(assembly)
    }
}

/// Entity being placed.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// A logical volume.
    Volume(&'a VolumeRef),
    /// An assembly.
    Assembly(&'a AssemblyRef),
}

impl<'a> From<&'a VolumeRef> for Target<'a> {
    fn from(volume: &'a VolumeRef) -> Self {
        Target::Volume(volume)
    }
}

impl<'a> From<&'a AssemblyRef> for Target<'a> {
    fn from(assembly: &'a AssemblyRef) -> Self {
        Target::Assembly(assembly)
    }
}

#[derive(Debug, Clone)]
struct AssemblyEntry {
    assembly: Assembly,
    sealed: bool,
}

/// Owns the assemblies and the world of a geometry.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    assemblies: Vec<AssemblyEntry>,
    index: HashMap<String, usize>,
    world: Option<World>,
}

impl SceneGraph {
    /// Create an empty scene graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new, empty assembly.
    ///
    /// GDML references volumes and assemblies through the same `volumeref`,
    /// so the name must not be taken by a volume either.
    pub fn begin_assembly(&mut self, volumes: &VolumeRegistry, name: impl Into<String>) -> Result<AssemblyRef> {
        let name = name.into();
        if self.index.contains_key(&name) || volumes.contains(&name) {
            return Err(GeometryError::duplicate(EntityKind::Assembly, name));
        }
        tracing::debug!(assembly = %name, "began assembly");
        self.index.insert(name.clone(), self.assemblies.len());
        self.assemblies.push(AssemblyEntry {
            assembly: Assembly {
                name: name.clone(),
                placements: Vec::new(),
            },
            sealed: false,
        });
        Ok(AssemblyRef::new(name))
    }

    /// Make `volume` the root of the placement tree. Allowed once.
    pub fn set_world(&mut self, volumes: &VolumeRegistry, volume: &VolumeRef) -> Result<()> {
        if let Some(world) = &self.world {
            return Err(GeometryError::WorldAlreadySet(world.volume.clone()));
        }
        if !volumes.contains(volume.name()) {
            return Err(GeometryError::unknown(EntityKind::Volume, volume.name()));
        }
        let target = PlacementTarget::Volume(volume.name().to_string());
        if let Some(parent) = self.parent_of(&target) {
            return Err(GeometryError::cycle(
                EntityKind::Volume,
                vec![volume.name().to_string(), parent, volume.name().to_string()],
            ));
        }

        tracing::debug!(world = %volume, "set world volume");
        self.world = Some(World {
            volume: volume.name().to_string(),
            placements: Vec::new(),
        });
        Ok(())
    }

    /// Place `target` into `parent` as instance `name`.
    ///
    /// Placing an assembly seals it.
    pub fn place<'a>(
        &mut self,
        volumes: &VolumeRegistry,
        parent: Parent<'_>,
        target: impl Into<Target<'a>>,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<()> {
        let name = name.into();
        let target = match target.into() {
            Target::Volume(volume) => {
                if !volumes.contains(volume.name()) {
                    return Err(GeometryError::unknown(EntityKind::Volume, volume.name()));
                }
                if self.world.as_ref().is_some_and(|w| w.volume == volume.name()) {
                    return Err(GeometryError::cycle(
                        EntityKind::Volume,
                        vec![volume.name().to_string(), volume.name().to_string()],
                    ));
                }
                PlacementTarget::Volume(volume.name().to_string())
            }
            Target::Assembly(assembly) => {
                if !self.index.contains_key(assembly.name()) {
                    return Err(GeometryError::unknown(EntityKind::Assembly, assembly.name()));
                }
                PlacementTarget::Assembly(assembly.name().to_string())
            }
        };

        let placements = match parent {
            Parent::World => {
                let world = self.world.as_ref().ok_or(GeometryError::UnresolvedWorld)?;
                &world.placements
            }
            Parent::Assembly(assembly) => {
                let entry = self
                    .index
                    .get(assembly.name())
                    .map(|&i| &self.assemblies[i])
                    .ok_or_else(|| GeometryError::unknown(EntityKind::Assembly, assembly.name()))?;
                if entry.sealed {
                    return Err(GeometryError::SealedAssembly(assembly.name().to_string()));
                }
                if let PlacementTarget::Assembly(inner) = &target {
                    if inner == assembly.name() || self.reaches(inner, assembly.name()) {
                        return Err(GeometryError::cycle(
                            EntityKind::Assembly,
                            vec![assembly.name().to_string(), inner.clone(), assembly.name().to_string()],
                        ));
                    }
                }
                &entry.assembly.placements
            }
        };
        if placements.iter().any(|p| p.name == name) {
            return Err(GeometryError::duplicate(EntityKind::Placement, name));
        }

        tracing::debug!(placement = %name, target = target.name(), "placed");
        if let PlacementTarget::Assembly(inner) = &target {
            if let Some(&i) = self.index.get(inner) {
                self.assemblies[i].sealed = true;
            }
        }
        let placement = Placement {
            name,
            target,
            transform,
        };
        match parent {
            Parent::World => {
                if let Some(world) = self.world.as_mut() {
                    world.placements.push(placement);
                }
            }
            Parent::Assembly(assembly) => {
                if let Some(&i) = self.index.get(assembly.name()) {
                    self.assemblies[i].assembly.placements.push(placement);
                }
            }
        }
        Ok(())
    }

    /// Reference to an existing assembly.
    pub fn lookup(&self, name: &str) -> Result<AssemblyRef> {
        if self.index.contains_key(name) {
            Ok(AssemblyRef::new(name))
        } else {
            Err(GeometryError::unknown(EntityKind::Assembly, name))
        }
    }

    /// Look up an assembly by name.
    pub fn get(&self, name: &str) -> Option<&Assembly> {
        self.index.get(name).map(|&i| &self.assemblies[i].assembly)
    }

    /// True if `name` is an assembly.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// True once the assembly has been placed somewhere.
    pub fn is_sealed(&self, assembly: &AssemblyRef) -> bool {
        self.index
            .get(assembly.name())
            .is_some_and(|&i| self.assemblies[i].sealed)
    }

    /// The world, if set.
    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    /// Number of assemblies.
    pub fn len(&self) -> usize {
        self.assemblies.len()
    }

    /// True if there are no assemblies.
    pub fn is_empty(&self) -> bool {
        self.assemblies.is_empty()
    }

    /// Iterate assemblies in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Assembly> {
        self.assemblies.iter().map(|e| &e.assembly)
    }

    pub(crate) fn into_parts(self) -> (Vec<Assembly>, Option<World>) {
        let assemblies = self.assemblies.into_iter().map(|e| e.assembly).collect();
        (assemblies, self.world)
    }

    /// Append another scene graph whose names and references were checked
    /// by the caller. The world is adopted if this graph has none.
    pub(crate) fn absorb(&mut self, other: SceneGraph) {
        for entry in other.assemblies {
            self.index.insert(entry.assembly.name.clone(), self.assemblies.len());
            self.assemblies.push(entry);
        }
        if self.world.is_none() {
            self.world = other.world;
        }
    }

    /// Name of a container already holding `target`, if any.
    fn parent_of(&self, target: &PlacementTarget) -> Option<String> {
        self.assemblies
            .iter()
            .find(|e| e.assembly.placements.iter().any(|p| &p.target == target))
            .map(|e| e.assembly.name.clone())
    }

    /// True if assembly `from` contains assembly `to`, at any depth.
    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(assembly) = self.get(current) else {
                continue;
            };
            for placement in &assembly.placements {
                if let PlacementTarget::Assembly(inner) = &placement.target {
                    if inner == to {
                        return true;
                    }
                    stack.push(inner);
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MaterialCatalog;
    use crate::materials::MaterialRegistry;
    use crate::solids::SolidRegistry;

    fn volumes() -> (VolumeRegistry, VolumeRef, VolumeRef) {
        let mut solids = SolidRegistry::new();
        let world_box = solids.define_box("worldBox", 4000.0, 4000.0, 4000.0).unwrap();
        let body = solids.define_box("body", 134.0, 134.0, 30.0).unwrap();
        let mut materials = MaterialRegistry::new();
        let catalog = MaterialCatalog::nist();
        let air = materials.resolve(&catalog, "Air", "G4_AIR").unwrap();
        let copper = materials.resolve(&catalog, "Copper", "G4_Cu").unwrap();

        let mut volumes = VolumeRegistry::new();
        let world = volumes
            .bind(&solids, &materials, "world", &world_box, &air)
            .unwrap();
        let body = volumes
            .bind(&solids, &materials, "bodyVolume", &body, &copper)
            .unwrap();
        (volumes, world, body)
    }

    #[test]
    fn nested_assemblies_under_world() {
        let (volumes, world, body) = volumes();
        let mut scene = SceneGraph::new();
        scene.set_world(&volumes, &world).unwrap();

        let chamber = scene.begin_assembly(&volumes, "chamber").unwrap();
        scene
            .place(&volumes, Parent::from(&chamber), &body, "body", Transform::IDENTITY)
            .unwrap();
        scene
            .place(&volumes, Parent::World, &chamber, "Chamber", Transform::along_z(5.0))
            .unwrap();

        assert!(scene.is_sealed(&chamber));
        let world = scene.world().unwrap();
        assert_eq!(world.placements.len(), 1);
        assert_eq!(
            world.placements[0].target,
            PlacementTarget::Assembly("chamber".into())
        );
    }

    #[test]
    fn placed_assembly_is_sealed() {
        let (volumes, world, body) = volumes();
        let mut scene = SceneGraph::new();
        scene.set_world(&volumes, &world).unwrap();
        let chamber = scene.begin_assembly(&volumes, "chamber").unwrap();
        scene
            .place(&volumes, Parent::World, &chamber, "Chamber", Transform::IDENTITY)
            .unwrap();

        let err = scene
            .place(&volumes, Parent::from(&chamber), &body, "late", Transform::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, GeometryError::SealedAssembly(ref n) if n == "chamber"));
        assert!(scene.get("chamber").unwrap().placements.is_empty());
    }

    #[test]
    fn reusing_a_target_is_allowed() {
        let (volumes, _, body) = volumes();
        let mut scene = SceneGraph::new();
        let group = scene.begin_assembly(&volumes, "group").unwrap();
        scene
            .place(&volumes, Parent::from(&group), &body, "left", Transform::translation(-100.0, 0.0, 0.0))
            .unwrap();
        scene
            .place(&volumes, Parent::from(&group), &body, "right", Transform::translation(100.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(scene.get("group").unwrap().placements.len(), 2);
    }

    #[test]
    fn duplicate_instance_name_in_parent_fails() {
        let (volumes, _, body) = volumes();
        let mut scene = SceneGraph::new();
        let group = scene.begin_assembly(&volumes, "group").unwrap();
        scene
            .place(&volumes, Parent::from(&group), &body, "body", Transform::IDENTITY)
            .unwrap();
        let err = scene
            .place(&volumes, Parent::from(&group), &body, "body", Transform::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, GeometryError::DuplicateName { kind: EntityKind::Placement, .. }));
    }

    #[test]
    fn self_placement_is_a_cycle() {
        let (volumes, _, _) = volumes();
        let mut scene = SceneGraph::new();
        let group = scene.begin_assembly(&volumes, "group").unwrap();
        let err = scene
            .place(&volumes, Parent::from(&group), &group, "me", Transform::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, GeometryError::CyclicDependency { .. }));
        assert!(!scene.is_sealed(&group));
    }

    #[test]
    fn world_rules() {
        let (volumes, world, body) = volumes();
        let mut scene = SceneGraph::new();

        let err = scene
            .place(&volumes, Parent::World, &body, "body", Transform::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, GeometryError::UnresolvedWorld));

        scene.set_world(&volumes, &world).unwrap();
        let err = scene.set_world(&volumes, &body).unwrap_err();
        assert!(matches!(err, GeometryError::WorldAlreadySet(ref n) if n == "world"));

        let group = scene.begin_assembly(&volumes, "group").unwrap();
        let err = scene
            .place(&volumes, Parent::from(&group), &world, "inner", Transform::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, GeometryError::CyclicDependency { .. }));
    }

    #[test]
    fn duplicate_assembly_name_fails() {
        let (volumes, _, _) = volumes();
        let mut scene = SceneGraph::new();
        scene.begin_assembly(&volumes, "chamber").unwrap();
        let err = scene.begin_assembly(&volumes, "chamber").unwrap_err();
        assert!(matches!(err, GeometryError::DuplicateName { kind: EntityKind::Assembly, .. }));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn assembly_cannot_take_a_volume_name() {
        let (volumes, _, _) = volumes();
        let mut scene = SceneGraph::new();
        let err = scene.begin_assembly(&volumes, "bodyVolume").unwrap_err();
        assert!(matches!(
            err,
            GeometryError::DuplicateName { kind: EntityKind::Assembly, ref name } if name == "bodyVolume"
        ));
        assert!(scene.is_empty());
    }

    #[test]
    fn placing_unknown_entities_fails_without_changes() {
        let (volumes, world, _) = volumes();
        let mut scene = SceneGraph::new();
        scene.set_world(&volumes, &world).unwrap();
        let group = scene.begin_assembly(&volumes, "group").unwrap();

        // References minted by another builder
        let stray_volume = VolumeRef::new("strayVolume");
        let stray_assembly = AssemblyRef::new("strayAssembly");

        let err = scene
            .place(&volumes, Parent::from(&group), &stray_volume, "v", Transform::IDENTITY)
            .unwrap_err();
        assert!(matches!(
            err,
            GeometryError::UnknownReference { kind: EntityKind::Volume, ref name } if name == "strayVolume"
        ));
        let err = scene
            .place(&volumes, Parent::World, &stray_assembly, "a", Transform::IDENTITY)
            .unwrap_err();
        assert!(matches!(
            err,
            GeometryError::UnknownReference { kind: EntityKind::Assembly, ref name } if name == "strayAssembly"
        ));
        let err = scene
            .place(&volumes, Parent::from(&stray_assembly), &group, "g", Transform::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, GeometryError::UnknownReference { kind: EntityKind::Assembly, .. }));

        assert!(scene.get("group").unwrap().placements.is_empty());
        assert!(scene.world().unwrap().placements.is_empty());
        assert!(!scene.is_sealed(&group));
    }
}
