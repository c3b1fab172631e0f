//! Document validation and dependency ordering.
//!
//! Documents built through [`crate::Geometry`] are consistent by
//! construction; documents read back from JSON are not, so the serializer
//! runs [`validate`] before writing anything.

use std::collections::{HashMap, HashSet};

use gdmlkit_ir::{Assembly, Document, Placement, PlacementTarget, Solid};

use crate::error::{EntityKind, GeometryError, Result};

/// Solids ordered so that every boolean follows both of its operands.
///
/// Already ordered input keeps its order.
pub fn solids_in_dependency_order(doc: &Document) -> Result<Vec<&Solid>> {
    topological(
        &doc.solids,
        |s| s.name.as_str(),
        |s| s.shape.operands().map(|(a, b)| vec![a, b]).unwrap_or_default(),
        EntityKind::Solid,
    )
}

/// Assemblies ordered so that every assembly follows those it places.
pub fn assemblies_in_dependency_order(doc: &Document) -> Result<Vec<&Assembly>> {
    topological(
        &doc.assemblies,
        |a| a.name.as_str(),
        |a| {
            a.placements
                .iter()
                .filter_map(|p| match &p.target {
                    PlacementTarget::Assembly(name) => Some(name.as_str()),
                    PlacementTarget::Volume(_) => None,
                })
                .collect()
        },
        EntityKind::Assembly,
    )
}

/// Check names, references and acyclicity of a whole document.
pub fn validate(doc: &Document) -> Result<()> {
    unique(doc.materials.iter().map(|m| m.name.as_str()), EntityKind::Material)?;
    unique(doc.solids.iter().map(|s| s.name.as_str()), EntityKind::Solid)?;
    unique(doc.volumes.iter().map(|v| v.name.as_str()), EntityKind::Volume)?;
    unique(doc.assemblies.iter().map(|a| a.name.as_str()), EntityKind::Assembly)?;
    // Placements reference both kinds through the same GDML `volumeref`
    if let Some(shared) = doc.assemblies.iter().find(|a| doc.volume(&a.name).is_some()) {
        return Err(GeometryError::duplicate(EntityKind::Assembly, &shared.name));
    }

    let world = doc.world.as_ref().ok_or(GeometryError::UnresolvedWorld)?;

    solids_in_dependency_order(doc)?;
    for volume in &doc.volumes {
        if doc.solid(&volume.solid).is_none() {
            return Err(GeometryError::unknown(EntityKind::Solid, &volume.solid));
        }
        if doc.material(&volume.material).is_none() {
            return Err(GeometryError::unknown(EntityKind::Material, &volume.material));
        }
    }
    if doc.volume(&world.volume).is_none() {
        return Err(GeometryError::unknown(EntityKind::Volume, &world.volume));
    }

    let containers = doc
        .assemblies
        .iter()
        .map(|a| (a.name.as_str(), &a.placements))
        .chain(std::iter::once((world.volume.as_str(), &world.placements)));
    for (parent, placements) in containers {
        check_placements(doc, parent, placements, &world.volume)?;
    }

    assemblies_in_dependency_order(doc)?;
    Ok(())
}

fn unique<'a>(names: impl Iterator<Item = &'a str>, kind: EntityKind) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(GeometryError::duplicate(kind, name));
        }
    }
    Ok(())
}

fn check_placements(doc: &Document, parent: &str, placements: &[Placement], world: &str) -> Result<()> {
    unique(placements.iter().map(|p| p.name.as_str()), EntityKind::Placement)?;
    for placement in placements {
        match &placement.target {
            PlacementTarget::Volume(name) => {
                if doc.volume(name).is_none() {
                    return Err(GeometryError::unknown(EntityKind::Volume, name));
                }
                if name == world {
                    return Err(GeometryError::cycle(
                        EntityKind::Volume,
                        vec![world.to_string(), parent.to_string(), world.to_string()],
                    ));
                }
            }
            PlacementTarget::Assembly(name) => {
                if doc.assembly(name).is_none() {
                    return Err(GeometryError::unknown(EntityKind::Assembly, name));
                }
            }
        }
    }
    Ok(())
}

/// Depth-first postorder over `items`, visiting them in slice order.
fn topological<'a, T>(
    items: &'a [T],
    name: impl Fn(&'a T) -> &'a str,
    deps: impl Fn(&'a T) -> Vec<&'a str>,
    kind: EntityKind,
) -> Result<Vec<&'a T>> {
    let index: HashMap<&str, &T> = items.iter().map(|item| (name(item), item)).collect();
    let mut walk = Walk {
        index,
        deps: &deps,
        kind,
        done: HashSet::new(),
        path: Vec::new(),
        out: Vec::with_capacity(items.len()),
    };
    for item in items {
        walk.visit(name(item))?;
    }
    Ok(walk.out)
}

struct Walk<'a, 'd, T> {
    index: HashMap<&'a str, &'a T>,
    deps: &'d dyn Fn(&'a T) -> Vec<&'a str>,
    kind: EntityKind,
    done: HashSet<&'a str>,
    path: Vec<&'a str>,
    out: Vec<&'a T>,
}

impl<'a, T> Walk<'a, '_, T> {
    fn visit(&mut self, name: &'a str) -> Result<()> {
        if self.done.contains(name) {
            return Ok(());
        }
        if let Some(pos) = self.path.iter().position(|n| *n == name) {
            let mut chain: Vec<String> = self.path[pos..].iter().map(|n| n.to_string()).collect();
            chain.push(name.to_string());
            return Err(GeometryError::cycle(self.kind, chain));
        }
        let item = *self
            .index
            .get(name)
            .ok_or_else(|| GeometryError::unknown(self.kind, name))?;

        self.path.push(name);
        for dep in (self.deps)(item) {
            self.visit(dep)?;
        }
        self.path.pop();
        self.done.insert(name);
        self.out.push(item);
        Ok(())
    }
}
