//! Volume binder: solids filled with materials.

use std::collections::HashMap;

use gdmlkit_ir::Volume;

use crate::error::{EntityKind, GeometryError, Result};
use crate::materials::MaterialRegistry;
use crate::refs::{MaterialRef, SolidRef, VolumeRef};
use crate::solids::SolidRegistry;

/// Owns the logical volumes of a geometry, in creation order.
#[derive(Debug, Clone, Default)]
pub struct VolumeRegistry {
    volumes: Vec<Volume>,
    index: HashMap<String, usize>,
}

impl VolumeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `solid` and `material` into a volume named `name`.
    pub fn bind(
        &mut self,
        solids: &SolidRegistry,
        materials: &MaterialRegistry,
        name: impl Into<String>,
        solid: &SolidRef,
        material: &MaterialRef,
    ) -> Result<VolumeRef> {
        let name = name.into();
        if self.contains(&name) {
            return Err(GeometryError::duplicate(EntityKind::Volume, name));
        }
        if !solids.contains(solid.name()) {
            return Err(GeometryError::unknown(EntityKind::Solid, solid.name()));
        }
        if !materials.contains(material.name()) {
            return Err(GeometryError::unknown(EntityKind::Material, material.name()));
        }

        tracing::debug!(volume = %name, solid = %solid, material = %material, "bound volume");
        self.index.insert(name.clone(), self.volumes.len());
        self.volumes.push(Volume {
            name: name.clone(),
            solid: solid.name().to_string(),
            material: material.name().to_string(),
        });
        Ok(VolumeRef::new(name))
    }

    /// Reference to an already bound volume.
    pub fn lookup(&self, name: &str) -> Result<VolumeRef> {
        if self.contains(name) {
            Ok(VolumeRef::new(name))
        } else {
            Err(GeometryError::unknown(EntityKind::Volume, name))
        }
    }

    /// Look up a volume by name.
    pub fn get(&self, name: &str) -> Option<&Volume> {
        self.index.get(name).map(|&i| &self.volumes[i])
    }

    /// True if `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of volumes.
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// True if no volume is bound.
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Iterate volumes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Volume> {
        self.volumes.iter()
    }

    pub(crate) fn into_vec(self) -> Vec<Volume> {
        self.volumes
    }

    pub(crate) fn absorb(&mut self, volumes: Vec<Volume>) {
        for volume in volumes {
            self.index.insert(volume.name.clone(), self.volumes.len());
            self.volumes.push(volume);
        }
    }
}
