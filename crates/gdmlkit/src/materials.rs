//! Material registry: symbolic names bound to catalog identifiers.

use std::collections::{HashMap, HashSet};

use gdmlkit_ir::{DefinitionKind, Material, MaterialDef};

use crate::catalog::MaterialCatalog;
use crate::error::{EntityKind, GeometryError, Result};
use crate::refs::MaterialRef;

/// Symbolic materials of a geometry plus the catalog definitions they need.
#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    materials: Vec<Material>,
    index: HashMap<String, usize>,
    defs: Vec<MaterialDef>,
}

impl MaterialRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind symbolic `name` to `catalog_id`.
    ///
    /// Catalog definitions of the material, and of the isotopes, elements
    /// and materials it is composed of, are recorded once each, components
    /// first.
    pub fn resolve(
        &mut self,
        catalog: &MaterialCatalog,
        name: impl Into<String>,
        catalog_id: &str,
    ) -> Result<MaterialRef> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(GeometryError::duplicate(EntityKind::Material, name));
        }
        let mut pending = Vec::new();
        if let Some(def) = catalog.lookup(catalog_id)? {
            self.collect_defs(catalog, def, &mut Vec::new(), &mut pending)?;
        }

        tracing::debug!(material = %name, catalog_id, "resolved material");
        self.defs.extend(pending);
        self.index.insert(name.clone(), self.materials.len());
        self.materials.push(Material {
            name: name.clone(),
            catalog_id: catalog_id.to_string(),
        });
        Ok(MaterialRef::new(name))
    }

    /// Reference to an already registered material.
    pub fn lookup(&self, name: &str) -> Result<MaterialRef> {
        if self.contains(name) {
            Ok(MaterialRef::new(name))
        } else {
            Err(GeometryError::unknown(EntityKind::Material, name))
        }
    }

    /// Look up a material by symbolic name.
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.index.get(name).map(|&i| &self.materials[i])
    }

    /// True if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of symbolic materials.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// True if no material is registered.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Iterate materials in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    /// Catalog definitions, components before the entries using them.
    pub fn definitions(&self) -> &[MaterialDef] {
        &self.defs
    }

    pub(crate) fn into_parts(self) -> (Vec<Material>, Vec<MaterialDef>) {
        (self.materials, self.defs)
    }

    /// Append materials and definitions checked by the caller, skipping
    /// entries that are already present.
    pub(crate) fn absorb(&mut self, other: MaterialRegistry) {
        for material in other.materials {
            if !self.contains(&material.name) {
                self.index.insert(material.name.clone(), self.materials.len());
                self.materials.push(material);
            }
        }
        for def in other.defs {
            if !self.is_recorded(&def) {
                self.defs.push(def);
            }
        }
    }

    fn is_recorded(&self, def: &MaterialDef) -> bool {
        self.defs.iter().any(|d| d.kind == def.kind && d.name == def.name)
    }

    fn collect_defs<'c>(
        &self,
        catalog: &'c MaterialCatalog,
        def: &'c MaterialDef,
        visiting: &mut Vec<(DefinitionKind, &'c str)>,
        pending: &mut Vec<MaterialDef>,
    ) -> Result<()> {
        let key = (def.kind, def.name.as_str());
        if self.is_recorded(def) || pending.iter().any(|d| (d.kind, d.name.as_str()) == key) {
            return Ok(());
        }
        if visiting.contains(&key) {
            let mut chain: Vec<String> = visiting.iter().map(|(_, n)| n.to_string()).collect();
            chain.push(def.name.clone());
            return Err(GeometryError::cycle(EntityKind::Material, chain));
        }

        visiting.push(key);
        let mut seen = HashSet::new();
        for component in &def.components {
            if !seen.insert(component.reference.as_str()) {
                continue;
            }
            if let Some(dep) = catalog.component_def(def, component) {
                self.collect_defs(catalog, dep, visiting, pending)?;
            }
        }
        visiting.pop();
        pending.push(def.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXTURE: &str = r#"<materials>
  <element name="Carbon" formula="C" Z="6"><atom value="12.011"/></element>
  <element name="Hydrogen" formula="H" Z="1"><atom value="1.008"/></element>
  <material name="Isobutane" state="gas">
    <D value="0.00251"/><composite n="4" ref="Carbon"/><composite n="10" ref="Hydrogen"/>
  </material>
  <material name="ArIso2Pct" state="gas">
    <D value="0.0016"/><fraction n="0.98" ref="G4_Ar"/><fraction n="0.02" ref="Isobutane"/>
  </material>
  <material name="LoopA"><D value="1"/><fraction n="1" ref="LoopB"/></material>
  <material name="LoopB"><D value="1"/><fraction n="1" ref="LoopA"/></material>
</materials>"#;

    fn catalog() -> MaterialCatalog {
        let mut catalog = MaterialCatalog::nist();
        catalog.extend(MaterialCatalog::from_gdml_str(MIXTURE).unwrap());
        catalog
    }

    #[test]
    fn resolves_nist_material_without_definition() {
        let mut materials = MaterialRegistry::new();
        let copper = materials.resolve(&catalog(), "Copper", "G4_Cu").unwrap();
        assert_eq!(copper.name(), "Copper");
        assert_eq!(materials.get("Copper").unwrap().catalog_id, "G4_Cu");
        assert!(materials.definitions().is_empty());
    }

    #[test]
    fn unknown_catalog_id_fails() {
        let mut materials = MaterialRegistry::new();
        let err = materials.resolve(&catalog(), "Gas", "G4_Unknown").unwrap_err();
        assert!(matches!(err, GeometryError::UnknownMaterial(ref id) if id == "G4_Unknown"));
        assert!(materials.is_empty());
    }

    #[test]
    fn duplicate_symbolic_name_fails() {
        let mut materials = MaterialRegistry::new();
        let catalog = catalog();
        materials.resolve(&catalog, "Gas", "G4_Ar").unwrap();
        let err = materials.resolve(&catalog, "Gas", "G4_Xe").unwrap_err();
        assert!(matches!(err, GeometryError::DuplicateName { .. }));
        assert_eq!(materials.get("Gas").unwrap().catalog_id, "G4_Ar");
    }

    #[test]
    fn definitions_are_recorded_components_first() {
        let mut materials = MaterialRegistry::new();
        let catalog = catalog();
        materials.resolve(&catalog, "Gas", "ArIso2Pct").unwrap();
        materials.resolve(&catalog, "Quencher", "Isobutane").unwrap();

        let names: Vec<&str> = materials.definitions().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["Carbon", "Hydrogen", "Isobutane", "ArIso2Pct"]);
        assert_eq!(materials.definitions()[0].kind, DefinitionKind::Element);
    }

    #[test]
    fn cyclic_catalog_is_rejected() {
        let mut materials = MaterialRegistry::new();
        let err = materials.resolve(&catalog(), "Loop", "LoopA").unwrap_err();
        assert!(matches!(err, GeometryError::CyclicDependency { .. }));
        assert!(materials.is_empty());
        assert!(materials.definitions().is_empty());
    }
}
