//! Material catalogs: the NIST names Geant4 knows natively, and isotope,
//! element and material definitions read from a GDML `<materials>` file.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;

use gdmlkit_ir::{AtomicMass, Component, ComponentKind, DefinitionKind, Density, MaterialDef};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{GeometryError, Result};

/// NIST material names resolved by Geant4 itself. They need no definition
/// in the output, only a reference.
pub const NIST_MATERIALS: &[&str] = &[
    "G4_AIR",
    "G4_Galactic",
    "G4_Ar",
    "G4_Xe",
    "G4_Ne",
    "G4_He",
    "G4_Cu",
    "G4_Pb",
    "G4_Fe",
    "G4_Al",
    "G4_Si",
    "G4_Ge",
    "G4_W",
    "G4_WATER",
    "G4_TEFLON",
    "G4_KAPTON",
    "G4_MYLAR",
    "G4_POLYETHYLENE",
    "G4_PLEXIGLASS",
    "G4_STAINLESS-STEEL",
    "G4_CONCRETE",
];

/// Catalog identifiers available to a geometry, with optional definitions.
///
/// Isotopes and elements read from a file live beside the materials; they
/// are never resolved directly but are embedded when a material uses them.
#[derive(Debug, Clone, Default)]
pub struct MaterialCatalog {
    entries: BTreeMap<String, Option<MaterialDef>>,
    elements: BTreeMap<String, MaterialDef>,
    isotopes: BTreeMap<String, MaterialDef>,
}

impl MaterialCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the built-in NIST names.
    pub fn nist() -> Self {
        let entries = NIST_MATERIALS
            .iter()
            .map(|name| (name.to_string(), None))
            .collect();
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Read the `<isotope>`, `<element>` and `<material>` definitions of a
    /// GDML materials document.
    pub fn from_gdml_str(xml: &str) -> Result<Self> {
        let mut catalog = Self::new();
        let mut reader = Reader::from_str(xml);
        let mut current: Option<MaterialDef> = None;

        loop {
            let event = reader.read_event().map_err(GeometryError::xml)?;
            match &event {
                Event::Start(e) | Event::Empty(e) => {
                    let closed = matches!(event, Event::Empty(_));
                    if let Some(kind) = definition_kind(e.name().as_ref()) {
                        if let Some(open) = &current {
                            return Err(GeometryError::Catalog(format!(
                                "<{}> nested in {} {}",
                                kind.tag(),
                                open.kind.tag(),
                                open.name
                            )));
                        }
                        let def = header(e, kind)?;
                        if closed {
                            catalog.insert(def);
                        } else {
                            current = Some(def);
                        }
                        continue;
                    }
                    let Some(def) = current.as_mut() else {
                        continue;
                    };
                    match e.name().as_ref() {
                        b"D" => def.density = Some(density(e, &def.name)?),
                        b"atom" => def.atom = Some(atomic_mass(e, &def.name)?),
                        b"fraction" | b"composite" => {
                            let component = component(e, &def.name)?;
                            def.components.push(component);
                        }
                        _ => {}
                    }
                }
                Event::End(e) if definition_kind(e.name().as_ref()).is_some() => {
                    if let Some(def) = current.take() {
                        catalog.insert(def);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(def) = current {
            return Err(GeometryError::Catalog(format!(
                "unterminated <{}> element {}",
                def.kind.tag(),
                def.name
            )));
        }
        tracing::debug!(
            materials = catalog.len(),
            elements = catalog.elements.len(),
            isotopes = catalog.isotopes.len(),
            "read material catalog"
        );
        Ok(catalog)
    }

    /// Read a GDML materials file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let xml = std::fs::read_to_string(path)?;
        Self::from_gdml_str(&xml)
    }

    /// Add every entry of `other`, replacing entries with the same id.
    pub fn extend(&mut self, other: MaterialCatalog) {
        self.entries.extend(other.entries);
        self.elements.extend(other.elements);
        self.isotopes.extend(other.isotopes);
    }

    /// Number of material ids.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the catalog has no material ids.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if `id` is a material id.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Definition for material `id`. `Ok(None)` for natively known
    /// materials, `UnknownMaterial` for ids not in the catalog.
    pub fn lookup(&self, id: &str) -> Result<Option<&MaterialDef>> {
        self.entries
            .get(id)
            .map(Option::as_ref)
            .ok_or_else(|| GeometryError::UnknownMaterial(id.to_string()))
    }

    /// Element defined by the catalog file.
    pub fn element(&self, name: &str) -> Option<&MaterialDef> {
        self.elements.get(name)
    }

    /// Isotope defined by the catalog file.
    pub fn isotope(&self, name: &str) -> Option<&MaterialDef> {
        self.isotopes.get(name)
    }

    /// Definition a component of `owner` refers to, if the catalog holds
    /// one. Elements are made of isotopes; `composite` names an element and
    /// `fraction` an element or, failing that, a material.
    pub fn component_def(&self, owner: &MaterialDef, component: &Component) -> Option<&MaterialDef> {
        let reference = component.reference.as_str();
        match (owner.kind, component.kind) {
            (DefinitionKind::Element, _) => self.isotope(reference),
            (_, ComponentKind::Composite) => self.element(reference),
            (_, ComponentKind::Fraction) => self
                .element(reference)
                .or_else(|| self.entries.get(reference).and_then(Option::as_ref)),
        }
    }

    fn insert(&mut self, def: MaterialDef) {
        match def.kind {
            DefinitionKind::Isotope => {
                self.isotopes.insert(def.name.clone(), def);
            }
            DefinitionKind::Element => {
                self.elements.insert(def.name.clone(), def);
            }
            DefinitionKind::Material => {
                self.entries.insert(def.name.clone(), Some(def));
            }
        }
    }
}

fn definition_kind(tag: &[u8]) -> Option<DefinitionKind> {
    match tag {
        b"isotope" => Some(DefinitionKind::Isotope),
        b"element" => Some(DefinitionKind::Element),
        b"material" => Some(DefinitionKind::Material),
        _ => None,
    }
}

fn attributes(e: &BytesStart) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(GeometryError::xml)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(GeometryError::xml)?.into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn parse<T: FromStr>(raw: &str, key: &str, owner: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        GeometryError::Catalog(format!("{owner}: invalid {key} value {raw:?}"))
    })
}

fn number(attrs: &HashMap<String, String>, key: &str, owner: &str) -> Result<f64> {
    let raw = attrs
        .get(key)
        .ok_or_else(|| GeometryError::Catalog(format!("{owner}: missing attribute {key}")))?;
    parse(raw, key, owner)
}

fn header(e: &BytesStart, kind: DefinitionKind) -> Result<MaterialDef> {
    let mut attrs = attributes(e)?;
    let name = attrs
        .remove("name")
        .ok_or_else(|| GeometryError::Catalog(format!("<{}> without a name", kind.tag())))?;

    let mut def = MaterialDef::new(kind, name);
    def.formula = attrs.remove("formula");
    def.state = attrs.remove("state");
    if let Some(z) = attrs.remove("Z") {
        def.z = Some(parse(&z, "Z", &def.name)?);
    }
    if let Some(n) = attrs.remove("N") {
        def.nucleons = Some(parse(&n, "N", &def.name)?);
    }
    Ok(def)
}

fn density(e: &BytesStart, owner: &str) -> Result<Density> {
    let attrs = attributes(e)?;
    Ok(Density {
        value: number(&attrs, "value", owner)?,
        unit: attrs
            .get("unit")
            .cloned()
            .unwrap_or_else(|| "g/cm3".to_string()),
    })
}

fn atomic_mass(e: &BytesStart, owner: &str) -> Result<AtomicMass> {
    let attrs = attributes(e)?;
    Ok(AtomicMass {
        value: number(&attrs, "value", owner)?,
        unit: attrs.get("unit").cloned(),
    })
}

fn component(e: &BytesStart, owner: &str) -> Result<Component> {
    let kind = if e.name().as_ref() == b"fraction" {
        ComponentKind::Fraction
    } else {
        ComponentKind::Composite
    };
    let attrs = attributes(e)?;
    let reference = attrs.get("ref").cloned().ok_or_else(|| {
        GeometryError::Catalog(format!("{owner}: {} without ref", kind.as_str()))
    })?;
    Ok(Component {
        kind,
        reference,
        n: number(&attrs, "n", owner)?,
    })
}
