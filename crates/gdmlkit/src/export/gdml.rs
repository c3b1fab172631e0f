//! GDML writer.
//!
//! Output layout: `<define/>`, `<materials>` (file-catalog definitions,
//! components first), `<solids>` in dependency order, `<structure>` with
//! plain volumes, then assemblies in dependency order, then the world volume
//! and its placements, and finally `<setup>`. Lengths are millimetres.
//! Identity positions and rotations are omitted.

use std::path::Path;

use gdmlkit_ir::{Document, MaterialDef, Placement, Shape, Transform};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::error::{GeometryError, Result};
use crate::order::{assemblies_in_dependency_order, solids_in_dependency_order, validate};

const SCHEMA: &str =
    "http://service-spi.web.cern.ch/service-spi/app/releases/GDML/schema/gdml.xsd";

/// Serialize a document to GDML text.
///
/// The document is validated first; on error nothing is produced. Equal
/// documents give byte-identical output.
pub fn to_gdml_string(doc: &Document) -> Result<String> {
    validate(doc)?;
    let mut out = GdmlWriter::new();

    out.decl()?;
    out.start(
        "gdml",
        &[
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance".to_string()),
            ("xsi:noNamespaceSchemaLocation", SCHEMA.to_string()),
        ],
    )?;
    out.empty("define", &[])?;
    write_materials(&mut out, &doc.material_defs)?;
    write_solids(&mut out, doc)?;
    write_structure(&mut out, doc)?;
    write_setup(&mut out, doc)?;
    out.end("gdml")?;

    out.finish()
}

/// Serialize `doc` and write it to `path`.
pub fn write_gdml(doc: &Document, path: impl AsRef<Path>) -> Result<()> {
    let text = to_gdml_string(doc)?;
    std::fs::write(path.as_ref(), &text)?;
    tracing::info!(
        path = %path.as_ref().display(),
        bytes = text.len(),
        "wrote GDML"
    );
    Ok(())
}

fn write_materials(out: &mut GdmlWriter, defs: &[MaterialDef]) -> Result<()> {
    if defs.is_empty() {
        return out.empty("materials", &[]);
    }
    out.start("materials", &[])?;
    for def in defs {
        let tag = def.kind.tag();
        let mut attrs = vec![("name", def.name.clone())];
        if let Some(state) = &def.state {
            attrs.push(("state", state.clone()));
        }
        if let Some(formula) = &def.formula {
            attrs.push(("formula", formula.clone()));
        }
        if let Some(z) = def.z {
            attrs.push(("Z", num(z)));
        }
        if let Some(n) = def.nucleons {
            attrs.push(("N", n.to_string()));
        }
        if def.density.is_none() && def.atom.is_none() && def.components.is_empty() {
            out.empty(tag, &attrs)?;
            continue;
        }

        out.start(tag, &attrs)?;
        if let Some(density) = &def.density {
            out.empty(
                "D",
                &[("value", num(density.value)), ("unit", density.unit.clone())],
            )?;
        }
        if let Some(atom) = &def.atom {
            let mut attrs = Vec::new();
            if let Some(unit) = &atom.unit {
                attrs.push(("unit", unit.clone()));
            }
            attrs.push(("value", num(atom.value)));
            out.empty("atom", &attrs)?;
        }
        for component in &def.components {
            out.empty(
                component.kind.as_str(),
                &[("n", num(component.n)), ("ref", component.reference.clone())],
            )?;
        }
        out.end(tag)?;
    }
    out.end("materials")
}

fn write_solids(out: &mut GdmlWriter, doc: &Document) -> Result<()> {
    out.start("solids", &[])?;
    for solid in solids_in_dependency_order(doc)? {
        let name = ("name", solid.name.clone());
        match &solid.shape {
            Shape::Box { x, y, z } => out.empty(
                "box",
                &[name, ("x", num(*x)), ("y", num(*y)), ("z", num(*z)), ("lunit", "mm".into())],
            )?,
            Shape::Tube {
                rmin,
                rmax,
                z,
                startphi,
                deltaphi,
                aunit,
            } => out.empty(
                "tube",
                &[
                    name,
                    ("rmin", num(*rmin)),
                    ("rmax", num(*rmax)),
                    ("z", num(*z)),
                    ("startphi", num(*startphi)),
                    ("deltaphi", num(*deltaphi)),
                    ("aunit", aunit.as_str().into()),
                    ("lunit", "mm".into()),
                ],
            )?,
            Shape::Cone {
                z,
                rmin1,
                rmax1,
                rmin2,
                rmax2,
                startphi,
                deltaphi,
                aunit,
            } => out.empty(
                "cone",
                &[
                    name,
                    ("rmin1", num(*rmin1)),
                    ("rmax1", num(*rmax1)),
                    ("rmin2", num(*rmin2)),
                    ("rmax2", num(*rmax2)),
                    ("z", num(*z)),
                    ("startphi", num(*startphi)),
                    ("deltaphi", num(*deltaphi)),
                    ("aunit", aunit.as_str().into()),
                    ("lunit", "mm".into()),
                ],
            )?,
            Shape::Union {
                first,
                second,
                transform,
            }
            | Shape::Subtraction {
                first,
                second,
                transform,
            } => {
                let tag = solid.shape.tag();
                out.start(tag, &[name])?;
                out.empty("first", &[("ref", first.clone())])?;
                out.empty("second", &[("ref", second.clone())])?;
                write_transform(out, transform)?;
                out.end(tag)?;
            }
        }
    }
    out.end("solids")
}

fn write_structure(out: &mut GdmlWriter, doc: &Document) -> Result<()> {
    let world = doc.world.as_ref().ok_or(GeometryError::UnresolvedWorld)?;
    out.start("structure", &[])?;

    for volume in doc.volumes.iter().filter(|v| v.name != world.volume) {
        write_volume(out, doc, &volume.name, &volume.solid, &volume.material, &[])?;
    }
    for assembly in assemblies_in_dependency_order(doc)? {
        out.start("assembly", &[("name", assembly.name.clone())])?;
        for placement in &assembly.placements {
            write_physvol(out, placement)?;
        }
        out.end("assembly")?;
    }
    if let Some(volume) = doc.volume(&world.volume) {
        write_volume(out, doc, &volume.name, &volume.solid, &volume.material, &world.placements)?;
    }

    out.end("structure")
}

fn write_volume(
    out: &mut GdmlWriter,
    doc: &Document,
    name: &str,
    solid: &str,
    material: &str,
    placements: &[Placement],
) -> Result<()> {
    // GDML has no material aliases: reference the catalog id directly.
    let material_ref = doc
        .material(material)
        .map(|m| m.catalog_id.clone())
        .unwrap_or_else(|| material.to_string());

    out.start("volume", &[("name", name.to_string())])?;
    out.empty("materialref", &[("ref", material_ref)])?;
    out.empty("solidref", &[("ref", solid.to_string())])?;
    for placement in placements {
        write_physvol(out, placement)?;
    }
    out.end("volume")
}

fn write_physvol(out: &mut GdmlWriter, placement: &Placement) -> Result<()> {
    out.start("physvol", &[("name", placement.name.clone())])?;
    out.empty("volumeref", &[("ref", placement.target.name().to_string())])?;
    write_transform(out, &placement.transform)?;
    out.end("physvol")
}

fn write_transform(out: &mut GdmlWriter, transform: &Transform) -> Result<()> {
    let p = transform.position;
    if !p.is_zero() {
        out.empty(
            "position",
            &[("x", num(p.x)), ("y", num(p.y)), ("z", num(p.z)), ("unit", "mm".into())],
        )?;
    }
    let r = transform.rotation;
    if !r.is_identity() {
        out.empty(
            "rotation",
            &[
                ("x", num(r.x)),
                ("y", num(r.y)),
                ("z", num(r.z)),
                ("unit", r.unit.as_str().into()),
            ],
        )?;
    }
    Ok(())
}

fn write_setup(out: &mut GdmlWriter, doc: &Document) -> Result<()> {
    let world = doc.world.as_ref().ok_or(GeometryError::UnresolvedWorld)?;
    out.start("setup", &[("name", "Default".into()), ("version", "1.0".into())])?;
    out.empty("world", &[("ref", world.volume.clone())])?;
    out.end("setup")
}

/// Shortest decimal form that round-trips; integral values have no `.0`.
fn num(value: f64) -> String {
    // -0 would otherwise print as "-0"
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

struct GdmlWriter {
    writer: Writer<Vec<u8>>,
}

impl GdmlWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn decl(&mut self) -> Result<()> {
        self.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    fn start(&mut self, tag: &str, attrs: &[(&str, String)]) -> Result<()> {
        self.write(Event::Start(element(tag, attrs)))
    }

    fn empty(&mut self, tag: &str, attrs: &[(&str, String)]) -> Result<()> {
        self.write(Event::Empty(element(tag, attrs)))
    }

    fn end(&mut self, tag: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(tag)))
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(GeometryError::xml)
    }

    fn finish(self) -> Result<String> {
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(GeometryError::xml)
    }
}

fn element<'a>(tag: &'a str, attrs: &[(&str, String)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(tag);
    for (key, value) in attrs {
        start.push_attribute((*key, value.as_str()));
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdmlkit_ir::{
        Assembly, AtomicMass, Component, ComponentKind, DefinitionKind, Density, Material,
        PlacementTarget, Rotation, Solid, Volume, World,
    };

    fn box_with_bore() -> Document {
        let mut doc = Document::new();
        doc.materials = vec![
            Material {
                name: "Air".into(),
                catalog_id: "G4_AIR".into(),
            },
            Material {
                name: "Copper".into(),
                catalog_id: "G4_Cu".into(),
            },
        ];
        doc.solids = vec![
            Solid {
                name: "worldBox".into(),
                shape: Shape::cuboid(4000.0, 4000.0, 4000.0),
            },
            Solid {
                name: "block".into(),
                shape: Shape::cuboid(100.0, 100.0, 30.0),
            },
            Solid {
                name: "bore".into(),
                shape: Shape::tube(51.0, 30.0),
            },
            Solid {
                name: "body".into(),
                shape: Shape::Subtraction {
                    first: "block".into(),
                    second: "bore".into(),
                    transform: Transform::along_z(0.5).with_rotation(Rotation::about_z(45.0)),
                },
            },
        ];
        doc.volumes = vec![
            Volume {
                name: "world".into(),
                solid: "worldBox".into(),
                material: "Air".into(),
            },
            Volume {
                name: "bodyVolume".into(),
                solid: "body".into(),
                material: "Copper".into(),
            },
        ];
        doc.world = Some(World {
            volume: "world".into(),
            placements: vec![Placement {
                name: "body".into(),
                target: PlacementTarget::Volume("bodyVolume".into()),
                transform: Transform::IDENTITY,
            }],
        });
        doc
    }

    #[test]
    fn writes_all_sections() {
        let gdml = to_gdml_string(&box_with_bore()).unwrap();

        assert!(gdml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(gdml.contains("<define/>"));
        assert!(gdml.contains(r#"<box name="block" x="100" y="100" z="30" lunit="mm"/>"#));
        assert!(gdml.contains(r#"<first ref="block"/>"#));
        assert!(gdml.contains(r#"<second ref="bore"/>"#));
        assert!(gdml.contains(r#"<position x="0" y="0" z="0.5" unit="mm"/>"#));
        assert!(gdml.contains(r#"<rotation x="0" y="0" z="45" unit="deg"/>"#));
        assert!(gdml.contains(r#"<materialref ref="G4_Cu"/>"#));
        assert!(gdml.contains(r#"<volumeref ref="bodyVolume"/>"#));
        assert!(gdml.contains(r#"<world ref="world"/>"#));
        assert!(gdml.trim_end().ends_with("</gdml>"));
    }

    #[test]
    fn first_operand_precedes_second() {
        let gdml = to_gdml_string(&box_with_bore()).unwrap();
        let first = gdml.find(r#"<first ref="block"/>"#).unwrap();
        let second = gdml.find(r#"<second ref="bore"/>"#).unwrap();
        assert!(first < second);
    }

    #[test]
    fn world_volume_comes_last() {
        let gdml = to_gdml_string(&box_with_bore()).unwrap();
        let body = gdml.find(r#"<volume name="bodyVolume">"#).unwrap();
        let world = gdml.find(r#"<volume name="world">"#).unwrap();
        assert!(body < world);
        assert!(!gdml[body..world].contains("physvol"));
    }

    #[test]
    fn identity_placement_has_no_transform() {
        let gdml = to_gdml_string(&box_with_bore()).unwrap();
        let physvol = gdml.find(r#"<physvol name="body">"#).unwrap();
        let end = physvol + gdml[physvol..].find("</physvol>").unwrap();
        assert!(!gdml[physvol..end].contains("<position"));
        assert!(!gdml[physvol..end].contains("<rotation"));
    }

    #[test]
    fn output_is_deterministic() {
        let doc = box_with_bore();
        assert_eq!(to_gdml_string(&doc).unwrap(), to_gdml_string(&doc.clone()).unwrap());
    }

    #[test]
    fn invalid_document_writes_nothing() {
        let mut doc = box_with_bore();
        doc.world = None;
        assert!(matches!(to_gdml_string(&doc), Err(GeometryError::UnresolvedWorld)));
    }

    #[test]
    fn embeds_isotopes_and_elements_before_their_users() {
        let mut doc = box_with_bore();
        let mut c12 = MaterialDef::new(DefinitionKind::Isotope, "C12");
        c12.z = Some(6.0);
        c12.nucleons = Some(12);
        c12.atom = Some(AtomicMass {
            value: 12.0,
            unit: Some("g/mole".into()),
        });
        let mut carbon = MaterialDef::new(DefinitionKind::Element, "Carbon");
        carbon.formula = Some("C".into());
        carbon.components.push(Component {
            kind: ComponentKind::Fraction,
            reference: "C12".into(),
            n: 1.0,
        });
        let mut graphite = MaterialDef::new(DefinitionKind::Material, "Graphite");
        graphite.density = Some(Density {
            value: 2.2,
            unit: "g/cm3".into(),
        });
        graphite.components.push(Component {
            kind: ComponentKind::Composite,
            reference: "Carbon".into(),
            n: 1.0,
        });
        doc.material_defs = vec![c12, carbon, graphite];

        let gdml = to_gdml_string(&doc).unwrap();
        let isotope = gdml.find(r#"<isotope name="C12" Z="6" N="12">"#).unwrap();
        let element = gdml.find(r#"<element name="Carbon" formula="C">"#).unwrap();
        let material = gdml.find(r#"<material name="Graphite">"#).unwrap();
        assert!(isotope < element && element < material);
        assert!(gdml.contains(r#"<atom unit="g/mole" value="12"/>"#));
        assert!(gdml.contains(r#"<fraction n="1" ref="C12"/>"#));
        assert!(gdml.contains(r#"<composite n="1" ref="Carbon"/>"#));
    }

    #[test]
    fn volume_and_assembly_sharing_a_name_is_rejected() {
        let mut doc = box_with_bore();
        doc.assemblies.push(Assembly {
            name: "bodyVolume".into(),
            placements: Vec::new(),
        });
        if let Some(world) = doc.world.as_mut() {
            world.placements.push(Placement {
                name: "group".into(),
                target: PlacementTarget::Assembly("bodyVolume".into()),
                transform: Transform::IDENTITY,
            });
        }
        assert!(matches!(
            to_gdml_string(&doc),
            Err(GeometryError::DuplicateName { .. })
        ));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(num(4000.0), "4000");
        assert_eq!(num(0.004), "0.004");
        assert_eq!(num(-0.0), "0");
        assert_eq!(num(-22.75), "-22.75");
    }
}
