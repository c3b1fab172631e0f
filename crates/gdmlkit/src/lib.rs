#![warn(missing_docs)]

//! gdmlkit: parametric CSG assemblies for detector geometry, written as GDML.
//!
//! Solids are combined by name into boolean trees, filled with materials,
//! placed into assemblies and finally into a world volume. The finished
//! [`Document`] is serialized to GDML for Geant4 or ROOT.
//!
//! # Example
//!
//! ```rust,no_run
//! use gdmlkit::{Geometry, Parent, RadialPattern, Transform};
//!
//! let mut geo = Geometry::default();
//! let copper = geo.resolve_material("Copper", "G4_Cu")?;
//! let air = geo.resolve_material("Air", "G4_AIR")?;
//!
//! let disk = geo.define_hollow_tube("disk", 8.5, 45.0, 1.0)?;
//! let line = geo.define_box("line", 0.3, 17.0, 1.0)?;
//! let hub = geo.define_hollow_tube("hub", 3.95, 4.25, 1.0)?;
//! let cathode = geo.define_radial("cathode", &disk, &line, &RadialPattern::stepped(4, 45.0), Some(&hub))?;
//! let cathode = geo.bind("cathodeVolume", &cathode, &copper)?;
//!
//! let world_box = geo.define_box("worldBox", 4000.0, 4000.0, 4000.0)?;
//! let world = geo.bind("world", &world_box, &air)?;
//! geo.set_world(&world)?;
//! geo.place(Parent::World, &cathode, "cathode", Transform::IDENTITY)?;
//!
//! gdmlkit::write_gdml(&geo.finish()?, "cathode.gdml")?;
//! # Ok::<(), gdmlkit::GeometryError>(())
//! ```

pub mod axis;
pub mod catalog;
pub mod chain;
pub mod error;
pub mod export;
pub mod geometry;
pub mod materials;
pub mod order;
pub mod pattern;
pub mod refs;
pub mod solids;
pub mod structure;
pub mod volumes;

pub use axis::Axis;
pub use catalog::{MaterialCatalog, NIST_MATERIALS};
pub use chain::{chain_offsets, Chain};
pub use error::{EntityKind, GeometryError, Result};
pub use export::{read_json, to_gdml_string, write_gdml, write_json};
pub use geometry::Geometry;
pub use materials::MaterialRegistry;
pub use order::{assemblies_in_dependency_order, solids_in_dependency_order, validate};
pub use pattern::{Angles, RadialPattern};
pub use refs::{AssemblyRef, MaterialRef, SolidRef, VolumeRef};
pub use solids::SolidRegistry;
pub use structure::{Parent, SceneGraph, Target};
pub use volumes::VolumeRegistry;

pub use gdmlkit_ir::{
    AngleUnit, Assembly, DefinitionKind, Document, MaterialDef, Placement, PlacementTarget,
    Rotation, Shape, Solid, Transform, Vec3, Volume, World,
};
