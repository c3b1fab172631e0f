#![warn(missing_docs)]

//! Detector setup for gdmlkit: a gaseous chamber with its cathode, the
//! detector pipe towards the telescope and the lead shielding, all driven by
//! a [`SetupConfig`].
//!
//! # Example
//!
//! ```rust,no_run
//! use gdmlkit::MaterialCatalog;
//! use gdmlkit_setup::{build_geometry, SetupConfig};
//!
//! let doc = build_geometry(&SetupConfig::default(), MaterialCatalog::nist())?;
//! gdmlkit::write_gdml(&doc, "Setup.gdml")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod chamber;
pub mod config;
pub mod error;
pub mod pipe;
pub mod shielding;

pub use config::{
    default_materials, CathodePatternConfig, ChamberConfig, DetectorPipeConfig, SetupConfig,
    ShieldingConfig, WorldConfig,
};
pub use error::{Result, SetupError};

use gdmlkit::{AssemblyRef, Document, Geometry, MaterialCatalog, Parent, Transform};

type Builder = fn(&mut Geometry, &SetupConfig) -> Result<AssemblyRef>;

/// Build the complete setup as a validated document.
///
/// Chamber, detector pipe and shielding are built on separate fragments in
/// parallel and merged before the world is added.
pub fn build_geometry(config: &SetupConfig, catalog: MaterialCatalog) -> Result<Document> {
    config.validate()?;

    let mut geo = Geometry::new(catalog);
    for (name, catalog_id) in &config.materials {
        geo.resolve_material(name.as_str(), catalog_id)?;
    }

    let (chamber, (pipe, shielding)) = rayon::join(
        || in_fragment(&geo, config, chamber::build),
        || {
            rayon::join(
                || in_fragment(&geo, config, pipe::build),
                || {
                    config
                        .shielding
                        .enabled
                        .then(|| in_fragment(&geo, config, shielding::build))
                        .transpose()
                },
            )
        },
    );

    let chamber = merge(&mut geo, chamber?)?;
    let pipe = merge(&mut geo, pipe?)?;
    let shielding = shielding?.map(|part| merge(&mut geo, part)).transpose()?;

    let size = config.world.size;
    let air = geo.material(&config.world.material)?;
    let world_box = geo.define_box("worldBox", size, size, size)?;
    let world = geo.bind("world", &world_box, &air)?;
    geo.set_world(&world)?;

    geo.place(Parent::World, &chamber, "Chamber", Transform::IDENTITY)?;
    geo.place(
        Parent::World,
        &pipe,
        "DetectorPipe",
        Transform::along_z(config.pipe_z_in_world()),
    )?;
    if let Some(shielding) = &shielding {
        geo.place(Parent::World, shielding, "Shielding", Transform::IDENTITY)?;
    }

    Ok(geo.finish()?)
}

fn in_fragment(base: &Geometry, config: &SetupConfig, build: Builder) -> Result<(Geometry, AssemblyRef)> {
    let mut fragment = base.fragment();
    let assembly = build(&mut fragment, config)?;
    Ok((fragment, assembly))
}

fn merge(geo: &mut Geometry, (fragment, assembly): (Geometry, AssemblyRef)) -> Result<AssemblyRef> {
    geo.merge(fragment)?;
    Ok(assembly)
}
