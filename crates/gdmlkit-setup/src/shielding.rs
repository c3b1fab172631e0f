//! Shielding assembly: lead box with a shaft open at the top.

use gdmlkit::{AssemblyRef, Geometry, Parent, Transform};

use crate::config::SetupConfig;
use crate::error::Result;

/// Build the shielding assembly into `geo`.
pub fn build(geo: &mut Geometry, config: &SetupConfig) -> Result<AssemblyRef> {
    let s = &config.shielding;
    let lead = geo.material("Lead")?;

    let lead_box = geo.define_box("leadBoxSolid", s.size_xy, s.size_xy, s.size_z)?;
    let shaft = geo.define_box("leadBoxShaftSolid", s.shaft_x, s.shaft_y, s.shaft_z)?;
    let shielded = geo.define_subtraction(
        "leadBoxWithShaftSolid",
        &lead_box,
        &shaft,
        Transform::along_z(s.shaft_z_offset()),
    )?;
    let volume = geo.bind("ShieldingVolume", &shielded, &lead)?;

    let assembly = geo.begin_assembly("shieldingAssembly")?;
    geo.place(
        Parent::from(&assembly),
        &volume,
        "shielding20cm",
        Transform::along_z(-config.shielding_offset_z()),
    )?;
    Ok(assembly)
}
