//! Chamber assembly: copper body and backplate, readout, gas, cathode.

use gdmlkit::{AssemblyRef, Geometry, Parent, RadialPattern, Rotation, SolidRef, Transform};

use crate::config::SetupConfig;
use crate::error::Result;

/// Build the chamber assembly into `geo`.
///
/// The assembly frame is centred on the gas volume; the readout side faces
/// −z and the cathode +z.
pub fn build(geo: &mut Geometry, config: &SetupConfig) -> Result<AssemblyRef> {
    let c = &config.chamber;
    let copper = geo.material("Copper")?;
    let teflon = geo.material("Teflon")?;
    let kapton = geo.material("Kapton")?;
    let mylar = geo.material("Mylar")?;
    let vacuum = geo.material("Vacuum")?;
    let gas = geo.material("Gas")?;

    // Body and backplate
    let body_base = geo.define_box("chamberBodyBaseSolid", c.square_side, c.square_side, c.height)?;
    let body_hole = geo.define_tube("chamberBodyHoleSolid", c.radius(), c.height)?;
    let body = geo.define_subtraction("chamberBodySolid", &body_base, &body_hole, Transform::IDENTITY)?;
    let body = geo.bind("chamberBodyVolume", &body, &copper)?;

    let backplate = geo.define_box(
        "chamberBackplateSolid",
        c.square_side,
        c.square_side,
        c.backplate_thickness,
    )?;
    let backplate = geo.bind("chamberBackplateVolume", &backplate, &copper)?;

    let wall = geo.define_hollow_tube("chamberTeflonWallSolid", c.gas_radius(), c.radius(), c.height)?;
    let wall = geo.bind("chamberTeflonWallVolume", &wall, &teflon)?;

    // Readout
    let kapton_board = geo.define_box(
        "kaptonReadoutSolid",
        c.square_side,
        c.square_side,
        c.readout_kapton_thickness,
    )?;
    let kapton_board = geo.bind("kaptonReadoutVolume", &kapton_board, &kapton)?;

    let readout_plane = geo.define_box(
        "copperReadoutSolid",
        c.readout_plane_side,
        c.readout_plane_side,
        c.readout_copper_thickness,
    )?;
    let plane_material = geo.material(&c.readout_plane_material)?;
    let readout_plane_volume = geo.bind("copperReadoutVolume", &readout_plane, &plane_material)?;

    // Cathode
    let teflon_disk_base = geo.define_hollow_tube(
        "cathodeTeflonDiskBaseSolid",
        c.cathode_teflon_disk_hole_radius,
        c.square_side / 2.0,
        c.cathode_teflon_disk_thickness,
    )?;
    let support = geo.define_hollow_tube(
        "cathodeCopperDiskSolid",
        c.cathode_copper_support_inner_radius,
        c.cathode_copper_support_outer_radius,
        c.cathode_copper_support_thickness,
    )?;
    let recess = Transform::along_z(c.cathode_recess_z());
    let teflon_disk = geo.define_subtraction("cathodeTeflonDiskSolid", &teflon_disk_base, &support, recess)?;
    let teflon_disk = geo.bind("cathodeTeflonDiskVolume", &teflon_disk, &teflon)?;

    let window = geo.define_tube(
        "cathodeWindowSolid",
        c.cathode_teflon_disk_hole_radius,
        c.cathode_window_thickness,
    )?;
    let window_volume = geo.bind("cathodeWindowVolume", &window, &mylar)?;

    let copper_disk = cathode_copper_disk(geo, config, &support)?;
    let copper_disk_volume = geo.bind("cathodeCopperDiskFinal", &copper_disk, &copper)?;

    let filling_base = geo.define_tube(
        "cathodeFillingBaseSolid",
        c.cathode_teflon_disk_hole_radius,
        c.cathode_teflon_disk_thickness,
    )?;
    let filling = geo.define_subtraction("cathodeFillingSolid", &filling_base, &copper_disk, recess)?;
    let filling = geo.bind("cathodeFillingVolume", &filling, &vacuum)?;

    // Gas: drift cylinder minus the readout plane and the window
    let plane_at = Transform::along_z(c.readout_plane_z()).with_rotation(Rotation::about_z(45.0));
    let window_at = Transform::along_z(c.window_z());
    let gas_full = geo.define_tube("gasSolidOriginal", c.gas_radius(), c.height)?;
    let gas_aux = geo.define_subtraction("gasSolidAux", &gas_full, &readout_plane, plane_at)?;
    let gas_solid = geo.define_subtraction("gasSolid", &gas_aux, &window, window_at)?;
    let gas_volume = geo.bind("gasVolume", &gas_solid, &gas)?;

    let chamber = geo.begin_assembly("chamberAssembly")?;
    let parent = Parent::from(&chamber);
    geo.place(parent, &gas_volume, "gas", Transform::IDENTITY)?;
    geo.place(parent, &backplate, "chamberBackplate", Transform::along_z(c.backplate_z()))?;
    geo.place(parent, &body, "chamberBody", Transform::IDENTITY)?;
    geo.place(parent, &wall, "chamberTeflonWall", Transform::IDENTITY)?;
    geo.place(parent, &kapton_board, "kaptonReadout", Transform::along_z(c.kapton_z()))?;
    geo.place(parent, &readout_plane_volume, "copperReadout", plane_at)?;
    geo.place(parent, &window_volume, "cathodeWindow", window_at)?;
    geo.place(parent, &teflon_disk, "cathodeTeflonDisk", Transform::along_z(c.cathode_disk_z()))?;
    geo.place(parent, &filling, "cathodeFilling", Transform::along_z(c.cathode_disk_z()))?;
    geo.place(
        parent,
        &copper_disk_volume,
        "cathodeCopperDiskPattern",
        Transform::along_z(c.cathode_copper_z()),
    )?;

    tracing::debug!(pattern = config.cathode_pattern.enabled, "built chamber");
    Ok(chamber)
}

/// Copper support disk, with pattern lines and a central ring if enabled.
fn cathode_copper_disk(geo: &mut Geometry, config: &SetupConfig, support: &SolidRef) -> Result<SolidRef> {
    let c = &config.chamber;
    let pattern = &config.cathode_pattern;
    if !pattern.enabled {
        return Ok(support.clone());
    }

    let line_base = geo.define_box(
        "cathodePatternLineAux",
        c.cathode_pattern_line_width,
        c.cathode_copper_support_inner_radius * 2.0,
        c.cathode_copper_support_thickness,
    )?;
    // Slightly thicker than the line so the cut is clean
    let central_hole = geo.define_tube(
        "cathodePatternCentralHole",
        c.cathode_pattern_disk_radius,
        c.cathode_copper_support_thickness * 1.1,
    )?;
    let line = geo.define_subtraction("cathodePatternLine", &line_base, &central_hole, Transform::IDENTITY)?;
    let ring = geo.define_hollow_tube(
        "cathodePatternDisk",
        c.cathode_pattern_disk_radius - c.cathode_pattern_line_width,
        c.cathode_pattern_disk_radius,
        c.cathode_copper_support_thickness,
    )?;

    let layout = RadialPattern::stepped(pattern.count, pattern.step_deg).copies_named(support.name());
    Ok(geo.define_radial("cathodeCopperDiskFinal", support, &line, &layout, Some(&ring))?)
}
