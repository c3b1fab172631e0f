//! Detector pipe assembly: a flanged copper pipe and its vacuum bore.

use gdmlkit::{AssemblyRef, Geometry, Parent, Transform};

use crate::config::SetupConfig;
use crate::error::Result;

/// Build the detector pipe assembly into `geo`.
///
/// The assembly frame is centred on the chamber flange; the pipe extends
/// towards +z.
pub fn build(geo: &mut Geometry, config: &SetupConfig) -> Result<AssemblyRef> {
    let p = &config.detector_pipe;
    let copper = geo.material("Copper")?;
    let vacuum = geo.material("Vacuum")?;

    // Outer shell: flange, two sections, telescope flange
    let outer = [
        geo.define_tube(
            "detectorPipeChamberFlangeSolid",
            config.pipe_chamber_flange_radius(),
            p.chamber_flange_thickness,
        )?,
        geo.define_tube("detectorPipeSection1of2Solid", p.outer_radius1, p.section1_length())?,
        geo.define_tube("detectorPipeSection2of2Solid", p.outer_radius2, p.section2_length())?,
        geo.define_tube(
            "detectorPipeTelescopeFlangeSolid",
            p.telescope_flange_radius,
            p.telescope_flange_thickness,
        )?,
    ];
    let outer = geo.define_chain("detectorPipeNotEmpty", &outer)?;

    // Bore: three sections joined by widening cones
    let inner = [
        geo.define_tube("detectorPipeInside1of3Solid", p.inside_radius1, p.inside_section1_length())?,
        geo.define_cone(
            "detectorPipeInsideCone1of3Solid",
            p.inside_cone1_length,
            p.inside_radius1,
            p.inside_radius2,
        )?,
        geo.define_tube("detectorPipeInside2of3Solid", p.inside_radius2, p.inside_section2_length())?,
        geo.define_cone(
            "detectorPipeInsideCone2of3Solid",
            p.inside_cone2_length,
            p.inside_radius2,
            p.inside_radius3,
        )?,
        geo.define_tube("detectorPipeInside3of3Solid", p.inside_radius3, p.inside_section3_length())?,
        geo.define_cone(
            "detectorPipeInsideCone3of3Solid",
            p.inside_cone3_length,
            p.inside_radius3,
            p.inside_telescope_radius,
        )?,
    ];
    let inner = geo.define_chain("detectorPipeInside", &inner)?;

    let bore_at = Transform::along_z(p.bore_offset());
    let pipe = geo.define_subtraction("detectorPipeSolid", &outer.solid, &inner.solid, bore_at)?;
    let pipe = geo.bind("detectorPipeVolume", &pipe, &copper)?;
    let filling = geo.bind("detectorPipeFillingVolume", &inner.solid, &vacuum)?;

    let assembly = geo.begin_assembly("detectorPipeAssembly")?;
    geo.place(Parent::from(&assembly), &pipe, "detectorPipe", Transform::IDENTITY)?;
    geo.place(Parent::from(&assembly), &filling, "detectorPipeFilling", bore_at)?;

    tracing::debug!(
        outer_length = outer.total_length(),
        bore_length = inner.total_length(),
        "built detector pipe"
    );
    Ok(assembly)
}
