//! Copper readout plate with a central bore and a spoked cathode, placed in
//! an air world and written as GDML.

use gdmlkit::{write_gdml, Geometry, Parent, RadialPattern, Transform};

fn main() -> gdmlkit::Result<()> {
    let mut geo = Geometry::default();
    let air = geo.resolve_material("Air", "G4_AIR")?;
    let copper = geo.resolve_material("Copper", "G4_Cu")?;

    // Plate with a through bore
    let plate = geo.define_box("plate", 134.0, 134.0, 15.0)?;
    let bore = geo.define_tube("bore", 51.0, 16.0)?;
    let plate = geo.define_subtraction("plateWithBore", &plate, &bore, Transform::IDENTITY)?;
    let plate = geo.bind("plateVolume", &plate, &copper)?;

    // Four spokes every 45 degrees and a hub ring
    let ring = geo.define_hollow_tube("ring", 8.5, 45.0, 1.0)?;
    let spoke = geo.define_box("spoke", 0.3, 17.0, 1.0)?;
    let hub = geo.define_hollow_tube("hub", 3.95, 4.25, 1.0)?;
    let cathode = geo.define_radial("cathode", &ring, &spoke, &RadialPattern::stepped(4, 45.0), Some(&hub))?;
    let cathode = geo.bind("cathodeVolume", &cathode, &copper)?;

    let assembly = geo.begin_assembly("readout")?;
    geo.place(Parent::from(&assembly), &plate, "plate", Transform::IDENTITY)?;
    geo.place(Parent::from(&assembly), &cathode, "cathode", Transform::along_z(20.0))?;

    let world_box = geo.define_box("worldBox", 1000.0, 1000.0, 1000.0)?;
    let world = geo.bind("world", &world_box, &air)?;
    geo.set_world(&world)?;
    geo.place(Parent::World, &assembly, "Readout", Transform::IDENTITY)?;

    write_gdml(&geo.finish()?, "readout_plate.gdml")?;
    println!("wrote readout_plate.gdml");
    Ok(())
}
