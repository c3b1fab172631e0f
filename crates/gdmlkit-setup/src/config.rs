//! Detector dimensions and options.
//!
//! Every dimension is in millimetres, every angle in degrees. Values that
//! follow from others are methods, never stored fields. All sections are
//! `#[serde(default)]`, so a TOML file only needs the keys it changes.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SetupError};

/// Complete setup configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// Chamber body, readout and cathode.
    pub chamber: ChamberConfig,
    /// Radial pattern on the cathode copper disk.
    pub cathode_pattern: CathodePatternConfig,
    /// Detector pipe towards the telescope.
    pub detector_pipe: DetectorPipeConfig,
    /// Lead shielding.
    pub shielding: ShieldingConfig,
    /// World box.
    pub world: WorldConfig,
    /// Symbolic material name to catalog id.
    pub materials: BTreeMap<String, String>,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            chamber: ChamberConfig::default(),
            cathode_pattern: CathodePatternConfig::default(),
            detector_pipe: DetectorPipeConfig::default(),
            shielding: ShieldingConfig::default(),
            world: WorldConfig::default(),
            materials: default_materials(),
        }
    }
}

/// Symbolic materials used by the setup.
pub fn default_materials() -> BTreeMap<String, String> {
    [
        ("Air", "G4_AIR"),
        ("Gas", "G4_Ar"),
        ("Vacuum", "G4_Galactic"),
        ("Copper", "G4_Cu"),
        ("Lead", "G4_Pb"),
        ("Teflon", "G4_TEFLON"),
        ("Kapton", "G4_KAPTON"),
        ("Mylar", "G4_MYLAR"),
    ]
    .into_iter()
    .map(|(name, id)| (name.to_string(), id.to_string()))
    .collect()
}

impl SetupConfig {
    /// Parse a TOML configuration. Symbolic materials missing from
    /// `[materials]` keep their default catalog id.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: SetupConfig = toml::from_str(text)?;
        for (name, id) in default_materials() {
            config.materials.entry(name).or_insert(id);
        }
        Ok(config)
    }

    /// Read a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Encode as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that derived lengths are positive and parts fit together.
    pub fn validate(&self) -> Result<()> {
        let c = &self.chamber;
        let p = &self.detector_pipe;
        let s = &self.shielding;

        positive("chamber.height", c.height)?;
        positive("chamber.backplate_thickness", c.backplate_thickness)?;
        positive("chamber.readout_kapton_thickness", c.readout_kapton_thickness)?;
        positive("chamber.readout_copper_thickness", c.readout_copper_thickness)?;
        positive("chamber.cathode_window_thickness", c.cathode_window_thickness)?;
        positive("chamber gas radius", c.gas_radius())?;
        if c.diameter >= c.square_side {
            return Err(invalid("chamber.diameter must be smaller than chamber.square_side"));
        }
        if c.cathode_copper_support_thickness >= c.cathode_teflon_disk_thickness {
            return Err(invalid(
                "chamber.cathode_copper_support_thickness must be below the teflon disk thickness",
            ));
        }
        if c.cathode_pattern_line_width >= c.cathode_pattern_disk_radius {
            return Err(invalid(
                "chamber.cathode_pattern_line_width must be below the pattern disk radius",
            ));
        }

        positive("detector_pipe section 1 length", p.section1_length())?;
        positive("detector_pipe section 2 length", p.section2_length())?;
        positive("detector_pipe inside section 1 length", p.inside_section1_length())?;
        positive("detector_pipe inside section 2 length", p.inside_section2_length())?;
        positive("detector_pipe inside section 3 length", p.inside_section3_length())?;

        if s.enabled && (s.shaft_x >= s.size_xy || s.shaft_y >= s.size_xy || s.shaft_z > s.size_z) {
            return Err(invalid("shielding shaft does not fit inside the lead box"));
        }
        positive("world.size", self.world.size)?;
        if !self.materials.contains_key(&self.world.material) {
            return Err(invalid(format!(
                "world.material {} is not listed in [materials]",
                self.world.material
            )));
        }
        Ok(())
    }

    /// Z of the detector pipe assembly in the world.
    pub fn pipe_z_in_world(&self) -> f64 {
        self.detector_pipe.chamber_flange_thickness / 2.0
            + self.chamber.height / 2.0
            + self.chamber.cathode_teflon_disk_thickness
    }

    /// Radius of the pipe flange bolted to the chamber.
    pub fn pipe_chamber_flange_radius(&self) -> f64 {
        self.chamber.square_side / 2.0
    }

    /// Distance by which the shielding box is moved down (towards −z).
    pub fn shielding_offset_z(&self) -> f64 {
        self.shielding.detector_separation
            + self.chamber.height / 2.0
            + self.chamber.readout_kapton_thickness
            + self.chamber.backplate_thickness
    }
}

fn positive(what: &str, value: f64) -> Result<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{what} must be positive, got {value}")))
    }
}

fn invalid(message: impl Into<String>) -> SetupError {
    SetupError::InvalidConfig(message.into())
}

/// Chamber body, readout planes and cathode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChamberConfig {
    /// Drift height of the gas volume.
    pub height: f64,
    /// Inner diameter of the body bore.
    pub diameter: f64,
    /// Copper backplate thickness.
    pub backplate_thickness: f64,
    /// Side of the square body, backplate and readout board.
    pub square_side: f64,
    /// Teflon lining thickness.
    pub teflon_wall_thickness: f64,
    /// Kapton readout board thickness.
    pub readout_kapton_thickness: f64,
    /// Copper readout plane thickness.
    pub readout_copper_thickness: f64,
    /// Side of the square copper readout plane.
    pub readout_plane_side: f64,
    /// Radius of the hole in the cathode teflon disk.
    pub cathode_teflon_disk_hole_radius: f64,
    /// Cathode teflon disk thickness.
    pub cathode_teflon_disk_thickness: f64,
    /// Outer radius of the cathode copper support.
    pub cathode_copper_support_outer_radius: f64,
    /// Inner radius of the cathode copper support.
    pub cathode_copper_support_inner_radius: f64,
    /// Cathode copper support thickness.
    pub cathode_copper_support_thickness: f64,
    /// Mylar window thickness.
    pub cathode_window_thickness: f64,
    /// Outer radius of the central pattern ring.
    pub cathode_pattern_disk_radius: f64,
    /// Width of the pattern lines and of the central ring.
    pub cathode_pattern_line_width: f64,
    /// Symbolic material of the readout plane.
    pub readout_plane_material: String,
}

impl Default for ChamberConfig {
    fn default() -> Self {
        Self {
            height: 30.0,
            diameter: 102.0,
            backplate_thickness: 15.0,
            square_side: 134.0,
            teflon_wall_thickness: 1.0,
            readout_kapton_thickness: 0.5,
            readout_copper_thickness: 0.2,
            readout_plane_side: 60.0,
            cathode_teflon_disk_hole_radius: 15.0,
            cathode_teflon_disk_thickness: 5.0,
            cathode_copper_support_outer_radius: 45.0,
            cathode_copper_support_inner_radius: 8.5,
            cathode_copper_support_thickness: 1.0,
            cathode_window_thickness: 0.004,
            cathode_pattern_disk_radius: 4.25,
            cathode_pattern_line_width: 0.3,
            readout_plane_material: "Kapton".to_string(),
        }
    }
}

impl ChamberConfig {
    /// Radius of the body bore.
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    /// Radius of the gas volume, inside the teflon lining.
    pub fn gas_radius(&self) -> f64 {
        self.radius() - self.teflon_wall_thickness
    }

    /// Z of the copper support recess inside the cathode disk frame.
    pub fn cathode_recess_z(&self) -> f64 {
        -self.cathode_teflon_disk_thickness / 2.0 + self.cathode_copper_support_thickness / 2.0
    }

    /// Z of the backplate, below the kapton board.
    pub fn backplate_z(&self) -> f64 {
        -self.height / 2.0 - self.readout_kapton_thickness - self.backplate_thickness / 2.0
    }

    /// Z of the kapton readout board.
    pub fn kapton_z(&self) -> f64 {
        -self.height / 2.0 - self.readout_kapton_thickness / 2.0
    }

    /// Z of the copper readout plane, inside the gas.
    pub fn readout_plane_z(&self) -> f64 {
        -self.height / 2.0 + self.readout_copper_thickness / 2.0
    }

    /// Z of the mylar window, at the top of the gas.
    pub fn window_z(&self) -> f64 {
        self.height / 2.0 - self.cathode_window_thickness / 2.0
    }

    /// Z of the cathode teflon disk and of its vacuum filling.
    pub fn cathode_disk_z(&self) -> f64 {
        self.height / 2.0 + self.cathode_teflon_disk_thickness / 2.0
    }

    /// Z of the cathode copper disk.
    pub fn cathode_copper_z(&self) -> f64 {
        self.height / 2.0 + self.cathode_copper_support_thickness / 2.0
    }
}

/// Radial line pattern on the cathode copper disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CathodePatternConfig {
    /// Add the lines and the central ring.
    pub enabled: bool,
    /// Number of lines.
    pub count: usize,
    /// Angle between consecutive lines (degrees).
    pub step_deg: f64,
}

impl Default for CathodePatternConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 4,
            step_deg: 45.0,
        }
    }
}

/// Detector pipe: outer shell and its vacuum bore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorPipeConfig {
    /// Outer length from chamber flange to telescope flange.
    pub total_length: f64,
    /// Flange thickness on the chamber side.
    pub chamber_flange_thickness: f64,
    /// Flange thickness on the telescope side.
    pub telescope_flange_thickness: f64,
    /// Flange radius on the telescope side.
    pub telescope_flange_radius: f64,
    /// Length of section 2 including the telescope flange.
    pub section2_span: f64,
    /// Outer radius of section 1.
    pub outer_radius1: f64,
    /// Outer radius of section 2.
    pub outer_radius2: f64,
    /// Bore radius of inside section 1.
    pub inside_radius1: f64,
    /// Bore radius of inside section 2.
    pub inside_radius2: f64,
    /// Bore radius of inside section 3.
    pub inside_radius3: f64,
    /// Bore radius at the telescope end.
    pub inside_telescope_radius: f64,
    /// Length of the cone after inside section 1.
    pub inside_cone1_length: f64,
    /// Length of the cone after inside section 2.
    pub inside_cone2_length: f64,
    /// Length of the cone after inside section 3.
    pub inside_cone3_length: f64,
    /// Inside section 1 plus cone 1.
    pub inside_span1: f64,
    /// Inside sections 2 and 3 with their cones.
    pub inside_span23: f64,
    /// Inside section 3 plus cone 3.
    pub inside_span3: f64,
}

impl Default for DetectorPipeConfig {
    fn default() -> Self {
        Self {
            total_length: 491.0,
            chamber_flange_thickness: 14.0,
            telescope_flange_thickness: 18.0,
            telescope_flange_radius: 75.0,
            section2_span: 150.0,
            outer_radius1: 46.0,
            outer_radius2: 54.0,
            inside_radius1: 21.5,
            inside_radius2: 34.0,
            inside_radius3: 42.5,
            inside_telescope_radius: 54.0,
            inside_cone1_length: 21.65,
            inside_cone2_length: 14.72,
            inside_cone3_length: 9.0,
            inside_span1: 201.0,
            inside_span23: 290.0,
            inside_span3: 115.0,
        }
    }
}

impl DetectorPipeConfig {
    /// Outer section 2 length, without the telescope flange.
    pub fn section2_length(&self) -> f64 {
        self.section2_span - self.telescope_flange_thickness
    }

    /// Outer section 1 length: whatever the flanges and section 2 leave.
    pub fn section1_length(&self) -> f64 {
        self.total_length
            - self.telescope_flange_thickness
            - self.chamber_flange_thickness
            - self.section2_length()
    }

    /// Inside section 1 length.
    pub fn inside_section1_length(&self) -> f64 {
        self.inside_span1 - self.inside_cone1_length
    }

    /// Inside section 2 length.
    pub fn inside_section2_length(&self) -> f64 {
        self.inside_span23
            - self.inside_section3_length()
            - self.inside_cone3_length
            - self.inside_cone2_length
    }

    /// Inside section 3 length.
    pub fn inside_section3_length(&self) -> f64 {
        self.inside_span3 - self.inside_cone3_length
    }

    /// Z of the bore relative to the outer shell. Both chains are centred
    /// on their first segment; the bore starts at the chamber face.
    pub fn bore_offset(&self) -> f64 {
        self.inside_section1_length() / 2.0 - self.chamber_flange_thickness / 2.0
    }
}

/// Lead shielding box with a shaft for the chamber and pipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldingConfig {
    /// Build the shielding.
    pub enabled: bool,
    /// Side of the lead box in x and y.
    pub size_xy: f64,
    /// Height of the lead box.
    pub size_z: f64,
    /// Shaft width in x.
    pub shaft_x: f64,
    /// Shaft width in y.
    pub shaft_y: f64,
    /// Shaft depth along z.
    pub shaft_z: f64,
    /// Gap between the detector and the shielding top (negative overlaps).
    pub detector_separation: f64,
}

impl Default for ShieldingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size_xy: 590.0,
            size_z: 540.0,
            shaft_x: 194.0,
            shaft_y: 170.0,
            shaft_z: 340.0,
            detector_separation: -60.0,
        }
    }
}

impl ShieldingConfig {
    /// Z of the shaft inside the lead box: open at the top face.
    pub fn shaft_z_offset(&self) -> f64 {
        self.size_z / 2.0 - self.shaft_z / 2.0
    }
}

/// World volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Side of the world cube.
    pub size: f64,
    /// Symbolic material filling the world.
    pub material: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: 4000.0,
            material: "Air".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_derived_lengths() {
        let config = SetupConfig::default();
        let pipe = &config.detector_pipe;

        assert_eq!(pipe.section2_length(), 132.0);
        assert_eq!(pipe.section1_length(), 327.0);
        assert_relative_eq!(pipe.inside_section1_length(), 179.35, epsilon = 1e-9);
        assert_relative_eq!(pipe.inside_section3_length(), 106.0);
        assert_relative_eq!(pipe.inside_section2_length(), 160.28, epsilon = 1e-9);
        assert_relative_eq!(pipe.bore_offset(), 82.675, epsilon = 1e-9);

        assert_eq!(config.pipe_z_in_world(), 27.0);
        assert_eq!(config.pipe_chamber_flange_radius(), 67.0);
        assert_eq!(config.shielding_offset_z(), -29.5);
        assert_eq!(config.shielding.shaft_z_offset(), 100.0);
    }

    #[test]
    fn chamber_offsets() {
        let chamber = ChamberConfig::default();
        assert_eq!(chamber.gas_radius(), 50.0);
        assert_eq!(chamber.backplate_z(), -23.0);
        assert_eq!(chamber.kapton_z(), -15.25);
        assert_relative_eq!(chamber.readout_plane_z(), -14.9, epsilon = 1e-12);
        assert_relative_eq!(chamber.window_z(), 14.998, epsilon = 1e-12);
        assert_eq!(chamber.cathode_disk_z(), 17.5);
        assert_eq!(chamber.cathode_copper_z(), 15.5);
        assert_eq!(chamber.cathode_recess_z(), -2.0);
    }

    #[test]
    fn partial_toml_overrides_only_named_keys() {
        let config = SetupConfig::from_toml_str(
            r#"
            [chamber]
            height = 40.0

            [shielding]
            enabled = false

            [materials]
            Gas = "G4_Xe"
            "#,
        )
        .unwrap();

        assert_eq!(config.chamber.height, 40.0);
        assert_eq!(config.chamber.diameter, 102.0);
        assert!(!config.shielding.enabled);
        assert_eq!(config.materials["Gas"], "G4_Xe");
        assert_eq!(config.materials["Copper"], "G4_Cu");
        assert_eq!(config.world.size, 4000.0);
        assert_eq!(config.chamber.readout_plane_material, "Kapton");
    }

    #[test]
    fn toml_roundtrip() {
        let config = SetupConfig::default();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[detector_pipe]"));
        assert_eq!(SetupConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn validate_rejects_inconsistent_dimensions() {
        assert!(SetupConfig::default().validate().is_ok());

        let mut config = SetupConfig::default();
        config.detector_pipe.total_length = 100.0;
        assert!(matches!(config.validate(), Err(SetupError::InvalidConfig(_))));

        let mut config = SetupConfig::default();
        config.chamber.teflon_wall_thickness = 60.0;
        assert!(matches!(config.validate(), Err(SetupError::InvalidConfig(_))));

        let mut config = SetupConfig::default();
        config.world.material = "Unobtainium".into();
        assert!(matches!(config.validate(), Err(SetupError::InvalidConfig(_))));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SetupConfig::from_toml_str("[chamber]\nheight = \"tall\"").unwrap_err();
        assert!(matches!(err, SetupError::Parse(_)));
    }
}
