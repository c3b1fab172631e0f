//! Intermediate representation for gdmlkit geometries.
//!
//! This crate defines the name-keyed data model a geometry is made of:
//! solids (primitives and booleans), materials, logical volumes, assemblies
//! of placements and the world that roots the placement tree.
//!
//! The IR is purely declarative: it holds no mesh data. Every
//! reference between entities is a name, so a [`Document`] can be dumped to
//! JSON, reloaded and serialized to GDML without any object identity.

use serde::{Deserialize, Serialize};

/// Format version written into every [`Document`].
pub const IR_VERSION: &str = "0.1";

/// 3D vector with f64 components (millimetres).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a new Vec3.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Vector along Z only.
    pub fn along_z(z: f64) -> Self {
        Self::new(0.0, 0.0, z)
    }

    /// True when all components are exactly zero.
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

/// Unit of an angle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    /// Degrees.
    #[default]
    Deg,
    /// Radians.
    Rad,
}

impl AngleUnit {
    /// Unit string as written in GDML (`deg` / `rad`).
    pub fn as_str(&self) -> &'static str {
        match self {
            AngleUnit::Deg => "deg",
            AngleUnit::Rad => "rad",
        }
    }
}

/// Euler rotation (about X, then Y, then Z) with an explicit unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    /// Angle about X.
    pub x: f64,
    /// Angle about Y.
    pub y: f64,
    /// Angle about Z.
    pub z: f64,
    /// Unit of all three angles.
    #[serde(default)]
    pub unit: AngleUnit,
}

impl Rotation {
    /// No rotation.
    pub const IDENTITY: Rotation = Rotation {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        unit: AngleUnit::Deg,
    };

    /// Rotation given in degrees.
    pub fn degrees(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            unit: AngleUnit::Deg,
        }
    }

    /// Rotation given in radians.
    pub fn radians(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            unit: AngleUnit::Rad,
        }
    }

    /// Rotation about Z in degrees.
    pub fn about_z(deg: f64) -> Self {
        Self::degrees(0.0, 0.0, deg)
    }

    /// True when all angles are zero (regardless of unit).
    pub fn is_identity(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// The same rotation expressed in degrees.
    pub fn to_degrees(&self) -> Self {
        match self.unit {
            AngleUnit::Deg => *self,
            AngleUnit::Rad => Self::degrees(
                self.x.to_degrees(),
                self.y.to_degrees(),
                self.z.to_degrees(),
            ),
        }
    }
}

/// Rigid transform: a translation plus a rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation (mm).
    #[serde(default)]
    pub position: Vec3,
    /// Rotation.
    #[serde(default)]
    pub rotation: Rotation,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Rotation::IDENTITY,
    };

    /// Pure translation.
    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            rotation: Rotation::IDENTITY,
        }
    }

    /// Pure translation along Z.
    pub fn along_z(z: f64) -> Self {
        Self::translation(0.0, 0.0, z)
    }

    /// Pure rotation.
    pub fn rotation(rotation: Rotation) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation,
        }
    }

    /// Replace the rotation, keeping the translation.
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// True for the identity transform.
    pub fn is_identity(&self) -> bool {
        self.position.is_zero() && self.rotation.is_identity()
    }
}

/// Geometry of a solid.
///
/// Primitives carry their dimensions; booleans reference their operands by
/// solid name. All lengths are full lengths (not half lengths), centred on
/// the solid's origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Shape {
    /// Axis-aligned box centred at origin.
    Box {
        /// Size along X.
        x: f64,
        /// Size along Y.
        y: f64,
        /// Size along Z.
        z: f64,
    },
    /// Tube (optionally hollow, optionally a phi segment) along Z.
    Tube {
        /// Inner radius (0 for a solid cylinder).
        rmin: f64,
        /// Outer radius.
        rmax: f64,
        /// Length along Z.
        z: f64,
        /// Start angle of the segment.
        startphi: f64,
        /// Angular extent of the segment.
        deltaphi: f64,
        /// Unit of `startphi` / `deltaphi`.
        aunit: AngleUnit,
    },
    /// Cone section along Z.
    Cone {
        /// Length along Z.
        z: f64,
        /// Inner radius at -z/2.
        rmin1: f64,
        /// Outer radius at -z/2.
        rmax1: f64,
        /// Inner radius at +z/2.
        rmin2: f64,
        /// Outer radius at +z/2.
        rmax2: f64,
        /// Start angle of the segment.
        startphi: f64,
        /// Angular extent of the segment.
        deltaphi: f64,
        /// Unit of `startphi` / `deltaphi`.
        aunit: AngleUnit,
    },
    /// Boolean union. `transform` places `second` in `first`'s frame.
    Union {
        /// First operand (defines the frame).
        first: String,
        /// Second operand.
        second: String,
        /// Placement of the second operand.
        #[serde(default)]
        transform: Transform,
    },
    /// Boolean subtraction (first minus second).
    Subtraction {
        /// Base operand (defines the frame).
        first: String,
        /// Operand removed from `first`.
        second: String,
        /// Placement of the second operand.
        #[serde(default)]
        transform: Transform,
    },
}

impl Shape {
    /// Box with the given full lengths.
    pub fn cuboid(x: f64, y: f64, z: f64) -> Self {
        Shape::Box { x, y, z }
    }

    /// Full solid cylinder of radius `rmax` and length `z`.
    pub fn tube(rmax: f64, z: f64) -> Self {
        Self::hollow_tube(0.0, rmax, z)
    }

    /// Full-circle tube with a bore of radius `rmin`.
    pub fn hollow_tube(rmin: f64, rmax: f64, z: f64) -> Self {
        Shape::Tube {
            rmin,
            rmax,
            z,
            startphi: 0.0,
            deltaphi: 360.0,
            aunit: AngleUnit::Deg,
        }
    }

    /// Solid full-circle cone going from radius `rmax1` to `rmax2` over `z`.
    pub fn cone(z: f64, rmax1: f64, rmax2: f64) -> Self {
        Shape::Cone {
            z,
            rmin1: 0.0,
            rmax1,
            rmin2: 0.0,
            rmax2,
            startphi: 0.0,
            deltaphi: 360.0,
            aunit: AngleUnit::Deg,
        }
    }

    /// Element name used for this shape in GDML.
    pub fn tag(&self) -> &'static str {
        match self {
            Shape::Box { .. } => "box",
            Shape::Tube { .. } => "tube",
            Shape::Cone { .. } => "cone",
            Shape::Union { .. } => "union",
            Shape::Subtraction { .. } => "subtraction",
        }
    }

    /// Operand names of a boolean, in order.
    pub fn operands(&self) -> Option<(&str, &str)> {
        match self {
            Shape::Union { first, second, .. } | Shape::Subtraction { first, second, .. } => {
                Some((first.as_str(), second.as_str()))
            }
            _ => None,
        }
    }

    /// Transform applied to the second operand of a boolean.
    pub fn boolean_transform(&self) -> Option<&Transform> {
        match self {
            Shape::Union { transform, .. } | Shape::Subtraction { transform, .. } => {
                Some(transform)
            }
            _ => None,
        }
    }

    /// Extent along Z of a primitive. `None` for booleans, whose extent is
    /// taken from their first operand.
    pub fn axial_length(&self) -> Option<f64> {
        match self {
            Shape::Box { z, .. } | Shape::Tube { z, .. } | Shape::Cone { z, .. } => Some(*z),
            Shape::Union { .. } | Shape::Subtraction { .. } => None,
        }
    }
}

/// A named solid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solid {
    /// Unique solid name.
    pub name: String,
    /// Geometry.
    pub shape: Shape,
}

/// A symbolic material bound to a catalog identifier (e.g. `Copper` → `G4_Cu`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    /// Symbolic name used by volumes.
    pub name: String,
    /// Catalog identifier written as the GDML material reference.
    pub catalog_id: String,
}

/// How a material component is weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// Mass fraction.
    Fraction,
    /// Number of atoms per molecule.
    Composite,
}

impl ComponentKind {
    /// GDML element name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Fraction => "fraction",
            ComponentKind::Composite => "composite",
        }
    }
}

/// One component of a material definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Weighting kind.
    pub kind: ComponentKind,
    /// Referenced isotope, element or material.
    pub reference: String,
    /// Fraction or atom count.
    pub n: f64,
}

/// Density value with unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Density {
    /// Numeric value.
    pub value: f64,
    /// Unit string (e.g. `g/cm3`).
    pub unit: String,
}

/// Kind of entry in a GDML `<materials>` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    /// `<isotope>`.
    Isotope,
    /// `<element>`, from an atomic mass or isotope fractions.
    Element,
    /// `<material>`.
    #[default]
    Material,
}

impl DefinitionKind {
    /// GDML element name.
    pub fn tag(&self) -> &'static str {
        match self {
            DefinitionKind::Isotope => "isotope",
            DefinitionKind::Element => "element",
            DefinitionKind::Material => "material",
        }
    }
}

/// Molar mass given by an `<atom>` child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicMass {
    /// Numeric value.
    pub value: f64,
    /// Unit string, if given (GDML defaults to `g/mole`).
    pub unit: Option<String>,
}

/// An isotope, element or material read from a catalog file, embedded in
/// the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    /// What this entry defines.
    #[serde(default)]
    pub kind: DefinitionKind,
    /// Catalog identifier.
    pub name: String,
    /// Optional chemical formula.
    pub formula: Option<String>,
    /// Optional state (`gas`, `solid`, ...).
    pub state: Option<String>,
    /// Atomic number.
    #[serde(default)]
    pub z: Option<f64>,
    /// Nucleon count of an isotope.
    #[serde(default)]
    pub nucleons: Option<u32>,
    /// Molar mass.
    #[serde(default)]
    pub atom: Option<AtomicMass>,
    /// Density, if given.
    pub density: Option<Density>,
    /// Components in declaration order.
    pub components: Vec<Component>,
}

impl MaterialDef {
    /// Empty definition of the given kind.
    pub fn new(kind: DefinitionKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            formula: None,
            state: None,
            z: None,
            nucleons: None,
            atom: None,
            density: None,
            components: Vec::new(),
        }
    }
}

/// A logical volume: a solid filled with a material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    /// Unique volume name.
    pub name: String,
    /// Solid name.
    pub solid: String,
    /// Symbolic material name.
    pub material: String,
}

/// What a placement puts into its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum PlacementTarget {
    /// A logical volume.
    Volume(String),
    /// A nested assembly.
    Assembly(String),
}

impl PlacementTarget {
    /// Name of the placed entity.
    pub fn name(&self) -> &str {
        match self {
            PlacementTarget::Volume(name) | PlacementTarget::Assembly(name) => name,
        }
    }
}

/// A physical placement of a volume or assembly inside a parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Instance name.
    pub name: String,
    /// Placed entity.
    pub target: PlacementTarget,
    /// Local transform in the parent frame.
    #[serde(default)]
    pub transform: Transform,
}

/// A named, ordered group of placements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    /// Unique assembly name.
    pub name: String,
    /// Placements in declaration order.
    pub placements: Vec<Placement>,
}

/// The root of the placement tree: a volume and its direct placements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// Name of the world volume.
    pub volume: String,
    /// Placements inside the world.
    pub placements: Vec<Placement>,
}

/// A complete geometry ready for serialization.
///
/// Collections keep creation order. Every cross reference is a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Format version string.
    pub version: String,
    /// Symbolic materials.
    pub materials: Vec<Material>,
    /// Catalog-file isotopes, elements and materials to embed, dependencies
    /// first.
    #[serde(default)]
    pub material_defs: Vec<MaterialDef>,
    /// Solids in creation order.
    pub solids: Vec<Solid>,
    /// Logical volumes in creation order (world included).
    pub volumes: Vec<Volume>,
    /// Assemblies in creation order.
    pub assemblies: Vec<Assembly>,
    /// Root of the placement tree.
    pub world: Option<World>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: IR_VERSION.to_string(),
            materials: Vec::new(),
            material_defs: Vec::new(),
            solids: Vec::new(),
            volumes: Vec::new(),
            assemblies: Vec::new(),
            world: None,
        }
    }
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Look up a solid by name.
    pub fn solid(&self, name: &str) -> Option<&Solid> {
        self.solids.iter().find(|s| s.name == name)
    }

    /// Look up a volume by name.
    pub fn volume(&self, name: &str) -> Option<&Volume> {
        self.volumes.iter().find(|v| v.name == name)
    }

    /// Look up an assembly by name.
    pub fn assembly(&self, name: &str) -> Option<&Assembly> {
        self.assemblies.iter().find(|a| a.name == name)
    }

    /// Look up a symbolic material by name.
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    /// Total number of placements (assemblies plus world).
    pub fn placement_count(&self) -> usize {
        let in_assemblies: usize = self.assemblies.iter().map(|a| a.placements.len()).sum();
        in_assemblies + self.world.as_ref().map_or(0, |w| w.placements.len())
    }
}
