//! The geometry builder: one construction pass over every registry.

use gdmlkit_ir::{Document, PlacementTarget, Shape, Transform, IR_VERSION};

use crate::catalog::MaterialCatalog;
use crate::chain::Chain;
use crate::error::{EntityKind, GeometryError, Result};
use crate::materials::MaterialRegistry;
use crate::order;
use crate::pattern::RadialPattern;
use crate::refs::{AssemblyRef, MaterialRef, SolidRef, VolumeRef};
use crate::solids::SolidRegistry;
use crate::structure::{Parent, SceneGraph, Target};
use crate::volumes::VolumeRegistry;

/// Builder for a complete geometry.
///
/// Every operation either succeeds or leaves the builder unchanged.
/// [`Geometry::finish`] hands the result over as an IR [`Document`].
///
/// ```
/// use gdmlkit::{Geometry, Parent, Transform};
///
/// let mut geo = Geometry::default();
/// let air = geo.resolve_material("Air", "G4_AIR")?;
/// let copper = geo.resolve_material("Copper", "G4_Cu")?;
///
/// let world_box = geo.define_box("worldBox", 4000.0, 4000.0, 4000.0)?;
/// let world = geo.bind("world", &world_box, &air)?;
/// geo.set_world(&world)?;
///
/// let block = geo.define_box("block", 100.0, 100.0, 30.0)?;
/// let bore = geo.define_tube("bore", 51.0, 30.0)?;
/// let body = geo.define_subtraction("body", &block, &bore, Transform::IDENTITY)?;
/// let body = geo.bind("bodyVolume", &body, &copper)?;
/// geo.place(Parent::World, &body, "body", Transform::IDENTITY)?;
///
/// let doc = geo.finish()?;
/// assert_eq!(doc.placement_count(), 1);
/// # Ok::<(), gdmlkit::GeometryError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Geometry {
    catalog: MaterialCatalog,
    materials: MaterialRegistry,
    solids: SolidRegistry,
    volumes: VolumeRegistry,
    scene: SceneGraph,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(MaterialCatalog::nist())
    }
}

impl Geometry {
    /// Create an empty geometry resolving materials against `catalog`.
    pub fn new(catalog: MaterialCatalog) -> Self {
        Self {
            catalog,
            materials: MaterialRegistry::new(),
            solids: SolidRegistry::new(),
            volumes: VolumeRegistry::new(),
            scene: SceneGraph::new(),
        }
    }

    /// An empty builder sharing this one's catalog and materials.
    ///
    /// Fragments can be filled independently (on other threads) and
    /// folded back with [`Geometry::merge`].
    pub fn fragment(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            materials: self.materials.clone(),
            solids: SolidRegistry::new(),
            volumes: VolumeRegistry::new(),
            scene: SceneGraph::new(),
        }
    }

    // =========================================================================
    // Materials
    // =========================================================================

    /// Bind symbolic material `name` to catalog id `catalog_id`.
    pub fn resolve_material(&mut self, name: impl Into<String>, catalog_id: &str) -> Result<MaterialRef> {
        self.materials.resolve(&self.catalog, name, catalog_id)
    }

    /// Reference to a registered material.
    pub fn material(&self, name: &str) -> Result<MaterialRef> {
        self.materials.lookup(name)
    }

    // =========================================================================
    // Solids
    // =========================================================================

    /// Register a primitive shape.
    pub fn define_primitive(&mut self, name: impl Into<String>, shape: Shape) -> Result<SolidRef> {
        self.solids.define_primitive(name, shape)
    }

    /// Register a box with full lengths `x`, `y`, `z`.
    pub fn define_box(&mut self, name: impl Into<String>, x: f64, y: f64, z: f64) -> Result<SolidRef> {
        self.solids.define_box(name, x, y, z)
    }

    /// Register a full cylinder.
    pub fn define_tube(&mut self, name: impl Into<String>, rmax: f64, z: f64) -> Result<SolidRef> {
        self.solids.define_tube(name, rmax, z)
    }

    /// Register a cylindrical shell.
    pub fn define_hollow_tube(
        &mut self,
        name: impl Into<String>,
        rmin: f64,
        rmax: f64,
        z: f64,
    ) -> Result<SolidRef> {
        self.solids.define_hollow_tube(name, rmin, rmax, z)
    }

    /// Register a solid cone frustum.
    pub fn define_cone(
        &mut self,
        name: impl Into<String>,
        z: f64,
        rmax1: f64,
        rmax2: f64,
    ) -> Result<SolidRef> {
        self.solids.define_cone(name, z, rmax1, rmax2)
    }

    /// Register `first ∪ second`, `second` moved by `transform`.
    pub fn define_union(
        &mut self,
        name: impl Into<String>,
        first: &SolidRef,
        second: &SolidRef,
        transform: Transform,
    ) -> Result<SolidRef> {
        self.solids.define_union(name, first, second, transform)
    }

    /// Register `first − second`, `second` moved by `transform`.
    pub fn define_subtraction(
        &mut self,
        name: impl Into<String>,
        first: &SolidRef,
        second: &SolidRef,
        transform: Transform,
    ) -> Result<SolidRef> {
        self.solids.define_subtraction(name, first, second, transform)
    }

    /// Union `segments` flush along z. See [`SolidRegistry::define_chain`].
    pub fn define_chain(&mut self, name: impl Into<String>, segments: &[SolidRef]) -> Result<Chain> {
        self.solids.define_chain(name, segments)
    }

    /// Union rotated copies of `pattern` onto `base`. See
    /// [`SolidRegistry::define_radial`].
    pub fn define_radial(
        &mut self,
        name: impl Into<String>,
        base: &SolidRef,
        pattern: &SolidRef,
        layout: &RadialPattern,
        hub: Option<&SolidRef>,
    ) -> Result<SolidRef> {
        self.solids.define_radial(name, base, pattern, layout, hub)
    }

    /// Reference to a registered solid.
    pub fn solid(&self, name: &str) -> Result<SolidRef> {
        self.solids.resolve(name)
    }

    /// Extent along z of a solid's frame.
    pub fn axial_length(&self, solid: &SolidRef) -> Result<f64> {
        self.solids.axial_length(solid)
    }

    // =========================================================================
    // Volumes and placements
    // =========================================================================

    /// Fill `solid` with `material`. The name must not be taken by a volume
    /// or an assembly.
    pub fn bind(
        &mut self,
        name: impl Into<String>,
        solid: &SolidRef,
        material: &MaterialRef,
    ) -> Result<VolumeRef> {
        let name = name.into();
        if self.scene.contains(&name) {
            return Err(GeometryError::duplicate(EntityKind::Volume, name));
        }
        self.volumes.bind(&self.solids, &self.materials, name, solid, material)
    }

    /// Reference to a bound volume.
    pub fn volume(&self, name: &str) -> Result<VolumeRef> {
        self.volumes.lookup(name)
    }

    /// Start a new, empty assembly.
    pub fn begin_assembly(&mut self, name: impl Into<String>) -> Result<AssemblyRef> {
        self.scene.begin_assembly(&self.volumes, name)
    }

    /// Reference to an assembly.
    pub fn assembly(&self, name: &str) -> Result<AssemblyRef> {
        self.scene.lookup(name)
    }

    /// Place a volume or assembly into `parent`.
    pub fn place<'a>(
        &mut self,
        parent: Parent<'_>,
        target: impl Into<Target<'a>>,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<()> {
        self.scene.place(&self.volumes, parent, target, name, transform)
    }

    /// Make `volume` the world.
    pub fn set_world(&mut self, volume: &VolumeRef) -> Result<()> {
        self.scene.set_world(&self.volumes, volume)
    }

    // =========================================================================
    // Read access
    // =========================================================================

    /// The material catalog.
    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }

    /// Registered materials.
    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    /// Registered solids.
    pub fn solids(&self) -> &SolidRegistry {
        &self.solids
    }

    /// Bound volumes.
    pub fn volumes(&self) -> &VolumeRegistry {
        &self.volumes
    }

    /// Assemblies and world.
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    // =========================================================================
    // Merge and finish
    // =========================================================================

    /// Fold a fragment into this geometry.
    ///
    /// All names and references of `other` are checked against the union of
    /// both builders before anything is applied. Materials registered in both
    /// with the same catalog id are kept once.
    pub fn merge(&mut self, other: Geometry) -> Result<()> {
        for material in other.materials.iter() {
            if let Some(existing) = self.materials.get(&material.name) {
                if existing.catalog_id != material.catalog_id {
                    return Err(GeometryError::duplicate(EntityKind::Material, &material.name));
                }
            }
        }
        for solid in other.solids.iter() {
            if self.solids.contains(&solid.name) {
                return Err(GeometryError::duplicate(EntityKind::Solid, &solid.name));
            }
            if let Some((first, second)) = solid.shape.operands() {
                for operand in [first, second] {
                    if !self.solids.contains(operand) && !other.solids.contains(operand) {
                        return Err(GeometryError::unknown(EntityKind::Solid, operand));
                    }
                }
            }
        }
        for volume in other.volumes.iter() {
            if self.volumes.contains(&volume.name) || self.scene.contains(&volume.name) {
                return Err(GeometryError::duplicate(EntityKind::Volume, &volume.name));
            }
            if !self.solids.contains(&volume.solid) && !other.solids.contains(&volume.solid) {
                return Err(GeometryError::unknown(EntityKind::Solid, &volume.solid));
            }
            if !self.materials.contains(&volume.material) && !other.materials.contains(&volume.material) {
                return Err(GeometryError::unknown(EntityKind::Material, &volume.material));
            }
        }
        for assembly in other.scene.iter() {
            if self.scene.contains(&assembly.name)
                || self.volumes.contains(&assembly.name)
                || other.volumes.contains(&assembly.name)
            {
                return Err(GeometryError::duplicate(EntityKind::Assembly, &assembly.name));
            }
            for placement in &assembly.placements {
                let known = match &placement.target {
                    PlacementTarget::Volume(v) => self.volumes.contains(v) || other.volumes.contains(v),
                    PlacementTarget::Assembly(a) => self.scene.contains(a) || other.scene.contains(a),
                };
                if !known {
                    let kind = match placement.target {
                        PlacementTarget::Volume(_) => EntityKind::Volume,
                        PlacementTarget::Assembly(_) => EntityKind::Assembly,
                    };
                    return Err(GeometryError::unknown(kind, placement.target.name()));
                }
            }
        }
        if let (Some(_), Some(theirs)) = (self.scene.world(), other.scene.world()) {
            return Err(GeometryError::WorldAlreadySet(theirs.volume.clone()));
        }

        tracing::info!(
            solids = other.solids.len(),
            volumes = other.volumes.len(),
            assemblies = other.scene.len(),
            "merged fragment"
        );
        self.materials.absorb(other.materials);
        self.solids.absorb(other.solids.into_vec());
        self.volumes.absorb(other.volumes.into_vec());
        self.scene.absorb(other.scene);
        Ok(())
    }

    /// Hand the geometry over as a validated IR document.
    pub fn finish(self) -> Result<Document> {
        if self.scene.world().is_none() {
            return Err(GeometryError::UnresolvedWorld);
        }
        let (materials, material_defs) = self.materials.into_parts();
        let (assemblies, world) = self.scene.into_parts();
        let doc = Document {
            version: IR_VERSION.to_string(),
            materials,
            material_defs,
            solids: self.solids.into_vec(),
            volumes: self.volumes.into_vec(),
            assemblies,
            world,
        };
        order::validate(&doc)?;

        tracing::info!(
            solids = doc.solids.len(),
            volumes = doc.volumes.len(),
            assemblies = doc.assemblies.len(),
            placements = doc.placement_count(),
            "finished geometry"
        );
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_world() -> Geometry {
        let mut geo = Geometry::default();
        let air = geo.resolve_material("Air", "G4_AIR").unwrap();
        let world_box = geo.define_box("worldBox", 4000.0, 4000.0, 4000.0).unwrap();
        let world = geo.bind("world", &world_box, &air).unwrap();
        geo.set_world(&world).unwrap();
        geo
    }

    #[test]
    fn finish_requires_world() {
        let geo = Geometry::default();
        assert!(matches!(geo.finish(), Err(GeometryError::UnresolvedWorld)));
    }

    #[test]
    fn fragments_merge_and_share_materials() {
        let mut geo = with_world();
        geo.resolve_material("Copper", "G4_Cu").unwrap();

        let mut frag = geo.fragment();
        let copper = frag.material("Copper").unwrap();
        let lead = frag.resolve_material("Lead", "G4_Pb").unwrap();
        let plate = frag.define_box("plate", 10.0, 10.0, 1.0).unwrap();
        frag.bind("plateVolume", &plate, &copper).unwrap();
        let brick = frag.define_box("brick", 20.0, 10.0, 5.0).unwrap();
        frag.bind("brickVolume", &brick, &lead).unwrap();
        let stack = frag.begin_assembly("stack").unwrap();
        let plate_vol = frag.volume("plateVolume").unwrap();
        frag.place(Parent::from(&stack), &plate_vol, "plate", Transform::IDENTITY)
            .unwrap();

        geo.merge(frag).unwrap();
        assert_eq!(geo.materials().len(), 3);
        assert!(geo.volumes().contains("brickVolume"));

        let stack = geo.assembly("stack").unwrap();
        geo.place(Parent::World, &stack, "Stack", Transform::IDENTITY).unwrap();
        let doc = geo.finish().unwrap();
        assert_eq!(doc.placement_count(), 2);
    }

    #[test]
    fn merge_is_atomic_on_collision() {
        let mut geo = with_world();
        geo.define_box("plate", 1.0, 1.0, 1.0).unwrap();

        let mut frag = geo.fragment();
        frag.define_box("fresh", 1.0, 1.0, 1.0).unwrap();
        frag.define_box("plate", 2.0, 2.0, 2.0).unwrap();

        let err = geo.merge(frag).unwrap_err();
        assert!(matches!(err, GeometryError::DuplicateName { kind: EntityKind::Solid, .. }));
        assert!(!geo.solids().contains("fresh"));
    }

    #[test]
    fn conflicting_material_is_rejected() {
        let mut geo = with_world();
        geo.resolve_material("Gas", "G4_Ar").unwrap();

        let mut frag = Geometry::default();
        frag.resolve_material("Gas", "G4_Xe").unwrap();
        let err = geo.merge(frag).unwrap_err();
        assert!(matches!(err, GeometryError::DuplicateName { kind: EntityKind::Material, .. }));
    }

    #[test]
    fn two_worlds_cannot_merge() {
        let mut geo = with_world();
        let mut other = Geometry::default();
        let air = other.resolve_material("Air", "G4_AIR").unwrap();
        let b = other.define_box("otherBox", 1.0, 1.0, 1.0).unwrap();
        let w = other.bind("otherWorld", &b, &air).unwrap();
        other.set_world(&w).unwrap();

        let err = geo.merge(other).unwrap_err();
        assert!(matches!(err, GeometryError::WorldAlreadySet(_)));
        assert!(!geo.volumes().contains("otherWorld"));
    }

    #[test]
    fn volumes_and_assemblies_share_one_namespace() {
        let mut geo = with_world();
        let air = geo.material("Air").unwrap();
        let block = geo.define_box("block", 1.0, 1.0, 1.0).unwrap();
        geo.bind("chamber", &block, &air).unwrap();

        let err = geo.begin_assembly("chamber").unwrap_err();
        assert!(matches!(err, GeometryError::DuplicateName { kind: EntityKind::Assembly, .. }));

        geo.begin_assembly("pipe").unwrap();
        let err = geo.bind("pipe", &block, &air).unwrap_err();
        assert!(matches!(err, GeometryError::DuplicateName { kind: EntityKind::Volume, .. }));
        assert!(!geo.volumes().contains("pipe"));
    }

    #[test]
    fn merge_rejects_volume_named_like_an_assembly() {
        let mut geo = with_world();
        geo.begin_assembly("shielding").unwrap();

        let mut frag = geo.fragment();
        let air = frag.material("Air").unwrap();
        let lead = frag.define_box("lead", 1.0, 1.0, 1.0).unwrap();
        frag.bind("shielding", &lead, &air).unwrap();

        let err = geo.merge(frag).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::DuplicateName { kind: EntityKind::Volume, ref name } if name == "shielding"
        ));
        assert!(!geo.solids().contains("lead"));

        let mut frag = geo.fragment();
        frag.begin_assembly("world").unwrap();
        let err = geo.merge(frag).unwrap_err();
        assert!(matches!(err, GeometryError::DuplicateName { kind: EntityKind::Assembly, .. }));
    }
}
