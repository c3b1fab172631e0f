//! Radial replication of a pattern solid around an axis.

use gdmlkit_ir::Transform;

use crate::axis::Axis;
use crate::error::{EntityKind, GeometryError, Result};
use crate::refs::SolidRef;
use crate::solids::SolidRegistry;

/// Angles (degrees) at which pattern copies are placed.
#[derive(Debug, Clone, PartialEq)]
pub enum Angles {
    /// `count` copies spread over the full circle.
    Uniform(usize),
    /// `count` copies at `0, step, 2·step, ...`. The copies need not cover
    /// the full circle.
    Stepped {
        /// Number of copies.
        count: usize,
        /// Angular step in degrees.
        step: f64,
    },
    /// Copies at exactly these angles.
    Explicit(Vec<f64>),
}

impl Angles {
    /// Number of copies.
    pub fn count(&self) -> usize {
        match self {
            Angles::Uniform(count) | Angles::Stepped { count, .. } => *count,
            Angles::Explicit(angles) => angles.len(),
        }
    }

    /// Copy angles in placement order.
    pub fn degrees(&self) -> Vec<f64> {
        match self {
            Angles::Uniform(count) => {
                let step = 360.0 / *count as f64;
                (0..*count).map(|i| i as f64 * step).collect()
            }
            Angles::Stepped { count, step } => (0..*count).map(|i| i as f64 * step).collect(),
            Angles::Explicit(angles) => angles.clone(),
        }
    }
}

/// Layout of a radial pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialPattern {
    /// Copy angles.
    pub angles: Angles,
    /// Rotation axis.
    pub axis: Axis,
    /// Stem of the intermediate union names, if not the pattern's name.
    pub copy_prefix: Option<String>,
}

impl RadialPattern {
    /// `count` copies evenly spaced around Z.
    pub fn uniform(count: usize) -> Self {
        Self {
            angles: Angles::Uniform(count),
            axis: Axis::Z,
            copy_prefix: None,
        }
    }

    /// `count` copies `step` degrees apart around Z.
    pub fn stepped(count: usize, step: f64) -> Self {
        Self {
            angles: Angles::Stepped { count, step },
            axis: Axis::Z,
            copy_prefix: None,
        }
    }

    /// Copies at explicit angles around Z.
    pub fn explicit(angles: Vec<f64>) -> Self {
        Self {
            angles: Angles::Explicit(angles),
            axis: Axis::Z,
            copy_prefix: None,
        }
    }

    /// Rotate about `axis` instead of Z.
    pub fn about(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    /// Name the intermediate unions `{prefix}Aux{i}`.
    pub fn copies_named(mut self, prefix: impl Into<String>) -> Self {
        self.copy_prefix = Some(prefix.into());
        self
    }
}

impl SolidRegistry {
    /// Union rotated copies of `pattern` onto `base`, then the optional `hub`.
    ///
    /// Copy `i` is registered as `{name}Aux{i}` (or under the layout's copy
    /// prefix); the final solid is `{name}`.
    /// Without a hub the last copy's union carries the final name. Nothing is
    /// registered on failure.
    pub fn define_radial(
        &mut self,
        name: impl Into<String>,
        base: &SolidRef,
        pattern: &SolidRef,
        layout: &RadialPattern,
        hub: Option<&SolidRef>,
    ) -> Result<SolidRef> {
        let name = name.into();
        let angles = layout.angles.degrees();
        if angles.is_empty() {
            return Err(GeometryError::InvalidReplicationCount(0));
        }

        for operand in [Some(base), Some(pattern), hub].into_iter().flatten() {
            if !self.contains(operand.name()) {
                return Err(GeometryError::unknown(EntityKind::Solid, operand.name()));
            }
        }

        let prefix = layout.copy_prefix.as_deref().unwrap_or(&name);
        let mut names: Vec<String> = (0..angles.len()).map(|i| format!("{prefix}Aux{i}")).collect();
        if hub.is_none() {
            if let Some(last) = names.last_mut() {
                *last = name.clone();
            }
        } else {
            names.push(name.clone());
        }
        self.ensure_free(names.iter().map(String::as_str))?;

        let mut acc = base.clone();
        for (angle, copy_name) in angles.iter().zip(&names) {
            let transform = Transform::rotation(layout.axis.rotation(*angle));
            acc = self.define_union(copy_name.clone(), &acc, pattern, transform)?;
        }
        if let Some(hub) = hub {
            acc = self.define_union(name.clone(), &acc, hub, Transform::IDENTITY)?;
        }

        tracing::debug!(pattern = %name, copies = angles.len(), "defined radial pattern");
        Ok(acc)
    }
}
