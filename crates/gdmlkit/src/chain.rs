//! Chain placement: stacking solids flush along the Z axis.
//!
//! Segment `i` is centred at `z_i = z_{i-1} + (L_{i-1} + L_i) / 2`, with the
//! first segment at the origin, so consecutive segments touch without gap or
//! overlap. Only axial lengths matter: tubes and transition cones of any
//! radius chain the same way.

use gdmlkit_ir::Transform;

use crate::error::{GeometryError, Result};
use crate::refs::SolidRef;
use crate::solids::SolidRegistry;

/// Centre offsets of flush-stacked segments of the given lengths.
///
/// The first offset is always 0. An empty input yields an empty output.
pub fn chain_offsets(lengths: &[f64]) -> Vec<f64> {
    let mut offsets = Vec::with_capacity(lengths.len());
    let mut z = 0.0;
    for (i, &len) in lengths.iter().enumerate() {
        if i > 0 {
            z += (lengths[i - 1] + len) / 2.0;
        }
        offsets.push(z);
    }
    offsets
}

/// A chain of solids unioned into one solid.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    /// The final union.
    pub solid: SolidRef,
    /// Axial length of each segment.
    pub lengths: Vec<f64>,
    /// Centre offset of each segment in the first segment's frame.
    pub offsets: Vec<f64>,
}

impl Chain {
    /// Total axial length of the chain.
    pub fn total_length(&self) -> f64 {
        self.lengths.iter().sum()
    }

    /// Offset of the far end of the last segment from the first segment's centre.
    pub fn far_end(&self) -> f64 {
        match (self.offsets.last(), self.lengths.last()) {
            (Some(offset), Some(len)) => offset + len / 2.0,
            _ => 0.0,
        }
    }
}

impl SolidRegistry {
    /// Union `segments` flush along Z into a solid named `name`.
    ///
    /// Segment `i` (from the second on) is joined at its chain offset.
    /// Intermediate unions are named `{name}Aux{i}`. Nothing is registered
    /// unless the whole chain can be.
    pub fn define_chain(&mut self, name: impl Into<String>, segments: &[SolidRef]) -> Result<Chain> {
        let name = name.into();
        if segments.len() < 2 {
            return Err(GeometryError::EmptyChain(name));
        }

        let lengths = segments
            .iter()
            .map(|segment| self.axial_length(segment))
            .collect::<Result<Vec<_>>>()?;
        let offsets = chain_offsets(&lengths);

        let last = segments.len() - 1;
        let names: Vec<String> = (1..=last)
            .map(|i| {
                if i == last {
                    name.clone()
                } else {
                    format!("{name}Aux{i}")
                }
            })
            .collect();
        self.ensure_free(names.iter().map(String::as_str))?;

        let mut acc = segments[0].clone();
        for (i, segment) in segments.iter().enumerate().skip(1) {
            acc = self.define_union(
                names[i - 1].clone(),
                &acc,
                segment,
                Transform::along_z(offsets[i]),
            )?;
        }

        tracing::debug!(chain = %name, segments = segments.len(), "defined chain");
        Ok(Chain {
            solid: acc,
            lengths,
            offsets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn offsets_accumulate_half_lengths_exactly() {
        let lengths = [14.0, 327.0, 132.0, 18.0];
        let offsets = chain_offsets(&lengths);
        assert_eq!(offsets[0], 0.0);
        for i in 1..lengths.len() {
            assert_eq!(offsets[i] - offsets[i - 1], (lengths[i - 1] + lengths[i]) / 2.0);
        }
        assert_eq!(offsets, [0.0, 170.5, 400.0, 475.0]);
    }

    #[test]
    fn single_and_empty_chains() {
        assert_eq!(chain_offsets(&[42.0]), [0.0]);
        assert!(chain_offsets(&[]).is_empty());
    }

    #[test]
    fn tapered_lengths() {
        let lengths = [179.35, 21.65, 160.28, 14.72, 106.0, 9.0];
        let offsets = chain_offsets(&lengths);
        for i in 1..lengths.len() {
            assert_relative_eq!(
                offsets[i] - offsets[i - 1],
                (lengths[i - 1] + lengths[i]) / 2.0,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn define_chain_joins_later_segments() {
        let mut solids = SolidRegistry::new();
        let flange = solids.define_tube("flange", 67.0, 14.0).unwrap();
        let section1 = solids.define_tube("section1", 46.0, 327.0).unwrap();
        let section2 = solids.define_tube("section2", 54.0, 132.0).unwrap();

        let chain = solids
            .define_chain("pipe", &[flange, section1, section2])
            .unwrap();

        assert_eq!(chain.solid.name(), "pipe");
        assert!(solids.contains("pipeAux1"));
        assert_eq!(chain.offsets, [0.0, 170.5, 400.0]);
        assert_eq!(chain.total_length(), 473.0);
        assert_eq!(chain.far_end(), 466.0);

        let members = solids.flatten_union(&chain.solid).unwrap();
        assert_eq!(members.len(), 3);
        assert!(members[0].1.is_identity());
        assert_eq!(members[1].1, Transform::along_z(170.5));
        assert_eq!(members[2].1, Transform::along_z(400.0));
    }

    #[test]
    fn chain_is_atomic() {
        let mut solids = SolidRegistry::new();
        let a = solids.define_tube("a", 1.0, 2.0).unwrap();
        let b = solids.define_tube("b", 1.0, 2.0).unwrap();
        let c = solids.define_tube("c", 1.0, 2.0).unwrap();
        solids.define_box("pipe", 1.0, 1.0, 1.0).unwrap();

        let err = solids.define_chain("pipe", &[a, b, c]).unwrap_err();
        assert!(matches!(err, GeometryError::DuplicateName { .. }));
        assert!(!solids.contains("pipeAux1"));
        assert_eq!(solids.len(), 4);
    }

    #[test]
    fn chain_needs_two_segments() {
        let mut solids = SolidRegistry::new();
        let a = solids.define_tube("a", 1.0, 2.0).unwrap();
        let err = solids.define_chain("solo", &[a]).unwrap_err();
        assert!(matches!(err, GeometryError::EmptyChain(ref n) if n == "solo"));
    }
}
