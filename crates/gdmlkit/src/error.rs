//! Error types for geometry construction and serialization.

use std::fmt;

use thiserror::Error;

/// Kind of entity a name belongs to. Names are unique per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A solid (primitive or boolean).
    Solid,
    /// A symbolic material.
    Material,
    /// A logical volume.
    Volume,
    /// An assembly.
    Assembly,
    /// A placement inside an assembly or the world.
    Placement,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Solid => "solid",
            EntityKind::Material => "material",
            EntityKind::Volume => "volume",
            EntityKind::Assembly => "assembly",
            EntityKind::Placement => "placement",
        };
        f.write_str(s)
    }
}

/// Errors that can occur while building or serializing a geometry.
///
/// Every variant is fatal for the current construction run.
#[derive(Error, Debug)]
pub enum GeometryError {
    /// A name was already registered for this kind of entity.
    #[error("duplicate {kind} name: {name}")]
    DuplicateName {
        /// Entity kind.
        kind: EntityKind,
        /// Offending name.
        name: String,
    },

    /// A reference names an entity that does not exist (yet).
    #[error("unknown {kind} reference: {name}")]
    UnknownReference {
        /// Entity kind.
        kind: EntityKind,
        /// Unresolved name.
        name: String,
    },

    /// A reference graph would contain a cycle.
    #[error("cyclic {kind} dependency: {}", chain.join(" -> "))]
    CyclicDependency {
        /// Entity kind.
        kind: EntityKind,
        /// Names along the cycle.
        chain: Vec<String>,
    },

    /// The world volume has not been set.
    #[error("world volume has not been set")]
    UnresolvedWorld,

    /// The world volume was already set.
    #[error("world volume already set to {0}")]
    WorldAlreadySet(String),

    /// A radial replication was requested with no copies.
    #[error("invalid replication count: {0}")]
    InvalidReplicationCount(usize),

    /// A catalog identifier is not in the material catalog.
    #[error("unknown material: {0}")]
    UnknownMaterial(String),

    /// An assembly was modified after being placed.
    #[error("assembly {0} is sealed: it has already been placed")]
    SealedAssembly(String),

    /// A chain needs at least two segments to join.
    #[error("chain {0} needs at least two segments")]
    EmptyChain(String),

    /// Malformed material catalog.
    #[error("material catalog error: {0}")]
    Catalog(String),

    /// XML reading or writing failed.
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeometryError {
    /// Create a duplicate-name error.
    pub fn duplicate(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            kind,
            name: name.into(),
        }
    }

    /// Create an unknown-reference error.
    pub fn unknown(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::UnknownReference {
            kind,
            name: name.into(),
        }
    }

    /// Create a cyclic-dependency error.
    pub fn cycle(kind: EntityKind, chain: Vec<String>) -> Self {
        Self::CyclicDependency { kind, chain }
    }

    pub(crate) fn xml(err: impl fmt::Display) -> Self {
        Self::Xml(err.to_string())
    }
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeometryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity() {
        let err = GeometryError::duplicate(EntityKind::Solid, "worldBox");
        assert_eq!(err.to_string(), "duplicate solid name: worldBox");

        let err = GeometryError::unknown(EntityKind::Volume, "gasVolume");
        assert_eq!(err.to_string(), "unknown volume reference: gasVolume");

        let err = GeometryError::cycle(
            EntityKind::Assembly,
            vec!["a".into(), "b".into(), "a".into()],
        );
        assert_eq!(err.to_string(), "cyclic assembly dependency: a -> b -> a");
    }
}
