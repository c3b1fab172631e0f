//! Name-keyed references into the registries.
//!
//! A reference is only a lookup key: the registry owning the entity stays
//! the single owner, and a reference never keeps anything alive.

use std::fmt;

macro_rules! name_ref {
    ($(#[$meta:meta])* $ty:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $ty(String);

        impl $ty {
            pub(crate) fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Name of the referenced entity.
            pub fn name(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

name_ref!(
    /// Reference to a solid in a [`crate::SolidRegistry`].
    SolidRef
);
name_ref!(
    /// Reference to a symbolic material in a [`crate::MaterialRegistry`].
    MaterialRef
);
name_ref!(
    /// Reference to a logical volume in a [`crate::VolumeRegistry`].
    VolumeRef
);
name_ref!(
    /// Reference to an assembly in a [`crate::SceneGraph`].
    AssemblyRef
);
