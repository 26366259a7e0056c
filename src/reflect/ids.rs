//! Stable synthetic identifiers for classes and members.
//!
//! Ids are assigned once when a universe is loaded, in canonical name order,
//! so ordering by id is the same as ordering by name and never depends on
//! the order a descriptor happened to list things in.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Position in the owning arena.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Index of a class, interface, enum or annotation type.
    ClassId,
    "class#"
);
arena_id!(
    /// Index of a declared method.
    MethodId,
    "method#"
);
arena_id!(
    /// Index of a declared constructor.
    ConstructorId,
    "ctor#"
);
arena_id!(
    /// Index of a declared field.
    FieldId,
    "field#"
);

/// Identity of a type variable.
///
/// Declared variables live in the universe's variable table; capture
/// variables are minted by the instantiator during wildcard capture and
/// never outlive a single instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeVarId {
    Declared(u32),
    Capture(u32),
}

impl TypeVarId {
    #[must_use]
    pub const fn is_capture(self) -> bool {
        matches!(self, Self::Capture(_))
    }
}

/// A reflective member handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemberId {
    Constructor(ConstructorId),
    Method(MethodId),
    Field(FieldId),
}
