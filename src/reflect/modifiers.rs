//! JVM access and property modifier bits, with the per-member-kind masks the
//! visibility predicates apply before testing a bit.

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use crate::core::errors::{OpfError, Result};

/// Modifier bit set, using the class-file encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modifiers(u16);

impl Modifiers {
    pub const NONE: Self = Self(0);
    pub const PUBLIC: Self = Self(0x0001);
    pub const PRIVATE: Self = Self(0x0002);
    pub const PROTECTED: Self = Self(0x0004);
    pub const STATIC: Self = Self(0x0008);
    pub const FINAL: Self = Self(0x0010);
    pub const SYNCHRONIZED: Self = Self(0x0020);
    pub const VOLATILE: Self = Self(0x0040);
    pub const TRANSIENT: Self = Self(0x0080);
    pub const NATIVE: Self = Self(0x0100);
    pub const INTERFACE: Self = Self(0x0200);
    pub const ABSTRACT: Self = Self(0x0400);
    pub const STRICT: Self = Self(0x0800);

    /// Legal modifiers on a class declaration.
    pub const CLASS_MASK: Self = Self(0x0001 | 0x0004 | 0x0002 | 0x0400 | 0x0008 | 0x0010 | 0x0800);
    /// Legal modifiers on an interface declaration.
    pub const INTERFACE_MASK: Self = Self(0x0001 | 0x0004 | 0x0002 | 0x0400 | 0x0008 | 0x0800);
    /// Legal modifiers on a constructor.
    pub const CONSTRUCTOR_MASK: Self = Self(0x0001 | 0x0004 | 0x0002);
    /// Legal modifiers on a method.
    pub const METHOD_MASK: Self =
        Self(0x0001 | 0x0004 | 0x0002 | 0x0400 | 0x0008 | 0x0010 | 0x0020 | 0x0100 | 0x0800);
    /// Legal modifiers on a field.
    pub const FIELD_MASK: Self = Self(0x0001 | 0x0004 | 0x0002 | 0x0008 | 0x0010 | 0x0080 | 0x0040);

    const KEYWORDS: [(&'static str, Self); 12] = [
        ("public", Self::PUBLIC),
        ("private", Self::PRIVATE),
        ("protected", Self::PROTECTED),
        ("static", Self::STATIC),
        ("final", Self::FINAL),
        ("synchronized", Self::SYNCHRONIZED),
        ("volatile", Self::VOLATILE),
        ("transient", Self::TRANSIENT),
        ("native", Self::NATIVE),
        ("interface", Self::INTERFACE),
        ("abstract", Self::ABSTRACT),
        ("strictfp", Self::STRICT),
    ];

    /// Raw bit value.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Build from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// True if every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Keep only the bits allowed by `mask`.
    #[must_use]
    pub const fn masked(self, mask: Self) -> Self {
        Self(self.0 & mask.0)
    }

    #[must_use]
    pub const fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    #[must_use]
    pub const fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    #[must_use]
    pub const fn is_protected(self) -> bool {
        self.contains(Self::PROTECTED)
    }

    #[must_use]
    pub const fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    #[must_use]
    pub const fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    #[must_use]
    pub const fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    /// Neither public, protected nor private.
    #[must_use]
    pub const fn is_package_private(self) -> bool {
        self.0 & (Self::PUBLIC.0 | Self::PROTECTED.0 | Self::PRIVATE.0) == 0
    }

    /// Parse descriptor keywords (`["public", "static"]`).
    pub fn from_keywords<S: AsRef<str>>(keywords: &[S]) -> Result<Self> {
        let mut bits = Self::NONE;
        for keyword in keywords {
            let keyword = keyword.as_ref().trim();
            let Some((_, flag)) = Self::KEYWORDS.iter().find(|(name, _)| *name == keyword) else {
                return Err(OpfError::Descriptor {
                    details: format!("unknown modifier {keyword:?}"),
                });
            };
            bits = bits | *flag;
        }
        Ok(bits)
    }
}

impl BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<&str> = Self::KEYWORDS
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect();
        f.write_str(&words.join(" "))
    }
}
