//! Object type tags as stored in the 3-bit entry type fields.
//!
//! Discriminants match the pack entry type numbers so a tag read from an
//! existing pack header can be stored without translation. Value 5 is
//! reserved by the pack format and rejected.

use super::errors::PackingError;

/// Width of an object type field inside `ObjectEntry`.
pub const KIND_BITS: u32 = 3;

/// Object type of a packing candidate.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    /// Type not yet known (zero-initialized entry).
    #[default]
    Unset = 0,
    Commit = 1,
    Tree = 2,
    Blob = 3,
    Tag = 4,
    /// Delta whose base is named by pack offset.
    OfsDelta = 6,
    /// Delta whose base is named by object id.
    RefDelta = 7,
}

impl ObjectKind {
    /// Decodes a raw 3-bit tag.
    ///
    /// # Errors
    ///
    /// Returns `PackingError::InvalidKind` for 5 and values wider than
    /// `KIND_BITS`.
    pub const fn from_raw(raw: u8) -> Result<Self, PackingError> {
        match raw {
            0 => Ok(Self::Unset),
            1 => Ok(Self::Commit),
            2 => Ok(Self::Tree),
            3 => Ok(Self::Blob),
            4 => Ok(Self::Tag),
            6 => Ok(Self::OfsDelta),
            7 => Ok(Self::RefDelta),
            _ => Err(PackingError::InvalidKind { raw }),
        }
    }

    /// Raw tag value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// True for the two delta encodings.
    #[inline]
    #[must_use]
    pub const fn is_delta(self) -> bool {
        matches!(self, Self::OfsDelta | Self::RefDelta)
    }
}
