//! Error types for packing sessions.
//!
//! Two classes of failure escape a session, and both are fatal for the build:
//! - Capacity faults: a bounded-width field (pack id, delta depth) or the
//!   entry index ran out of room. Fields are never silently truncated.
//! - Precondition faults: caller programming errors such as a self-delta, a
//!   malformed identifier, or a position that does not name an entry.
//!
//! Lookup misses are `Option::None`, not errors. Delta cycles and chains that
//! exceed the configured depth are resolved inside the base selector and
//! never surface here.

use std::fmt;

/// Which bounded resource a capacity fault refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapacityKind {
    /// Source-pack id space (14 bits).
    PackIds,
    /// Delta depth field (12 bits).
    Depth,
    /// Entry index / arena positions.
    Index,
}

impl fmt::Display for CapacityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PackIds => "source pack ids",
            Self::Depth => "delta depth",
            Self::Index => "entry index",
        };
        f.write_str(name)
    }
}

/// Errors raised by packing-session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PackingError {
    /// A bounded field or table would overflow.
    CapacityExceeded {
        kind: CapacityKind,
        limit: u64,
        observed: u64,
    },
    /// An entry was proposed as its own delta base.
    SelfDelta { pos: u32 },
    /// Identifier bytes have a width other than 20 or 32.
    InvalidOidLength { len: usize },
    /// Identifier hex rendering contains a non-hex character.
    InvalidOidHex,
    /// Identifier width does not match the session's object format.
    OidFormatMismatch { got: u8, expected: u8 },
    /// Position does not name an entry of this session.
    PositionOutOfRange { pos: u32, len: u32 },
    /// Raw object type tag is not a known kind.
    InvalidKind { raw: u8 },
    /// Pack id was not handed out by this session's registry.
    UnknownPack { pack_id: u16 },
}

impl PackingError {
    /// Builds a capacity fault.
    #[inline]
    pub const fn capacity(kind: CapacityKind, limit: u64, observed: u64) -> Self {
        Self::CapacityExceeded {
            kind,
            limit,
            observed,
        }
    }

    /// True for size-limit failures.
    #[must_use]
    pub const fn is_capacity(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. })
    }

    /// True for caller programming errors.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        !self.is_capacity()
    }
}

impl fmt::Display for PackingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                kind,
                limit,
                observed,
            } => write!(
                f,
                "capacity exceeded for {kind}: {observed} (limit: {limit})"
            ),
            Self::SelfDelta { pos } => write!(f, "entry {pos} proposed as its own delta base"),
            Self::InvalidOidLength { len } => {
                write!(f, "invalid object id length: {len} (expected 20 or 32)")
            }
            Self::InvalidOidHex => write!(f, "object id is not valid hex"),
            Self::OidFormatMismatch { got, expected } => write!(
                f,
                "object id length {got} doesn't match session format length {expected}"
            ),
            Self::PositionOutOfRange { pos, len } => {
                write!(f, "entry position {pos} out of range (len {len})")
            }
            Self::InvalidKind { raw } => write!(f, "invalid object type tag: {raw}"),
            Self::UnknownPack { pack_id } => write!(f, "unknown source pack id: {pack_id}"),
        }
    }
}

impl std::error::Error for PackingError {}
