//! Hard caps and tunables for a packing session.
//!
//! All limits are explicit. `validate` treats an inconsistent preset as a
//! programmer error and panics; `check` is the fallible form used when
//! limits come from a config document, so an oversized depth surfaces as a
//! capacity fault instead of a panic.

use serde::{Deserialize, Serialize};

use super::entry::MAX_DELTA_DEPTH;
use super::errors::{CapacityKind, PackingError};

/// Limits for one packing session.
///
/// # Layout
/// Fields are ordered for packing (12 bytes total).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackingLimits {
    /// Maximum number of candidate entries in the arena.
    ///
    /// Must stay below `u32::MAX`, which is reserved as the "no entry"
    /// sentinel for delta relations.
    pub max_objects: u32,

    /// Entries reserved up front in the arena and index.
    pub initial_capacity: u32,

    /// Maximum resolved delta chain depth.
    ///
    /// Bases at depth 0 are full objects. Entries whose chain would exceed
    /// this are demoted to full objects by the base selector.
    /// Default: 50.
    pub max_depth: u16,
}

impl PackingLimits {
    /// Defaults for large repositories.
    pub const DEFAULT: Self = Self {
        max_objects: u32::MAX - 1,
        initial_capacity: 1024,
        max_depth: 50,
    };

    /// Small limits for tests and constrained environments.
    pub const RESTRICTIVE: Self = Self {
        max_objects: 1 << 20,
        initial_capacity: 16,
        max_depth: 10,
    };

    /// Validates internal consistency.
    ///
    /// # Panics
    ///
    /// Panics if limits are invalid (indicates a configuration bug).
    #[track_caller]
    pub const fn validate(&self) {
        assert!(self.max_objects > 0, "must allow at least 1 object");
        assert!(
            self.max_objects < u32::MAX,
            "u32::MAX is reserved as the empty-relation sentinel"
        );
        assert!(
            self.initial_capacity <= self.max_objects,
            "initial capacity exceeds max objects"
        );
        assert!(
            self.max_depth <= MAX_DELTA_DEPTH,
            "max depth exceeds the 12-bit depth field"
        );
    }

    /// Fallible validation for limits loaded at runtime.
    ///
    /// # Errors
    ///
    /// Returns a `Depth` capacity fault when `max_depth` cannot be stored in
    /// the entry depth field, and an `Index` capacity fault when
    /// `max_objects` collides with the relation sentinel or is zero.
    pub fn check(&self) -> Result<(), PackingError> {
        if self.max_depth > MAX_DELTA_DEPTH {
            return Err(PackingError::capacity(
                CapacityKind::Depth,
                MAX_DELTA_DEPTH as u64,
                self.max_depth as u64,
            ));
        }
        if self.max_objects == 0 || self.max_objects == u32::MAX {
            return Err(PackingError::capacity(
                CapacityKind::Index,
                (u32::MAX - 1) as u64,
                self.max_objects as u64,
            ));
        }
        Ok(())
    }

    /// Copy with `initial_capacity` clamped to `max_objects`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.initial_capacity = self.initial_capacity.min(self.max_objects);
        self
    }
}

impl Default for PackingLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

const _: () = PackingLimits::DEFAULT.validate();
const _: () = PackingLimits::RESTRICTIVE.validate();
const _: () = assert!(std::mem::size_of::<PackingLimits>() == 12);
