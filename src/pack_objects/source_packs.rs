//! Registry of existing packs that candidates may already live in.
//!
//! Objects found in an existing pack can be copied verbatim instead of being
//! recompressed or re-deltified. Each entry records which source pack it came
//! from in a 14-bit field, so a session can reference at most `2^14` distinct
//! packs; registering one more is a capacity fault.
//!
//! Packs are deduplicated by checksum: registering the same pack twice
//! returns the id assigned the first time.

use ahash::AHashMap;
use serde::Serialize;

use super::errors::{CapacityKind, PackingError};
use super::object_id::OidBytes;

/// Width of the source-pack id field inside `ObjectEntry`.
pub const PACK_ID_BITS: u32 = 14;
/// Maximum number of distinct source packs per session.
pub const MAX_SOURCE_PACKS: usize = 1 << PACK_ID_BITS;

/// Dense id of a registered source pack (`0..MAX_SOURCE_PACKS`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PackId(u16);

impl PackId {
    #[inline]
    pub(crate) const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

/// Reference to an externally materialized pack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourcePackRef {
    /// Pack checksum (trailer hash); identity for deduplication.
    pub checksum: OidBytes,
    /// Display name, e.g. `pack-<hex>.pack`.
    pub name: String,
    /// Object count from the pack header.
    pub object_count: u32,
}

/// Where a candidate already lives in a source pack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PackLocation {
    pub pack_id: PackId,
    /// Offset of the entry header.
    pub offset: u64,
    /// Entry header length in bytes.
    pub header_size: u8,
}

/// Bounded table of source packs.
#[derive(Debug, Default)]
pub struct SourcePackRegistry {
    packs: Vec<SourcePackRef>,
    by_checksum: AHashMap<OidBytes, PackId>,
}

impl SourcePackRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pack, returning its id.
    ///
    /// # Errors
    ///
    /// Returns a `PackIds` capacity fault when a new distinct pack would be
    /// the `MAX_SOURCE_PACKS + 1`-th.
    pub fn register_pack(&mut self, pack: SourcePackRef) -> Result<PackId, PackingError> {
        if let Some(&id) = self.by_checksum.get(&pack.checksum) {
            return Ok(id);
        }
        if self.packs.len() >= MAX_SOURCE_PACKS {
            return Err(PackingError::capacity(
                CapacityKind::PackIds,
                MAX_SOURCE_PACKS as u64,
                self.packs.len() as u64 + 1,
            ));
        }
        let id = PackId(self.packs.len() as u16);
        tracing::trace!(pack_id = id.0, name = %pack.name, "registered source pack");
        self.by_checksum.insert(pack.checksum, id);
        self.packs.push(pack);
        Ok(id)
    }

    /// Looks up a registered pack.
    #[must_use]
    pub fn pack(&self, id: PackId) -> Option<&SourcePackRef> {
        self.packs.get(id.0 as usize)
    }

    /// Finds the id of a pack by checksum.
    #[must_use]
    pub fn find(&self, checksum: &OidBytes) -> Option<PackId> {
        self.by_checksum.get(checksum).copied()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.packs.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }

    /// Iterates registered packs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (PackId, &SourcePackRef)> {
        self.packs
            .iter()
            .enumerate()
            .map(|(idx, pack)| (PackId(idx as u16), pack))
    }
}
