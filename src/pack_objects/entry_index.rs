//! Identifier -> arena position index.
//!
//! Open addressing with linear probing over a power-of-two table. Slots hold
//! only a `u32` arena position, never the identifier itself; a probe compares
//! against the entry stored in the arena. Index memory therefore stays at
//! four bytes per slot regardless of identifier width.
//!
//! # Invariants
//! - Table size is a power of two and `mask = len - 1`.
//! - Empty slots hold `NONE_U32`.
//! - `len * LOAD_FACTOR_DEN <= capacity * LOAD_FACTOR_NUM`; inserting past
//!   that doubles the table and rehashes every position.
//! - There is no deletion; positions live as long as the session.

use ahash::RandomState;
use serde::Serialize;

use super::entry::{EntryPos, ObjectEntry, NONE_U32};
use super::object_id::OidBytes;
use super::perf;

/// Load factor numerator (7/10).
const LOAD_FACTOR_NUM: usize = 7;
/// Load factor denominator.
const LOAD_FACTOR_DEN: usize = 10;
/// Smallest table allocated.
const MIN_TABLE_SIZE: usize = 16;
/// Fixed hasher keys, so slot layout is reproducible across runs.
const HASH_SEEDS: [u64; 4] = [
    0x7061_636b_5f69_6478,
    0x0000_0000_5f6f_6964,
    0x9e37_79b9_7f4a_7c15,
    0x243f_6a88_85a3_08d3,
];

/// Occupancy snapshot for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub len: u32,
    pub capacity: usize,
    /// Number of grow-and-rehash events since creation.
    pub grows: u32,
}

/// Result of probing for an identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Probe {
    /// Identifier present at this position.
    Found(EntryPos),
    /// Identifier absent; `slot` is where it would be inserted.
    Vacant { slot: usize },
}

/// Growable position table keyed by object identifier.
#[derive(Debug)]
pub struct EntryIndex {
    slots: Vec<u32>,
    mask: usize,
    len: u32,
    grows: u32,
    hasher: RandomState,
}

impl EntryIndex {
    /// Creates an index sized for `expected` entries without growth.
    #[must_use]
    pub fn with_capacity(expected: usize) -> Self {
        let size = table_size_for_count(expected);
        Self {
            slots: vec![NONE_U32; size],
            mask: size - 1,
            len: 0,
            grows: 0,
            hasher: RandomState::with_seeds(
                HASH_SEEDS[0],
                HASH_SEEDS[1],
                HASH_SEEDS[2],
                HASH_SEEDS[3],
            ),
        }
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Underlying table size (power of two).
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            len: self.len,
            capacity: self.slots.len(),
            grows: self.grows,
        }
    }

    /// Looks up the arena position of `oid`.
    #[inline]
    #[must_use]
    pub fn find(&self, oid: &OidBytes, entries: &[ObjectEntry]) -> Option<EntryPos> {
        match self.probe(oid, entries) {
            Probe::Found(pos) => Some(pos),
            Probe::Vacant { .. } => None,
        }
    }

    /// First slot probed for `oid`.
    #[inline]
    fn home_slot(&self, oid: &OidBytes) -> usize {
        (self.hasher.hash_one(oid.as_slice()) as usize) & self.mask
    }

    pub(crate) fn probe(&self, oid: &OidBytes, entries: &[ObjectEntry]) -> Probe {
        let mut slot = self.home_slot(oid);
        // Load factor < 1 guarantees an empty slot terminates the loop.
        loop {
            perf::record_index_probe();
            let value = self.slots[slot];
            if value == NONE_U32 {
                return Probe::Vacant { slot };
            }
            if entries[value as usize].oid() == oid {
                return Probe::Found(EntryPos(value));
            }
            slot = (slot + 1) & self.mask;
        }
    }

    /// True if one more insert would cross the load factor.
    #[inline]
    pub(crate) fn needs_grow(&self) -> bool {
        (self.len as usize + 1) * LOAD_FACTOR_DEN > self.slots.len() * LOAD_FACTOR_NUM
    }

    /// Stores `pos` into a slot previously returned by `probe`.
    ///
    /// The slot must come from a `probe` made after the last `grow`.
    pub(crate) fn insert_at(&mut self, slot: usize, pos: EntryPos) {
        debug_assert_eq!(self.slots[slot], NONE_U32);
        self.slots[slot] = pos.0;
        self.len += 1;
    }

    /// Doubles the table and reinserts every position from `entries`.
    pub(crate) fn grow(&mut self, entries: &[ObjectEntry]) {
        let size = self.slots.len() * 2;
        self.rehash(size, entries);
        self.grows += 1;
        perf::record_index_grow();
        tracing::trace!(capacity = size, len = self.len, "entry index grew");
    }

    /// Ensures room for `additional` more entries without an intermediate grow.
    pub(crate) fn reserve(&mut self, additional: usize, entries: &[ObjectEntry]) {
        let wanted = table_size_for_count(self.len as usize + additional);
        if wanted > self.slots.len() {
            self.rehash(wanted, entries);
            self.grows += 1;
            perf::record_index_grow();
        }
    }

    fn rehash(&mut self, size: usize, entries: &[ObjectEntry]) {
        debug_assert!(size.is_power_of_two());
        self.slots.clear();
        self.slots.resize(size, NONE_U32);
        self.mask = size - 1;
        for (idx, entry) in entries.iter().enumerate() {
            let mut slot = self.home_slot(entry.oid());
            while self.slots[slot] != NONE_U32 {
                slot = (slot + 1) & self.mask;
            }
            self.slots[slot] = idx as u32;
        }
        debug_assert_eq!(self.len as usize, entries.len());
    }
}

fn table_size_for_count(count: usize) -> usize {
    let min_capacity = count
        .saturating_mul(LOAD_FACTOR_DEN)
        .div_ceil(LOAD_FACTOR_NUM)
        .saturating_add(1);
    min_capacity.max(MIN_TABLE_SIZE).next_power_of_two()
}
