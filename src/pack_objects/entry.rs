//! Per-candidate object entry.
//!
//! One `ObjectEntry` exists per candidate object, so its size sets the memory
//! cost of packing a repository with tens of millions of objects. Small
//! fields share a single `u64` word; delta relations are `u32` arena
//! positions rather than references.
//!
//! # Packed word layout (`bits`)
//! | bits    | field          | width |
//! |---------|----------------|-------|
//! | 0..14   | in-pack id     | 14    |
//! | 14..17  | kind           | 3     |
//! | 17..20  | in-pack kind   | 3     |
//! | 20..25  | flags          | 5     |
//! | 25..27  | dfs state      | 2     |
//! | 27..39  | depth          | 12    |
//!
//! # Invariants
//! - Relation fields hold `NONE_U32` or a position inside the owning arena.
//! - `delta` never names the entry itself.
//! - Every packed field is range-checked on write; overflow is a capacity
//!   fault, never a truncation.

use serde::Serialize;

use super::errors::{CapacityKind, PackingError};
use super::object_id::OidBytes;
use super::object_kind::{ObjectKind, KIND_BITS};
use super::source_packs::{PackId, PACK_ID_BITS};

/// Sentinel for an absent relation.
pub const NONE_U32: u32 = u32::MAX;

/// Width of the resolved depth field.
pub const DEPTH_BITS: u32 = 12;
/// Largest representable delta depth.
pub const MAX_DELTA_DEPTH: u16 = (1 << DEPTH_BITS) - 1;
/// Width of the traversal marker.
pub const DFS_STATE_BITS: u32 = 2;

const PACK_SHIFT: u32 = 0;
const KIND_SHIFT: u32 = PACK_SHIFT + PACK_ID_BITS;
const IN_PACK_KIND_SHIFT: u32 = KIND_SHIFT + KIND_BITS;
const FLAG_SHIFT: u32 = IN_PACK_KIND_SHIFT + KIND_BITS;
const DFS_SHIFT: u32 = FLAG_SHIFT + 5;
const DEPTH_SHIFT: u32 = DFS_SHIFT + DFS_STATE_BITS;

const FLAG_PREFERRED_BASE: u64 = 1 << FLAG_SHIFT;
const FLAG_NO_TRY_DELTA: u64 = 1 << (FLAG_SHIFT + 1);
const FLAG_TAGGED: u64 = 1 << (FLAG_SHIFT + 2);
const FLAG_FILLED: u64 = 1 << (FLAG_SHIFT + 3);
const FLAG_IN_PACK: u64 = 1 << (FLAG_SHIFT + 4);

const _: () = assert!(DEPTH_SHIFT + DEPTH_BITS <= 64);

#[inline]
const fn mask(width: u32) -> u64 {
    (1u64 << width) - 1
}

/// Stable arena position of an entry.
///
/// Positions stay valid for the whole session even when the arena
/// reallocates; references obtained from a position do not.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryPos(pub u32);

impl EntryPos {
    /// Position as a slice index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) const fn from_raw(raw: u32) -> Option<Self> {
        if raw == NONE_U32 {
            None
        } else {
            Some(Self(raw))
        }
    }
}

/// Traversal marker used by the base selector.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DfsState {
    #[default]
    None = 0,
    Active = 1,
    Done = 2,
}

/// Delta bytes computed by an external worker, cached on the entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeltaPayload {
    /// Uncompressed delta size.
    pub size: u64,
    /// Compressed delta size, 0 if not yet compressed.
    pub z_size: u64,
    /// Delta instruction bytes, if the worker kept them.
    pub data: Option<Box<[u8]>>,
}

/// Packing candidate.
#[derive(Clone, Debug)]
pub struct ObjectEntry {
    oid: OidBytes,
    in_pack_header_size: u8,
    name_hash: u32,
    pub(crate) delta: u32,
    pub(crate) delta_child: u32,
    pub(crate) delta_sibling: u32,
    in_pack_base: u32,
    size: u64,
    in_pack_offset: u64,
    bits: u64,
    delta_payload: Option<Box<DeltaPayload>>,
}

const _: () = assert!(std::mem::size_of::<ObjectEntry>() <= 96);

impl ObjectEntry {
    /// Zero-initialized entry for `oid` with no relations.
    #[must_use]
    pub fn new(oid: OidBytes) -> Self {
        Self {
            oid,
            in_pack_header_size: 0,
            name_hash: 0,
            delta: NONE_U32,
            delta_child: NONE_U32,
            delta_sibling: NONE_U32,
            in_pack_base: NONE_U32,
            size: 0,
            in_pack_offset: 0,
            bits: 0,
            delta_payload: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn oid(&self) -> &OidBytes {
        &self.oid
    }

    /// Uncompressed object size.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    /// Name-hint hash (see `pack_name_hash`).
    #[inline]
    #[must_use]
    pub const fn name_hash(&self) -> u32 {
        self.name_hash
    }

    #[inline]
    pub fn set_name_hash(&mut self, hash: u32) {
        self.name_hash = hash;
    }

    /// Proposed or resolved delta base.
    #[inline]
    #[must_use]
    pub const fn delta_base(&self) -> Option<EntryPos> {
        EntryPos::from_raw(self.delta)
    }

    /// Final object type.
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        self.raw_kind(KIND_SHIFT)
    }

    /// Sets the final object type.
    ///
    /// # Errors
    ///
    /// Returns `PackingError::InvalidKind` for delta kinds: a final type is
    /// always a real object type.
    pub fn set_kind(&mut self, kind: ObjectKind) -> Result<(), PackingError> {
        if kind.is_delta() {
            return Err(PackingError::InvalidKind { raw: kind.raw() });
        }
        self.put(KIND_SHIFT, KIND_BITS, kind.raw() as u64);
        Ok(())
    }

    /// Type as stored in the source pack (may be a delta kind).
    #[must_use]
    pub fn in_pack_kind(&self) -> ObjectKind {
        self.raw_kind(IN_PACK_KIND_SHIFT)
    }

    pub(crate) fn set_in_pack_kind(&mut self, kind: ObjectKind) {
        self.put(IN_PACK_KIND_SHIFT, KIND_BITS, kind.raw() as u64);
    }

    fn raw_kind(&self, shift: u32) -> ObjectKind {
        let raw = self.get(shift, KIND_BITS) as u8;
        // Only validated kinds are ever stored.
        ObjectKind::from_raw(raw).unwrap_or_default()
    }

    /// Source pack holding this object, if any.
    #[must_use]
    pub fn in_pack_id(&self) -> Option<PackId> {
        if self.bits & FLAG_IN_PACK == 0 {
            return None;
        }
        Some(PackId::from_raw(self.get(PACK_SHIFT, PACK_ID_BITS) as u16))
    }

    /// Offset of the entry header within its source pack.
    #[inline]
    #[must_use]
    pub const fn in_pack_offset(&self) -> u64 {
        self.in_pack_offset
    }

    /// Header size of the entry within its source pack.
    #[inline]
    #[must_use]
    pub const fn in_pack_header_size(&self) -> u8 {
        self.in_pack_header_size
    }

    /// Base the stored delta was built against, when known.
    ///
    /// Always `None` for entries stored whole.
    #[inline]
    #[must_use]
    pub const fn in_pack_base(&self) -> Option<EntryPos> {
        EntryPos::from_raw(self.in_pack_base)
    }

    pub(crate) fn set_in_pack(
        &mut self,
        pack: PackId,
        offset: u64,
        header_size: u8,
        stored_base: Option<EntryPos>,
    ) {
        debug_assert!((pack.get() as u64) <= mask(PACK_ID_BITS));
        self.put(PACK_SHIFT, PACK_ID_BITS, pack.get() as u64);
        self.bits |= FLAG_IN_PACK;
        self.in_pack_offset = offset;
        self.in_pack_header_size = header_size;
        self.in_pack_base = stored_base.map_or(NONE_U32, |base| base.0);
    }

    /// Usable as a base but never written to the output pack.
    #[inline]
    #[must_use]
    pub const fn is_preferred_base(&self) -> bool {
        self.bits & FLAG_PREFERRED_BASE != 0
    }

    #[inline]
    pub fn set_preferred_base(&mut self, on: bool) {
        self.set_flag(FLAG_PREFERRED_BASE, on);
    }

    /// Excluded from delta search as a target.
    #[inline]
    #[must_use]
    pub const fn no_try_delta(&self) -> bool {
        self.bits & FLAG_NO_TRY_DELTA != 0
    }

    #[inline]
    pub fn set_no_try_delta(&mut self, on: bool) {
        self.set_flag(FLAG_NO_TRY_DELTA, on);
    }

    /// Near a ref tip; written early.
    #[inline]
    #[must_use]
    pub const fn is_tagged(&self) -> bool {
        self.bits & FLAG_TAGGED != 0
    }

    #[inline]
    pub fn set_tagged(&mut self, on: bool) {
        self.set_flag(FLAG_TAGGED, on);
    }

    /// Write order already assigned.
    #[inline]
    #[must_use]
    pub const fn is_filled(&self) -> bool {
        self.bits & FLAG_FILLED != 0
    }

    #[inline]
    pub(crate) fn set_filled(&mut self, on: bool) {
        self.set_flag(FLAG_FILLED, on);
    }

    #[must_use]
    pub fn dfs_state(&self) -> DfsState {
        match self.get(DFS_SHIFT, DFS_STATE_BITS) {
            0 => DfsState::None,
            1 => DfsState::Active,
            _ => DfsState::Done,
        }
    }

    #[inline]
    pub(crate) fn set_dfs_state(&mut self, state: DfsState) {
        self.put(DFS_SHIFT, DFS_STATE_BITS, state as u64);
    }

    /// Resolved delta depth (0 for full objects).
    #[must_use]
    pub fn depth(&self) -> u16 {
        self.get(DEPTH_SHIFT, DEPTH_BITS) as u16
    }

    /// Stores a delta depth.
    ///
    /// # Errors
    ///
    /// Returns a `Depth` capacity fault if `depth` exceeds `MAX_DELTA_DEPTH`.
    pub fn set_depth(&mut self, depth: u32) -> Result<(), PackingError> {
        if depth > MAX_DELTA_DEPTH as u32 {
            return Err(PackingError::capacity(
                CapacityKind::Depth,
                MAX_DELTA_DEPTH as u64,
                depth as u64,
            ));
        }
        self.put(DEPTH_SHIFT, DEPTH_BITS, depth as u64);
        Ok(())
    }

    /// Depth write for values already bounded by validated limits.
    #[inline]
    pub(crate) fn store_depth(&mut self, depth: u16) {
        debug_assert!(depth <= MAX_DELTA_DEPTH);
        self.put(DEPTH_SHIFT, DEPTH_BITS, depth as u64);
    }

    /// Cached delta payload, if a worker supplied one.
    #[inline]
    #[must_use]
    pub fn delta_payload(&self) -> Option<&DeltaPayload> {
        self.delta_payload.as_deref()
    }

    #[inline]
    pub fn set_delta_payload(&mut self, payload: Option<DeltaPayload>) {
        self.delta_payload = payload.map(Box::new);
    }

    #[inline]
    pub(crate) fn take_delta_payload(&mut self) -> Option<DeltaPayload> {
        self.delta_payload.take().map(|payload| *payload)
    }

    #[inline]
    fn get(&self, shift: u32, width: u32) -> u64 {
        (self.bits >> shift) & mask(width)
    }

    #[inline]
    fn put(&mut self, shift: u32, width: u32, value: u64) {
        debug_assert!(value <= mask(width), "packed field overflow");
        self.bits = (self.bits & !(mask(width) << shift)) | ((value & mask(width)) << shift);
    }

    #[inline]
    fn set_flag(&mut self, flag: u64, on: bool) {
        if on {
            self.bits |= flag;
        } else {
            self.bits &= !flag;
        }
    }
}
