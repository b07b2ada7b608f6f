//! Packing session: entry arena, identifier index, and source-pack table.
//!
//! A session is created once per pack build and owns every candidate entry.
//! Entries are appended to a single `Vec` (geometric growth, amortized O(1))
//! and addressed by `EntryPos`. The index maps identifiers to positions and
//! grows independently by doubling.
//!
//! # Lifetime
//! Sessions only grow: there is no entry removal and no partial teardown.
//! Dropping the session releases the arena, index and registry at once.
//!
//! # Concurrency
//! All mutation takes `&mut self`, so a session has a single writer. Shared
//! `&PackingSession` borrows may be handed to read-only workers (see
//! `scatter`); the borrow checker keeps those borrows from outliving a
//! growth event.

use super::entry::{EntryPos, ObjectEntry};
use super::entry_index::{EntryIndex, IndexStats, Probe};
use super::errors::{CapacityKind, PackingError};
use super::limits::PackingLimits;
use super::object_id::{ObjectFormat, OidBytes};
use super::object_kind::ObjectKind;
use super::perf;
use super::source_packs::{PackId, PackLocation, SourcePackRef, SourcePackRegistry};

/// Owner of all per-build packing state.
#[derive(Debug)]
pub struct PackingSession {
    format: ObjectFormat,
    limits: PackingLimits,
    pub(crate) entries: Vec<ObjectEntry>,
    index: EntryIndex,
    packs: SourcePackRegistry,
}

impl PackingSession {
    /// Creates an empty session.
    ///
    /// # Errors
    ///
    /// Returns a capacity fault if `limits` cannot be represented (see
    /// `PackingLimits::check`).
    pub fn new(format: ObjectFormat, limits: PackingLimits) -> Result<Self, PackingError> {
        limits.check()?;
        let limits = limits.normalized();
        let initial = limits.initial_capacity as usize;
        tracing::debug!(
            ?format,
            max_depth = limits.max_depth,
            initial_capacity = initial,
            "packing session created"
        );
        Ok(Self {
            format,
            limits,
            entries: Vec::with_capacity(initial),
            index: EntryIndex::with_capacity(initial),
            packs: SourcePackRegistry::new(),
        })
    }

    #[inline]
    #[must_use]
    pub const fn format(&self) -> ObjectFormat {
        self.format
    }

    #[inline]
    #[must_use]
    pub const fn limits(&self) -> &PackingLimits {
        &self.limits
    }

    /// Number of registered entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn index_stats(&self) -> IndexStats {
        self.index.stats()
    }

    /// Looks up the position of `oid`.
    #[inline]
    #[must_use]
    pub fn find(&self, oid: &OidBytes) -> Option<EntryPos> {
        if oid.len() != self.format.oid_len() {
            return None;
        }
        self.index.find(oid, &self.entries)
    }

    /// Registers `oid`, returning its position.
    ///
    /// Registration is idempotent: a known identifier returns its existing
    /// position and the arena does not grow.
    ///
    /// # Errors
    ///
    /// - `OidFormatMismatch` if `oid` has the wrong width for this session.
    /// - An `Index` capacity fault once `limits.max_objects` is reached.
    pub fn alloc(&mut self, oid: OidBytes) -> Result<EntryPos, PackingError> {
        let expected = self.format.oid_len();
        if oid.len() != expected {
            return Err(PackingError::OidFormatMismatch {
                got: oid.len(),
                expected,
            });
        }

        let mut probe = self.index.probe(&oid, &self.entries);
        if let Probe::Found(pos) = probe {
            return Ok(pos);
        }

        let len = self.entries.len();
        if len >= self.limits.max_objects as usize {
            return Err(PackingError::capacity(
                CapacityKind::Index,
                self.limits.max_objects as u64,
                len as u64 + 1,
            ));
        }

        if self.index.needs_grow() {
            self.index.grow(&self.entries);
            probe = self.index.probe(&oid, &self.entries);
        }
        let Probe::Vacant { slot } = probe else {
            unreachable!("identifier appeared during grow");
        };

        let pos = EntryPos(len as u32);
        self.entries.push(ObjectEntry::new(oid));
        self.index.insert_at(slot, pos);
        perf::record_entry_alloc();
        Ok(pos)
    }

    /// Registers a raw identifier slice.
    ///
    /// # Errors
    ///
    /// `InvalidOidLength` for malformed slices, plus everything `alloc`
    /// returns.
    pub fn alloc_bytes(&mut self, raw: &[u8]) -> Result<EntryPos, PackingError> {
        let oid = OidBytes::try_from_slice(raw)?;
        self.alloc(oid)
    }

    /// Reserves room for `additional` entries in the arena and index.
    pub fn reserve(&mut self, additional: usize) {
        self.entries.reserve(additional);
        self.index.reserve(additional, &self.entries);
    }

    /// Borrows an entry.
    #[inline]
    #[must_use]
    pub fn get(&self, pos: EntryPos) -> Option<&ObjectEntry> {
        self.entries.get(pos.index())
    }

    /// Mutably borrows an entry.
    #[inline]
    pub fn get_mut(&mut self, pos: EntryPos) -> Option<&mut ObjectEntry> {
        self.entries.get_mut(pos.index())
    }

    /// Borrows an entry, failing with a precondition fault when `pos` is not
    /// a position of this session.
    ///
    /// # Errors
    ///
    /// `PositionOutOfRange` for foreign or stale positions.
    pub fn entry(&self, pos: EntryPos) -> Result<&ObjectEntry, PackingError> {
        let len = self.entries.len() as u32;
        self.entries
            .get(pos.index())
            .ok_or(PackingError::PositionOutOfRange { pos: pos.0, len })
    }

    /// Mutable form of `entry`.
    ///
    /// # Errors
    ///
    /// `PositionOutOfRange` for foreign or stale positions.
    pub fn entry_mut(&mut self, pos: EntryPos) -> Result<&mut ObjectEntry, PackingError> {
        let len = self.entries.len() as u32;
        self.entries
            .get_mut(pos.index())
            .ok_or(PackingError::PositionOutOfRange { pos: pos.0, len })
    }

    /// Iterates entries in registration order.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = (EntryPos, &ObjectEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (EntryPos(idx as u32), entry))
    }

    /// All entries as a slice, indexed by `EntryPos::index`.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[ObjectEntry] {
        &self.entries
    }

    /// Source-pack table.
    #[inline]
    #[must_use]
    pub fn source_packs(&self) -> &SourcePackRegistry {
        &self.packs
    }

    /// Registers a source pack (see `SourcePackRegistry::register_pack`).
    ///
    /// # Errors
    ///
    /// A `PackIds` capacity fault past `MAX_SOURCE_PACKS` distinct packs.
    pub fn register_pack(&mut self, pack: SourcePackRef) -> Result<PackId, PackingError> {
        self.packs.register_pack(pack)
    }

    /// Records that the entry at `pos` already lives in a source pack.
    ///
    /// `in_pack_kind` is the type as stored there. For a stored delta,
    /// `stored_base` names the entry its bytes were built against; the bytes
    /// are only reusable while the entry keeps exactly that base. A stored
    /// delta with an unknown base (`None`) is never reused.
    ///
    /// # Errors
    ///
    /// - `PositionOutOfRange` for an unknown `pos` or `stored_base`.
    /// - `UnknownPack` for an id not issued by this session.
    /// - `InvalidKind` for an `Unset` kind, or a `stored_base` given for a
    ///   whole-object kind.
    /// - `SelfDelta` when `stored_base == pos`.
    pub fn set_in_pack(
        &mut self,
        pos: EntryPos,
        pack: PackId,
        offset: u64,
        header_size: u8,
        in_pack_kind: ObjectKind,
        stored_base: Option<EntryPos>,
    ) -> Result<(), PackingError> {
        if self.packs.pack(pack).is_none() {
            return Err(PackingError::UnknownPack {
                pack_id: pack.get(),
            });
        }
        if in_pack_kind == ObjectKind::Unset {
            return Err(PackingError::InvalidKind {
                raw: in_pack_kind.raw(),
            });
        }
        if let Some(base) = stored_base {
            if !in_pack_kind.is_delta() {
                return Err(PackingError::InvalidKind {
                    raw: in_pack_kind.raw(),
                });
            }
            self.entry(base)?;
            if base == pos {
                return Err(PackingError::SelfDelta { pos: pos.0 });
            }
        }
        let entry = self.entry_mut(pos)?;
        entry.set_in_pack(pack, offset, header_size, stored_base);
        entry.set_in_pack_kind(in_pack_kind);
        Ok(())
    }

    /// Source-pack location of the entry at `pos`, if it has one.
    #[must_use]
    pub fn position_of(&self, pos: EntryPos) -> Option<PackLocation> {
        let entry = self.get(pos)?;
        let pack_id = entry.in_pack_id()?;
        Some(PackLocation {
            pack_id,
            offset: entry.in_pack_offset(),
            header_size: entry.in_pack_header_size(),
        })
    }
}
