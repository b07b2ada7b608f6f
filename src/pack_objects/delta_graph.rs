//! Delta relationship graph over arena positions.
//!
//! Each entry stores three non-owning relations:
//! - `delta`: the base this entry deltas against.
//! - `delta_child`: head of the list of entries using this entry as base.
//! - `delta_sibling`: next entry in the same base's child list.
//!
//! # Invariants
//! - An entry appears in `B`'s child list iff its `delta` field names `B`,
//!   and it appears there exactly once.
//! - `delta` never names the entry itself.
//!
//! # Complexity
//! - `set_delta` on a base-less entry is O(1) (prepend).
//! - Unlinking (`clear_delta`, `reparent`) is O(k) in the old sibling list.

use super::entry::{EntryPos, ObjectEntry, NONE_U32};
use super::errors::PackingError;
use super::packing_data::PackingSession;
use super::perf;

/// Lazy iterator over the entries that delta against one base.
///
/// The walk is finite and borrows the session immutably. Clone before
/// advancing, or call `children_of` again, to walk the list a second time.
#[derive(Clone, Debug)]
pub struct DeltaChildren<'a> {
    entries: &'a [ObjectEntry],
    next: u32,
}

impl Iterator for DeltaChildren<'_> {
    type Item = EntryPos;

    #[inline]
    fn next(&mut self) -> Option<EntryPos> {
        let pos = EntryPos::from_raw(self.next)?;
        self.next = self.entries[pos.index()].delta_sibling;
        Some(pos)
    }
}

impl PackingSession {
    /// Proposes `base` as the delta base of `entry`.
    ///
    /// If `entry` already has a base it is unlinked from that base first, so
    /// this doubles as `reparent`.
    ///
    /// # Errors
    ///
    /// `SelfDelta` when `entry == base`, `PositionOutOfRange` for unknown
    /// positions.
    pub fn set_delta(&mut self, entry: EntryPos, base: EntryPos) -> Result<(), PackingError> {
        self.check_pos(entry)?;
        self.check_pos(base)?;
        if entry == base {
            return Err(PackingError::SelfDelta { pos: entry.0 });
        }
        if self.entries[entry.index()].delta != NONE_U32 {
            self.unlink(entry);
        }
        self.link(entry, base);
        Ok(())
    }

    /// Moves `entry` from its current base (if any) to `new_base`.
    ///
    /// # Errors
    ///
    /// Same as `set_delta`.
    pub fn reparent(&mut self, entry: EntryPos, new_base: EntryPos) -> Result<(), PackingError> {
        self.set_delta(entry, new_base)
    }

    /// Drops the proposed base of `entry`, if any.
    ///
    /// # Errors
    ///
    /// `PositionOutOfRange` for an unknown position.
    pub fn clear_delta(&mut self, entry: EntryPos) -> Result<(), PackingError> {
        self.check_pos(entry)?;
        if self.entries[entry.index()].delta != NONE_U32 {
            self.unlink(entry);
        }
        Ok(())
    }

    /// Base of `entry`, if one is set.
    #[inline]
    #[must_use]
    pub fn delta_base(&self, entry: EntryPos) -> Option<EntryPos> {
        self.get(entry)?.delta_base()
    }

    /// Entries that delta against `base`, most recently linked first.
    ///
    /// Unknown positions yield an empty sequence.
    #[must_use]
    pub fn children_of(&self, base: EntryPos) -> DeltaChildren<'_> {
        let next = self
            .get(base)
            .map_or(NONE_U32, |entry| entry.delta_child);
        DeltaChildren {
            entries: &self.entries,
            next,
        }
    }

    #[inline]
    fn check_pos(&self, pos: EntryPos) -> Result<(), PackingError> {
        self.entry(pos).map(|_| ())
    }

    /// Prepends `entry` to `base`'s child list. `entry` must be unlinked.
    pub(crate) fn link(&mut self, entry: EntryPos, base: EntryPos) {
        debug_assert_ne!(entry, base);
        debug_assert_eq!(self.entries[entry.index()].delta, NONE_U32);
        let head = self.entries[base.index()].delta_child;
        let e = &mut self.entries[entry.index()];
        e.delta = base.0;
        e.delta_sibling = head;
        self.entries[base.index()].delta_child = entry.0;
    }

    /// Removes `entry` from its base's child list and clears its base.
    pub(crate) fn unlink(&mut self, entry: EntryPos) {
        let base = self.entries[entry.index()].delta;
        debug_assert_ne!(base, NONE_U32, "unlink of base-less entry");
        let after = self.entries[entry.index()].delta_sibling;

        let mut hops = 0u64;
        let head = self.entries[base as usize].delta_child;
        if head == entry.0 {
            self.entries[base as usize].delta_child = after;
        } else {
            let mut cur = head;
            while cur != NONE_U32 {
                hops += 1;
                let next = self.entries[cur as usize].delta_sibling;
                if next == entry.0 {
                    self.entries[cur as usize].delta_sibling = after;
                    break;
                }
                cur = next;
            }
            debug_assert_ne!(cur, NONE_U32, "entry missing from its base's child list");
        }
        perf::record_child_unlink(hops);

        let e = &mut self.entries[entry.index()];
        e.delta = NONE_U32;
        e.delta_sibling = NONE_U32;
    }
}
