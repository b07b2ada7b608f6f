//! Output order and per-entry decisions for the pack writer.
//!
//! Objects are written so that readers touching recent history find what
//! they need early in the pack:
//! 1. Entries in registration (recency) order up to the first ref tip.
//! 2. Every tagged (ref tip) entry.
//! 3. Remaining commits and tags.
//! 4. Remaining trees.
//! 5. Everything else, one delta family at a time: the root of the family's
//!    chain first, then its descendants depth-first, so a base is written
//!    before the deltas that depend on it.
//!
//! A delta whose base has not been written yet pulls the base chain in
//! ahead of itself, so every written base precedes its deltas. Preferred-base
//! entries are never written. Run `break_delta_chains` first; the walks
//! assume the delta relation is acyclic.

use serde::Serialize;

use super::entry::EntryPos;
use super::object_id::OidBytes;
use super::object_kind::ObjectKind;
use super::packing_data::PackingSession;
use super::source_packs::PackLocation;

/// How an entry is stored in the output pack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Decision {
    /// Whole object.
    Full,
    /// Delta against `base`, `depth` hops from the nearest full object.
    Delta { base: EntryPos, depth: u16 },
}

impl Decision {
    #[inline]
    #[must_use]
    pub const fn is_delta(&self) -> bool {
        matches!(self, Self::Delta { .. })
    }
}

/// One entry handed to the pack writer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteEntry {
    pub pos: EntryPos,
    pub oid: OidBytes,
    pub kind: ObjectKind,
    /// Uncompressed object size.
    pub size: u64,
    pub decision: Decision,
    /// Source-pack bytes that can be copied verbatim.
    ///
    /// Offered only when the stored form matches the decision: a stored
    /// full object for `Full`; for `Delta`, a stored delta against the same
    /// base with no fresh delta computed since.
    pub reuse: Option<PackLocation>,
}

/// Assigns the write order, marking each emitted entry `filled`.
pub fn compute_write_order(session: &mut PackingSession) -> Vec<EntryPos> {
    let n = session.entries.len();
    for entry in &mut session.entries {
        entry.set_filled(false);
    }

    let mut order = Vec::with_capacity(n);
    let mut pending = Vec::new();

    let mut first_tagged = n;
    for idx in 0..n {
        if session.entries[idx].is_tagged() {
            first_tagged = idx;
            break;
        }
        add_with_bases(session, &mut order, &mut pending, EntryPos(idx as u32));
    }

    for idx in first_tagged..n {
        if session.entries[idx].is_tagged() {
            add_with_bases(session, &mut order, &mut pending, EntryPos(idx as u32));
        }
    }

    for idx in 0..n {
        if matches!(
            session.entries[idx].kind(),
            ObjectKind::Commit | ObjectKind::Tag
        ) {
            add_with_bases(session, &mut order, &mut pending, EntryPos(idx as u32));
        }
    }

    for idx in 0..n {
        if session.entries[idx].kind() == ObjectKind::Tree {
            add_with_bases(session, &mut order, &mut pending, EntryPos(idx as u32));
        }
    }

    for idx in 0..n {
        if !session.entries[idx].is_filled() {
            add_family(session, &mut order, &mut pending, EntryPos(idx as u32));
        }
    }

    tracing::debug!(written = order.len(), total = n, "write order assigned");
    order
}

fn add_to_order(session: &mut PackingSession, order: &mut Vec<EntryPos>, pos: EntryPos) {
    let entry = &mut session.entries[pos.index()];
    if entry.is_filled() || entry.is_preferred_base() {
        return;
    }
    entry.set_filled(true);
    order.push(pos);
}

/// Emits `pos` after any of its not-yet-written bases, oldest base first.
fn add_with_bases(
    session: &mut PackingSession,
    order: &mut Vec<EntryPos>,
    pending: &mut Vec<EntryPos>,
    pos: EntryPos,
) {
    pending.clear();
    let mut cur = pos;
    loop {
        let entry = &session.entries[cur.index()];
        if entry.is_filled() || pending.len() > session.entries.len() {
            break;
        }
        pending.push(cur);
        match entry.delta_base() {
            Some(base) => cur = base,
            None => break,
        }
    }
    debug_assert!(
        pending.len() <= session.entries.len(),
        "delta cycle reached write ordering"
    );
    while let Some(next) = pending.pop() {
        add_to_order(session, order, next);
    }
}

/// Emits the delta family containing `pos`: its chain root, then all
/// descendants in depth-first order.
fn add_family(
    session: &mut PackingSession,
    order: &mut Vec<EntryPos>,
    stack: &mut Vec<EntryPos>,
    pos: EntryPos,
) {
    let mut root = pos;
    let mut hops = 0usize;
    while let Some(base) = session.entries[root.index()].delta_base() {
        hops += 1;
        debug_assert!(
            hops <= session.entries.len(),
            "delta cycle reached write ordering"
        );
        if hops > session.entries.len() {
            break;
        }
        root = base;
    }

    stack.clear();
    stack.push(root);
    while let Some(cur) = stack.pop() {
        add_to_order(session, order, cur);
        let before = stack.len();
        stack.extend(session.children_of(cur));
        // Children are stored most recent first; visit in registration order.
        stack[before..].sort_unstable_by(|a, b| b.cmp(a));
    }
}

/// Materializes writer records for `order`.
#[must_use]
pub fn write_entries(session: &PackingSession, order: &[EntryPos]) -> Vec<WriteEntry> {
    order
        .iter()
        .filter_map(|&pos| {
            let entry = session.get(pos)?;
            let decision = match entry.delta_base() {
                Some(base) => Decision::Delta {
                    base,
                    depth: entry.depth(),
                },
                None => Decision::Full,
            };
            let stored_matches = match decision {
                Decision::Full => !entry.in_pack_kind().is_delta(),
                Decision::Delta { base, .. } => {
                    entry.in_pack_kind().is_delta()
                        && entry.in_pack_base() == Some(base)
                        && entry.delta_payload().is_none()
                }
            };
            let reuse = session.position_of(pos).filter(|_| stored_matches);
            Some(WriteEntry {
                pos,
                oid: *entry.oid(),
                kind: entry.kind(),
                size: entry.size(),
                decision,
                reuse,
            })
        })
        .collect()
}
