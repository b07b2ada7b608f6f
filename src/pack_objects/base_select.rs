//! Cycle-safe delta base selection.
//!
//! Delta candidacies are proposed independently (reused deltas from source
//! packs, window search results), so two objects can legitimately name each
//! other, directly or through a longer loop. This pass turns the proposed
//! `delta` relation into a final one that is acyclic and depth-bounded.
//!
//! # Algorithm
//! Entries carry a marker {none, active, done}. For each unvisited entry:
//! 1. Follow `delta` edges, marking each entry active and pushing it on a
//!    work stack, until reaching a done entry, a base-less entry, or an
//!    active entry. Reaching an active entry means the last edge closes a
//!    cycle: that candidacy is dropped and the entry becomes a full object.
//! 2. Pop the stack, assigning `depth = base depth + 1`. An entry whose depth
//!    would exceed `max_depth` drops its candidacy and restarts the count at 0,
//!    so its own dependents resolve against a full object.
//!
//! Every entry moves none -> active -> done exactly once, so the pass is
//! O(n) regardless of how chains branch. The explicit stack keeps
//! pathological chains off the call stack.
//!
//! Dropped candidacies are never errors: the object simply loses its delta.

use serde::Serialize;

use super::entry::{DfsState, EntryPos, NONE_U32};
use super::packing_data::PackingSession;
use super::perf;

/// Summary of one selection pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SelectionStats {
    /// Entries examined.
    pub visited: u32,
    /// Candidacies kept as deltas.
    pub deltas_kept: u32,
    /// Candidacies dropped because they closed a cycle.
    pub cycles_broken: u32,
    /// Candidacies dropped because the chain exceeded `max_depth`.
    pub depth_demotions: u32,
    /// Deepest resolved chain.
    pub max_depth_seen: u16,
}

/// Finalizes delta bases for every entry of `session`.
///
/// Afterwards, every entry's `delta` relation is acyclic, every entry's
/// `depth` is at most `session.limits().max_depth`, and every marker is
/// `DfsState::Done`. Running the pass again is a no-op apart from
/// recomputing the same depths.
pub fn break_delta_chains(session: &mut PackingSession) -> SelectionStats {
    let max_depth = session.limits().max_depth;
    let mut stats = SelectionStats::default();

    for entry in &mut session.entries {
        entry.set_dfs_state(DfsState::None);
    }

    let mut stack: Vec<EntryPos> = Vec::new();
    for start in 0..session.entries.len() {
        if session.entries[start].dfs_state() != DfsState::None {
            continue;
        }

        // Phase 1: walk toward the root, stopping at resolved ground.
        let mut cur = EntryPos(start as u32);
        let anchor_depth: u16 = loop {
            stats.visited += 1;
            let entry = &session.entries[cur.index()];
            debug_assert_eq!(entry.dfs_state(), DfsState::None);
            let base = entry.delta;
            if base == NONE_U32 {
                finish_full(session, cur);
                break 0;
            }
            match session.entries[base as usize].dfs_state() {
                DfsState::Active => {
                    tracing::debug!(entry = cur.0, base, "dropping delta that closes a cycle");
                    drop_candidacy(session, cur);
                    finish_full(session, cur);
                    stats.cycles_broken += 1;
                    perf::record_cycle_broken();
                    break 0;
                }
                DfsState::Done => {
                    session.entries[cur.index()].set_dfs_state(DfsState::Active);
                    stack.push(cur);
                    break session.entries[base as usize].depth();
                }
                DfsState::None => {
                    session.entries[cur.index()].set_dfs_state(DfsState::Active);
                    stack.push(cur);
                    cur = EntryPos(base);
                }
            }
        };

        // Phase 2: unwind, assigning depths from the base outward.
        let mut below = anchor_depth;
        while let Some(pos) = stack.pop() {
            let depth = below as u32 + 1;
            if depth > max_depth as u32 {
                tracing::debug!(entry = pos.0, depth, max_depth, "delta chain too deep");
                drop_candidacy(session, pos);
                finish_full(session, pos);
                stats.depth_demotions += 1;
                perf::record_depth_demotion();
                below = 0;
                continue;
            }
            let depth = depth as u16;
            let entry = &mut session.entries[pos.index()];
            entry.store_depth(depth);
            entry.set_dfs_state(DfsState::Done);
            stats.deltas_kept += 1;
            stats.max_depth_seen = stats.max_depth_seen.max(depth);
            below = depth;
        }
    }

    tracing::debug!(
        visited = stats.visited,
        deltas = stats.deltas_kept,
        cycles_broken = stats.cycles_broken,
        depth_demotions = stats.depth_demotions,
        max_depth = stats.max_depth_seen,
        "delta bases finalized"
    );
    stats
}

/// Marks `pos` resolved as a full object.
fn finish_full(session: &mut PackingSession, pos: EntryPos) {
    let entry = &mut session.entries[pos.index()];
    entry.store_depth(0);
    entry.set_dfs_state(DfsState::Done);
}

/// Forfeits the delta candidacy of `pos`.
///
/// The cached payload was computed against the dropped base and is
/// discarded with it.
fn drop_candidacy(session: &mut PackingSession, pos: EntryPos) {
    session.unlink(pos);
    session.entries[pos.index()].take_delta_payload();
}
