//! Read-only fan-out over a packing session.
//!
//! Delta search is the expensive part of a pack build and only reads the
//! session. Workers get a shared `&PackingSession` and a disjoint range of
//! positions; each returns the candidacies it found. The coordinating
//! thread then applies them with `commit_candidates`, which is the only
//! step that mutates.
//!
//! Results are gathered in shard order, and each shard walks its range in
//! position order, so the committed sequence does not depend on thread
//! scheduling.

use super::entry::{DeltaPayload, EntryPos};
use super::errors::PackingError;
use super::packing_data::PackingSession;

/// A delta proposed by a worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeltaCandidate {
    pub entry: EntryPos,
    pub base: EntryPos,
    pub payload: Option<DeltaPayload>,
}

/// Half-open `[start, end)` position ranges, one per worker, covering the
/// first `len` entries of a session.
///
/// At most `shards` ranges, never an empty one; sizes differ by at most one.
#[must_use]
pub fn shard_ranges(len: u32, shards: usize) -> Vec<(EntryPos, EntryPos)> {
    if len == 0 {
        return Vec::new();
    }
    let len = u64::from(len);
    let shards = u64::try_from(shards).unwrap_or(u64::MAX).clamp(1, len);
    // `i <= shards <= len`, so the boundary fits back into a position.
    let boundary = |i: u64| EntryPos((i * len / shards) as u32);
    (0..shards).map(|i| (boundary(i), boundary(i + 1))).collect()
}

/// Runs `search` for every entry of `session` on up to `shards` threads.
///
/// `shards <= 1` runs inline on the calling thread. A panicking worker
/// propagates its panic to the caller once all workers have stopped.
pub fn scatter_candidates<F>(
    session: &PackingSession,
    shards: usize,
    search: F,
) -> Vec<DeltaCandidate>
where
    F: Fn(&PackingSession, EntryPos) -> Option<DeltaCandidate> + Sync,
{
    let len = u32::try_from(session.len()).unwrap_or(u32::MAX);
    let ranges = shard_ranges(len, shards);
    let run = |(start, end): (EntryPos, EntryPos)| -> Vec<DeltaCandidate> {
        (start.0..end.0)
            .filter_map(|raw| search(session, EntryPos(raw)))
            .collect()
    };

    if ranges.len() <= 1 {
        return ranges.into_iter().flat_map(run).collect();
    }

    let shard_outputs = std::thread::scope(|scope| {
        let handles: Vec<_> = ranges
            .iter()
            .map(|&range| {
                let run = &run;
                scope.spawn(move || run(range))
            })
            .collect();

        let mut outputs = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.join() {
                Ok(found) => outputs.push(found),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        outputs
    });

    let total: usize = shard_outputs.iter().map(Vec::len).sum();
    tracing::debug!(
        shards = ranges.len(),
        entries = session.len(),
        candidates = total,
        "delta search gathered"
    );
    let mut merged = Vec::with_capacity(total);
    for found in shard_outputs {
        merged.extend(found);
    }
    merged
}

/// Applies worker candidacies in order. Returns how many were applied.
///
/// A later candidacy for the same entry replaces an earlier one.
///
/// # Errors
///
/// Stops at the first candidacy `set_delta` rejects (self-delta or unknown
/// position); candidacies before it stay applied.
pub fn commit_candidates(
    session: &mut PackingSession,
    candidates: Vec<DeltaCandidate>,
) -> Result<usize, PackingError> {
    let mut applied = 0usize;
    for candidate in candidates {
        session.set_delta(candidate.entry, candidate.base)?;
        session
            .entry_mut(candidate.entry)?
            .set_delta_payload(candidate.payload);
        applied += 1;
    }
    Ok(applied)
}
