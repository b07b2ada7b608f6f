//! Optional performance counters for packing sessions.
//!
//! Enable with the `pack-perf` feature. When disabled, all functions are
//! no-ops and `snapshot` returns zeroes.
//!
//! Counters are process-wide relaxed atomics; snapshots are best-effort and
//! meant for coarse diagnostics, not exact accounting across concurrent
//! sessions.

#[cfg(feature = "pack-perf")]
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Snapshot of packing counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PackPerfStats {
    /// New entries appended to an arena.
    pub entry_allocs: u64,
    /// Slots inspected by index probes.
    pub index_probes: u64,
    /// Index grow-and-rehash events.
    pub index_grows: u64,
    /// Child-list unlinks (reparent, clear, demotion).
    pub child_unlinks: u64,
    /// Sibling hops taken while unlinking.
    pub child_unlink_hops: u64,
    /// Candidacies dropped to break a cycle.
    pub cycles_broken: u64,
    /// Candidacies dropped for exceeding the depth limit.
    pub depth_demotions: u64,
}

#[cfg(feature = "pack-perf")]
static ENTRY_ALLOCS: AtomicU64 = AtomicU64::new(0);
#[cfg(feature = "pack-perf")]
static INDEX_PROBES: AtomicU64 = AtomicU64::new(0);
#[cfg(feature = "pack-perf")]
static INDEX_GROWS: AtomicU64 = AtomicU64::new(0);
#[cfg(feature = "pack-perf")]
static CHILD_UNLINKS: AtomicU64 = AtomicU64::new(0);
#[cfg(feature = "pack-perf")]
static CHILD_UNLINK_HOPS: AtomicU64 = AtomicU64::new(0);
#[cfg(feature = "pack-perf")]
static CYCLES_BROKEN: AtomicU64 = AtomicU64::new(0);
#[cfg(feature = "pack-perf")]
static DEPTH_DEMOTIONS: AtomicU64 = AtomicU64::new(0);

/// Reset all counters to zero.
pub fn reset() {
    #[cfg(feature = "pack-perf")]
    {
        ENTRY_ALLOCS.store(0, Ordering::Relaxed);
        INDEX_PROBES.store(0, Ordering::Relaxed);
        INDEX_GROWS.store(0, Ordering::Relaxed);
        CHILD_UNLINKS.store(0, Ordering::Relaxed);
        CHILD_UNLINK_HOPS.store(0, Ordering::Relaxed);
        CYCLES_BROKEN.store(0, Ordering::Relaxed);
        DEPTH_DEMOTIONS.store(0, Ordering::Relaxed);
    }
}

/// Current counter values.
#[must_use]
pub fn snapshot() -> PackPerfStats {
    #[cfg(feature = "pack-perf")]
    {
        PackPerfStats {
            entry_allocs: ENTRY_ALLOCS.load(Ordering::Relaxed),
            index_probes: INDEX_PROBES.load(Ordering::Relaxed),
            index_grows: INDEX_GROWS.load(Ordering::Relaxed),
            child_unlinks: CHILD_UNLINKS.load(Ordering::Relaxed),
            child_unlink_hops: CHILD_UNLINK_HOPS.load(Ordering::Relaxed),
            cycles_broken: CYCLES_BROKEN.load(Ordering::Relaxed),
            depth_demotions: DEPTH_DEMOTIONS.load(Ordering::Relaxed),
        }
    }
    #[cfg(not(feature = "pack-perf"))]
    {
        PackPerfStats::default()
    }
}

#[inline]
pub(crate) fn record_entry_alloc() {
    #[cfg(feature = "pack-perf")]
    ENTRY_ALLOCS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn record_index_probe() {
    #[cfg(feature = "pack-perf")]
    INDEX_PROBES.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn record_index_grow() {
    #[cfg(feature = "pack-perf")]
    INDEX_GROWS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn record_child_unlink(hops: u64) {
    #[cfg(feature = "pack-perf")]
    {
        CHILD_UNLINKS.fetch_add(1, Ordering::Relaxed);
        CHILD_UNLINK_HOPS.fetch_add(hops, Ordering::Relaxed);
    }
    #[cfg(not(feature = "pack-perf"))]
    let _ = hops;
}

#[inline]
pub(crate) fn record_cycle_broken() {
    #[cfg(feature = "pack-perf")]
    CYCLES_BROKEN.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn record_depth_demotion() {
    #[cfg(feature = "pack-perf")]
    DEPTH_DEMOTIONS.fetch_add(1, Ordering::Relaxed);
}
