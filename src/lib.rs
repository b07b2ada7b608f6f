//! Object packing engine for Git-style packfiles.
//!
//! ## Scope
//! This crate holds the in-memory state of a pack build: one compact entry
//! per candidate object, an identifier index over those entries, the delta
//! relationship graph proposed by a delta search, and the pass that turns
//! that graph into final, acyclic, depth-bounded bases. Object I/O, delta
//! computation, compression and the pack writer live outside the crate.
//!
//! ## Key invariants
//! - Per-entry overhead stays under 100 bytes; relations are `u32` arena
//!   positions, small fields share one packed word.
//! - Registration is idempotent and entries are never removed.
//! - Bounded fields (12-bit depth, 14-bit pack id) are range-checked; an
//!   overflow is a `PackingError::CapacityExceeded`, never a wrap.
//! - Delta cycles and over-deep chains are resolved internally by
//!   `break_delta_chains` and never surface as errors.
//!
//! ## Flow
//! `alloc -> set_in_pack -> set_delta (or scatter/commit) ->
//! break_delta_chains -> compute_write_order -> write_entries`
//!
//! ## Notable entry points
//! - `PackingSession`: arena, index and source-pack registry.
//! - `break_delta_chains` / `SelectionStats`: base selection.
//! - `compute_write_order` / `write_entries`: writer hand-off.
//! - `scatter_candidates` / `commit_candidates`: read-only fan-out for a
//!   parallel delta search.
//! - `PackingLimits`: session limits, loadable with serde.

pub mod pack_objects;

pub use pack_objects::{
    break_delta_chains, commit_candidates, compute_write_order, pack_name_hash,
    pack_name_hash_str, scatter_candidates, shard_ranges, write_entries, CapacityKind, Decision,
    DeltaCandidate, DeltaChildren, DeltaPayload, DfsState, EntryPos, IndexStats, ObjectEntry,
    ObjectFormat, ObjectKind, OidBytes, PackId, PackLocation, PackPerfStats, PackingError,
    PackingLimits, PackingSession, SelectionStats, SourcePackRef, SourcePackRegistry, WriteEntry,
    MAX_DELTA_DEPTH, MAX_SOURCE_PACKS,
};
