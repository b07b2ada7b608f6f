//! Object packing engine.
//!
//! A pack build registers every candidate object in a `PackingSession`
//! (arena + identifier index), records where objects already live in source
//! packs, collects delta candidacies from an external search stage, and
//! finally resolves those candidacies into an acyclic, depth-bounded set of
//! bases before handing a write order to the pack writer.
//!
//! Flow:
//! `alloc -> set_in_pack -> scatter_candidates/commit_candidates ->
//! break_delta_chains -> compute_write_order -> write_entries`
//!
//! # Invariants
//! - Entries are never removed; an `EntryPos` stays valid for the session.
//! - An entry is in its base's child list iff its `delta` names that base.
//! - Depth fits 12 bits and pack ids fit 14 bits; overflow is a capacity
//!   fault, never a wrap.
//! - Preferred-base entries are never written.
//! - Cycles and over-deep chains are resolved inside `break_delta_chains`
//!   and never surface as errors.

pub mod base_select;
pub mod delta_graph;
pub mod entry;
pub mod entry_index;
pub mod errors;
pub mod limits;
pub mod name_hash;
pub mod object_id;
pub mod object_kind;
pub mod packing_data;
pub mod perf;
pub mod scatter;
pub mod source_packs;
pub mod write_order;

pub use base_select::{break_delta_chains, SelectionStats};
pub use delta_graph::DeltaChildren;
pub use entry::{DeltaPayload, DfsState, EntryPos, ObjectEntry, DEPTH_BITS, MAX_DELTA_DEPTH};
pub use entry_index::IndexStats;
pub use errors::{CapacityKind, PackingError};
pub use limits::PackingLimits;
pub use name_hash::{pack_name_hash, pack_name_hash_str};
pub use object_id::{ObjectFormat, OidBytes};
pub use object_kind::ObjectKind;
pub use packing_data::PackingSession;
pub use perf::PackPerfStats;
pub use scatter::{commit_candidates, scatter_candidates, shard_ranges, DeltaCandidate};
pub use source_packs::{
    PackId, PackLocation, SourcePackRef, SourcePackRegistry, MAX_SOURCE_PACKS, PACK_ID_BITS,
};
pub use write_order::{compute_write_order, write_entries, Decision, WriteEntry};

const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PackingSession>();
};
