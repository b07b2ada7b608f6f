//! End-to-end base selection scenarios.

use packer_rs::{
    break_delta_chains, compute_write_order, pack_name_hash_str, write_entries, Decision,
    DeltaPayload, DfsState, EntryPos, ObjectKind, PackingSession,
};

use super::{oid, session};

/// Follows `delta` edges from `pos`; panics if the walk revisits an entry.
fn chain_len(s: &PackingSession, pos: EntryPos) -> usize {
    let mut seen = vec![false; s.len()];
    let mut cur = pos;
    let mut hops = 0;
    while let Some(base) = s.delta_base(cur) {
        assert!(!seen[cur.index()], "delta cycle through {cur:?}");
        seen[cur.index()] = true;
        hops += 1;
        cur = base;
    }
    hops
}

#[test]
fn near_identical_blobs_become_one_delta() {
    let mut s = session(10);
    let blob1 = s.alloc(oid(1)).unwrap();
    let blob2 = s.alloc(oid(2)).unwrap();
    for (pos, size) in [(blob1, 50), (blob2, 52)] {
        let entry = s.get_mut(pos).unwrap();
        entry.set_kind(ObjectKind::Blob).unwrap();
        entry.set_size(size);
        entry.set_name_hash(pack_name_hash_str("docs/readme.txt"));
    }

    s.set_delta(blob2, blob1).unwrap();
    s.get_mut(blob2).unwrap().set_delta_payload(Some(DeltaPayload {
        size: 9,
        z_size: 14,
        data: Some(vec![0x32, 0x34, 0x90, 0x30, 0x02, b'o', b'k', 0, 0].into_boxed_slice()),
    }));

    let stats = break_delta_chains(&mut s);
    assert_eq!(stats.deltas_kept, 1);
    assert_eq!(stats.cycles_broken, 0);

    assert_eq!(s.delta_base(blob2), Some(blob1));
    assert_eq!(s.get(blob2).unwrap().depth(), 1);
    assert_eq!(s.delta_base(blob1), None);
    assert_eq!(s.get(blob1).unwrap().depth(), 0);
    assert_eq!(s.get(blob2).unwrap().delta_payload().unwrap().size, 9);

    let order = compute_write_order(&mut s);
    let written = write_entries(&s, &order);
    assert_eq!(order, vec![blob1, blob2]);
    assert_eq!(written[0].decision, Decision::Full);
    assert_eq!(
        written[1].decision,
        Decision::Delta {
            base: blob1,
            depth: 1
        }
    );
    assert_eq!(written[1].size, 52);
}

#[test]
fn three_cycle_is_broken() {
    let mut s = session(10);
    let a = s.alloc(oid(1)).unwrap();
    let b = s.alloc(oid(2)).unwrap();
    let c = s.alloc(oid(3)).unwrap();
    s.set_delta(a, b).unwrap();
    s.set_delta(b, c).unwrap();
    s.set_delta(c, a).unwrap();

    let stats = break_delta_chains(&mut s);
    assert_eq!(stats.cycles_broken, 1);

    let surviving = [a, b, c]
        .iter()
        .filter(|&&pos| s.delta_base(pos).is_some())
        .count();
    assert!(surviving <= 2);
    for pos in [a, b, c] {
        chain_len(&s, pos);
        let entry = s.get(pos).unwrap();
        assert_eq!(entry.dfs_state(), DfsState::Done);
        assert_eq!(usize::from(entry.depth()), chain_len(&s, pos));
    }
    // The walk starts at `a`, so the edge closing back onto it is dropped.
    assert_eq!(s.delta_base(c), None);
    assert_eq!(s.children_of(a).count(), 0);
}

#[test]
fn long_chain_respects_max_depth() {
    let mut s = session(4);
    let positions: Vec<_> = (0..20).map(|n| s.alloc(oid(n)).unwrap()).collect();
    // Newest object first, each deltas against the next older one.
    for pair in positions.windows(2) {
        s.set_delta(pair[0], pair[1]).unwrap();
    }

    let stats = break_delta_chains(&mut s);
    assert_eq!(stats.visited, 20);
    assert_eq!(stats.depth_demotions, 3);
    assert_eq!(stats.max_depth_seen, 4);

    for &pos in &positions {
        let depth = s.get(pos).unwrap().depth();
        assert!(depth <= 4);
        assert_eq!(usize::from(depth), chain_len(&s, pos));
    }
    // Demoted entries restart the count for their dependents.
    assert_eq!(s.delta_base(positions[14]), None);
    assert_eq!(s.get(positions[13]).unwrap().depth(), 1);
}

#[test]
fn demoted_entry_loses_cached_payload() {
    let mut s = session(1);
    let base = s.alloc(oid(1)).unwrap();
    let mid = s.alloc(oid(2)).unwrap();
    let tip = s.alloc(oid(3)).unwrap();
    s.set_delta(mid, base).unwrap();
    s.set_delta(tip, mid).unwrap();
    s.get_mut(tip).unwrap().set_delta_payload(Some(DeltaPayload {
        size: 3,
        z_size: 0,
        data: None,
    }));

    let stats = break_delta_chains(&mut s);
    assert_eq!(stats.depth_demotions, 1);
    assert_eq!(s.delta_base(tip), None);
    assert!(s.get(tip).unwrap().delta_payload().is_none());
    assert_eq!(s.children_of(mid).count(), 0);
}
