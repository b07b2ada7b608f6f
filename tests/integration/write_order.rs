//! Writer hand-off: order and per-entry decisions.

use packer_rs::{
    break_delta_chains, commit_candidates, compute_write_order, write_entries, Decision,
    DeltaCandidate, EntryPos, ObjectKind, PackingSession, SourcePackRef,
};

use super::{oid, session};

fn add(s: &mut PackingSession, n: u32, kind: ObjectKind) -> EntryPos {
    let pos = s.alloc(oid(n)).unwrap();
    s.get_mut(pos).unwrap().set_kind(kind).unwrap();
    pos
}

#[test]
fn every_written_delta_follows_its_base() {
    let mut s = session(3);
    let tip = add(&mut s, 0, ObjectKind::Commit);
    s.get_mut(tip).unwrap().set_tagged(true);
    let tree = add(&mut s, 1, ObjectKind::Tree);
    let blobs: Vec<_> = (2..12).map(|n| add(&mut s, n, ObjectKind::Blob)).collect();
    for pair in blobs.windows(2) {
        s.set_delta(pair[0], pair[1]).unwrap();
    }
    s.set_delta(tree, blobs[9]).unwrap();

    break_delta_chains(&mut s);
    let order = compute_write_order(&mut s);
    assert_eq!(order.len(), 12);
    assert_eq!(order[0], tip);
    // The tree deltas against a blob, so that blob moves ahead of it.
    assert_eq!(&order[1..3], &[blobs[9], tree]);

    let at = |pos: EntryPos| order.iter().position(|&p| p == pos).unwrap();
    for w in write_entries(&s, &order) {
        if let Decision::Delta { base, depth } = w.decision {
            assert!(at(base) < at(w.pos), "{:?} written before its base", w.pos);
            assert!(depth <= 3);
        }
    }
}

#[test]
fn thin_base_used_but_not_written() {
    let mut s = session(10);
    let pack = s
        .register_pack(SourcePackRef {
            checksum: oid(0xbeef),
            name: "pack-thin.pack".into(),
            object_count: 1,
        })
        .unwrap();
    let external = add(&mut s, 0, ObjectKind::Blob);
    let local = add(&mut s, 1, ObjectKind::Blob);
    s.get_mut(external).unwrap().set_preferred_base(true);
    s.set_in_pack(local, pack, 12, 22, ObjectKind::RefDelta, Some(external))
        .unwrap();
    s.set_delta(local, external).unwrap();

    break_delta_chains(&mut s);
    let order = compute_write_order(&mut s);
    assert_eq!(order, vec![local]);

    let written = write_entries(&s, &order);
    assert_eq!(
        written[0].decision,
        Decision::Delta {
            base: external,
            depth: 1
        }
    );
    assert_eq!(written[0].reuse.map(|loc| loc.offset), Some(12));
    assert!(!s.get(external).unwrap().is_filled());
}

#[test]
fn stored_delta_dropped_when_search_moves_base() {
    let mut s = session(10);
    let pack = s
        .register_pack(SourcePackRef {
            checksum: oid(0xcafe),
            name: "pack-old.pack".into(),
            object_count: 2,
        })
        .unwrap();
    let old_base = add(&mut s, 0, ObjectKind::Blob);
    let new_base = add(&mut s, 1, ObjectKind::Blob);
    let stays = add(&mut s, 2, ObjectKind::Blob);
    let moves = add(&mut s, 3, ObjectKind::Blob);
    s.set_in_pack(stays, pack, 100, 22, ObjectKind::RefDelta, Some(old_base))
        .unwrap();
    s.set_in_pack(moves, pack, 200, 22, ObjectKind::RefDelta, Some(old_base))
        .unwrap();
    s.set_delta(stays, old_base).unwrap();
    s.set_delta(moves, old_base).unwrap();

    // The search finds a better base for one of them without keeping bytes.
    let applied = commit_candidates(
        &mut s,
        vec![DeltaCandidate {
            entry: moves,
            base: new_base,
            payload: None,
        }],
    )
    .unwrap();
    assert_eq!(applied, 1);

    break_delta_chains(&mut s);
    let order = compute_write_order(&mut s);
    let written = write_entries(&s, &order);
    let find = |pos: EntryPos| written.iter().find(|w| w.pos == pos).unwrap();

    assert_eq!(find(stays).reuse.map(|loc| loc.offset), Some(100));
    assert_eq!(
        find(moves).decision,
        Decision::Delta {
            base: new_base,
            depth: 1
        }
    );
    assert_eq!(find(moves).reuse, None);
}
