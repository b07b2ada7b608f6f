//! Parallel delta search feeding the base selector.

use packer_rs::{
    break_delta_chains, commit_candidates, pack_name_hash_str, scatter_candidates,
    DeltaCandidate, DeltaPayload, EntryPos, ObjectKind, PackingSession,
};

use super::{oid, session};

const PATHS: [&str; 3] = ["src/main.rs", "README.md", "docs/guide.md"];

/// Three files, eight revisions each, registered newest revision first.
fn history(s: &mut PackingSession) {
    for rev in 0..8u32 {
        for (file, path) in PATHS.iter().enumerate() {
            let pos = s.alloc(oid(rev * 16 + file as u32)).unwrap();
            let entry = s.get_mut(pos).unwrap();
            entry.set_kind(ObjectKind::Blob).unwrap();
            entry.set_size(u64::from(1_000 + rev * 8));
            entry.set_name_hash(pack_name_hash_str(path));
        }
    }
}

/// Pairs each entry with the closest later entry carrying the same name hash.
fn same_name_search(s: &PackingSession, pos: EntryPos) -> Option<DeltaCandidate> {
    let entry = s.get(pos)?;
    let base = s
        .entries()
        .skip(pos.index() + 1)
        .find(|(_, other)| other.name_hash() == entry.name_hash())
        .map(|(base, _)| base)?;
    Some(DeltaCandidate {
        entry: pos,
        base,
        payload: Some(DeltaPayload {
            size: 16,
            z_size: 12,
            data: None,
        }),
    })
}

#[test]
fn sharded_search_commits_same_graph_as_inline() {
    let mut inline = session(10);
    let mut sharded = session(10);
    history(&mut inline);
    history(&mut sharded);

    let found = scatter_candidates(&inline, 1, same_name_search);
    assert_eq!(found.len(), 21);
    commit_candidates(&mut inline, found).unwrap();

    let found = scatter_candidates(&sharded, 5, same_name_search);
    commit_candidates(&mut sharded, found).unwrap();

    for (pos, _) in inline.entries() {
        assert_eq!(inline.delta_base(pos), sharded.delta_base(pos));
    }
}

#[test]
fn committed_chains_are_bounded_by_selector() {
    let mut s = session(3);
    history(&mut s);
    let found = scatter_candidates(&s, 4, same_name_search);
    commit_candidates(&mut s, found).unwrap();

    let stats = break_delta_chains(&mut s);
    // Each file's seven-delta chain loses one link to the depth bound.
    assert_eq!(stats.depth_demotions, 3);
    assert_eq!(stats.deltas_kept, 18);
    assert!(s.entries().all(|(_, e)| e.depth() <= 3));
    // Full objects never keep a payload from a dropped candidacy.
    assert!(s
        .entries()
        .all(|(_, e)| e.delta_base().is_some() || e.delta_payload().is_none()));
}
