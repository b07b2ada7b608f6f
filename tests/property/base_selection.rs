//! The base selector always yields an acyclic, depth-bounded relation.

use proptest::prelude::*;

use packer_rs::{
    break_delta_chains, compute_write_order, DfsState, EntryPos, ObjectFormat, OidBytes,
    PackingLimits, PackingSession,
};

fn build(bases: &[Option<usize>], max_depth: u16) -> PackingSession {
    let limits = PackingLimits {
        max_depth,
        ..PackingLimits::RESTRICTIVE
    };
    let mut s = PackingSession::new(ObjectFormat::Sha1, limits).unwrap();
    for n in 0..bases.len() as u32 {
        let mut digest = [0u8; 20];
        digest[..4].copy_from_slice(&n.to_be_bytes());
        s.alloc(OidBytes::sha1(digest)).unwrap();
    }
    for (entry, base) in bases.iter().enumerate() {
        if let Some(base) = base {
            let base = base % bases.len();
            if base != entry {
                s.set_delta(EntryPos(entry as u32), EntryPos(base as u32))
                    .unwrap();
            }
        }
    }
    s
}

fn proposals() -> impl Strategy<Value = Vec<Option<usize>>> {
    prop::collection::vec(prop::option::weighted(0.8, 0usize..64), 1..64)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn result_is_acyclic_and_bounded(bases in proposals(), max_depth in 0u16..6) {
        let mut s = build(&bases, max_depth);
        let proposed = s.entries().filter(|(_, e)| e.delta_base().is_some()).count();
        let stats = break_delta_chains(&mut s);

        prop_assert_eq!(stats.visited as usize, s.len());
        prop_assert_eq!(
            (stats.deltas_kept + stats.cycles_broken + stats.depth_demotions) as usize,
            proposed
        );

        for (pos, entry) in s.entries() {
            prop_assert_eq!(entry.dfs_state(), DfsState::Done);
            prop_assert!(entry.depth() <= max_depth);

            // Walking bases terminates and matches the recorded depth.
            let mut hops = 0usize;
            let mut cur = pos;
            while let Some(base) = s.delta_base(cur) {
                hops += 1;
                prop_assert!(hops <= s.len(), "cycle through {:?}", pos);
                prop_assert_eq!(
                    s.get(cur).unwrap().depth(),
                    s.get(base).unwrap().depth() + 1
                );
                cur = base;
            }
            prop_assert_eq!(usize::from(entry.depth()), hops);
        }
    }

    #[test]
    fn every_entry_written_once_after_its_base(bases in proposals(), max_depth in 1u16..6) {
        let mut s = build(&bases, max_depth);
        break_delta_chains(&mut s);
        let order = compute_write_order(&mut s);

        prop_assert_eq!(order.len(), s.len());
        let mut at = vec![usize::MAX; s.len()];
        for (idx, pos) in order.iter().enumerate() {
            prop_assert_eq!(at[pos.index()], usize::MAX, "written twice");
            at[pos.index()] = idx;
        }
        for (pos, entry) in s.entries() {
            if let Some(base) = entry.delta_base() {
                prop_assert!(at[base.index()] < at[pos.index()]);
            }
        }
    }
}
