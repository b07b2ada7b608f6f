//! Source-pack registration and residence lookups.

use packer_rs::{
    CapacityKind, ObjectKind, OidBytes, PackingError, SourcePackRef, MAX_SOURCE_PACKS,
};

use super::{oid, session};

fn pack_ref(n: u32) -> SourcePackRef {
    let mut digest = [0xffu8; 20];
    digest[..4].copy_from_slice(&n.to_be_bytes());
    let checksum = OidBytes::sha1(digest);
    SourcePackRef {
        name: format!("pack-{checksum}.pack"),
        checksum,
        object_count: n,
    }
}

#[test]
fn exactly_max_packs_fit() {
    let mut s = session(10);
    let mut last = None;
    for n in 0..MAX_SOURCE_PACKS as u32 {
        last = Some(s.register_pack(pack_ref(n)).unwrap());
    }
    let last = last.unwrap();
    assert_eq!(last.get(), 16_383);
    assert_eq!(s.source_packs().len(), 16_384);

    // Re-registering a known pack is not a new pack.
    assert_eq!(s.register_pack(pack_ref(0)).unwrap().get(), 0);

    let err = s.register_pack(pack_ref(16_384)).unwrap_err();
    assert_eq!(
        err,
        PackingError::CapacityExceeded {
            kind: CapacityKind::PackIds,
            limit: 16_384,
            observed: 16_385
        }
    );
    assert!(err.is_capacity());
    assert_eq!(s.source_packs().len(), 16_384);

    // The highest id survives the round trip through the entry's packed word.
    let pos = s.alloc(oid(1)).unwrap();
    s.set_in_pack(pos, last, 1 << 40, 3, ObjectKind::Commit, None)
        .unwrap();
    let loc = s.position_of(pos).unwrap();
    assert_eq!(loc.pack_id, last);
    assert_eq!(loc.offset, 1 << 40);
    assert_eq!(loc.header_size, 3);
}

#[test]
fn residence_recorded_per_entry() {
    let mut s = session(10);
    let pack = s.register_pack(pack_ref(9)).unwrap();
    let packed = s.alloc(oid(1)).unwrap();
    let loose = s.alloc(oid(2)).unwrap();
    s.set_in_pack(packed, pack, 4242, 20, ObjectKind::OfsDelta, None)
        .unwrap();

    assert_eq!(s.position_of(loose), None);
    let entry = s.get(packed).unwrap();
    assert_eq!(entry.in_pack_id(), Some(pack));
    assert_eq!(entry.in_pack_kind(), ObjectKind::OfsDelta);
    assert_eq!(entry.kind(), ObjectKind::Unset);
    assert_eq!(
        s.source_packs().pack(pack).map(|p| p.object_count),
        Some(9)
    );
    assert_eq!(s.source_packs().find(&pack_ref(9).checksum), Some(pack));
}

#[test]
fn foreign_pack_id_rejected() {
    let mut other = session(10);
    other.register_pack(pack_ref(1)).unwrap();
    // Id 1 exists only in `other`.
    let foreign = other.register_pack(pack_ref(2)).unwrap();

    let mut s = session(10);
    s.register_pack(pack_ref(1)).unwrap();
    let pos = s.alloc(oid(1)).unwrap();
    let err = s
        .set_in_pack(pos, foreign, 0, 2, ObjectKind::Blob, None)
        .unwrap_err();
    assert_eq!(err, PackingError::UnknownPack { pack_id: 1 });
    assert_eq!(s.position_of(pos), None);
}
