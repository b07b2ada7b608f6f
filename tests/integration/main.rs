//! Integration tests for packer-rs packing sessions.
//!
//! Run with: `cargo test --test integration`

mod base_selection;
mod scatter_commit;
mod source_packs;
mod write_order;

use packer_rs::{ObjectFormat, OidBytes, PackingLimits, PackingSession};

/// SHA-1 identifier with `n` in the leading bytes.
pub(crate) fn oid(n: u32) -> OidBytes {
    let mut digest = [0u8; 20];
    digest[..4].copy_from_slice(&n.to_be_bytes());
    digest[19] = 0x5a;
    OidBytes::sha1(digest)
}

pub(crate) fn session(max_depth: u16) -> PackingSession {
    let limits = PackingLimits {
        max_depth,
        ..PackingLimits::RESTRICTIVE
    };
    PackingSession::new(ObjectFormat::Sha1, limits).expect("valid limits")
}
