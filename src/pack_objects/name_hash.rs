//! Name-hint hash for delta-candidate clustering.
//!
//! The hash is a sort key, never an identity: objects reached through paths
//! with the same tail (for example the same file extension) land near each
//! other when candidates are sorted, which puts likely delta pairs in the
//! same search window.
//!
//! Each non-whitespace byte is added into the top 8 bits while the running
//! value shifts down two bits, so roughly the last sixteen non-whitespace
//! bytes determine the result and the final bytes weigh the most. The
//! folding must stay bit-for-bit stable; existing orderings depend on it.

/// Hashes a path-like name into a 32-bit clustering key.
///
/// `None` and empty names hash to 0. Space, tab, newline and carriage return
/// are skipped.
#[must_use]
pub fn pack_name_hash(name: Option<&[u8]>) -> u32 {
    let Some(name) = name else {
        return 0;
    };
    let mut hash = 0u32;
    for &c in name {
        if is_space(c) {
            continue;
        }
        hash = (hash >> 2).wrapping_add((c as u32) << 24);
    }
    hash
}

/// `pack_name_hash` for UTF-8 names.
#[inline]
#[must_use]
pub fn pack_name_hash_str(name: &str) -> u32 {
    pack_name_hash(Some(name.as_bytes()))
}

#[inline]
const fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r')
}
