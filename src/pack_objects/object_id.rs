//! Object identifiers for packing candidates.
//!
//! A packing session is created for a single object format; every identifier
//! registered into it must have that format's width. `OidBytes` keeps the
//! identifier inline (no heap) so it can live directly inside `ObjectEntry`.
//!
//! # Invariants
//! - `len` is 20 (SHA-1) or 32 (SHA-256).
//! - `bytes[len..]` is zero-padded.
//! - Equality, hashing and ordering use `bytes[..len]` only.

use std::fmt;
use std::hash::{Hash, Hasher};

use super::errors::PackingError;

/// Object format of a repository, which fixes the identifier width.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ObjectFormat {
    /// SHA-1 identifiers (20 bytes).
    #[default]
    Sha1 = 1,
    /// SHA-256 identifiers (32 bytes).
    Sha256 = 2,
}

impl ObjectFormat {
    /// Identifier width in bytes.
    #[inline]
    #[must_use]
    pub const fn oid_len(self) -> u8 {
        match self {
            Self::Sha1 => OidBytes::SHA1_LEN,
            Self::Sha256 => OidBytes::SHA256_LEN,
        }
    }
}

/// Inline SHA-1 or SHA-256 object identifier.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct OidBytes {
    len: u8,
    bytes: [u8; 32],
}

impl OidBytes {
    /// SHA-1 identifier width.
    pub const SHA1_LEN: u8 = 20;
    /// SHA-256 identifier width.
    pub const SHA256_LEN: u8 = 32;

    /// Wraps a SHA-1 digest.
    #[inline]
    #[must_use]
    pub fn sha1(digest: [u8; 20]) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..20].copy_from_slice(&digest);
        Self { len: 20, bytes }
    }

    /// Wraps a SHA-256 digest.
    #[inline]
    #[must_use]
    pub fn sha256(digest: [u8; 32]) -> Self {
        Self { len: 32, bytes: digest }
    }

    /// Parses a raw digest slice.
    ///
    /// # Errors
    ///
    /// Returns `PackingError::InvalidOidLength` unless the slice is exactly
    /// 20 or 32 bytes.
    pub fn try_from_slice(raw: &[u8]) -> Result<Self, PackingError> {
        match raw.len() {
            20 | 32 => {
                let mut bytes = [0u8; 32];
                bytes[..raw.len()].copy_from_slice(raw);
                Ok(Self {
                    len: raw.len() as u8,
                    bytes,
                })
            }
            len => Err(PackingError::InvalidOidLength { len }),
        }
    }

    /// Parses a lowercase or uppercase hex rendering.
    ///
    /// # Errors
    ///
    /// Returns `PackingError::InvalidOidLength` for widths other than 40 or
    /// 64 characters and `PackingError::InvalidOidHex` for non-hex input.
    pub fn from_hex(hex: &str) -> Result<Self, PackingError> {
        let raw = hex.as_bytes();
        if raw.len() != 40 && raw.len() != 64 {
            return Err(PackingError::InvalidOidLength { len: raw.len() / 2 });
        }
        let mut bytes = [0u8; 32];
        for (i, pair) in raw.chunks_exact(2).enumerate() {
            let hi = hex_val(pair[0]).ok_or(PackingError::InvalidOidHex)?;
            let lo = hex_val(pair[1]).ok_or(PackingError::InvalidOidHex)?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(Self {
            len: (raw.len() / 2) as u8,
            bytes,
        })
    }

    /// Identifier bytes (20 or 32).
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Identifier width in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> u8 {
        self.len
    }

    /// Always false for a constructed identifier.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Format implied by the identifier width.
    #[inline]
    #[must_use]
    pub const fn format(&self) -> ObjectFormat {
        if self.len == Self::SHA1_LEN {
            ObjectFormat::Sha1
        } else {
            ObjectFormat::Sha256
        }
    }
}

#[inline]
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Default for OidBytes {
    fn default() -> Self {
        Self {
            len: Self::SHA1_LEN,
            bytes: [0u8; 32],
        }
    }
}

impl fmt::Debug for OidBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OidBytes({self})")
    }
}

impl fmt::Display for OidBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.as_slice() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl PartialEq for OidBytes {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for OidBytes {}

impl Hash for OidBytes {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl PartialOrd for OidBytes {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OidBytes {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}
