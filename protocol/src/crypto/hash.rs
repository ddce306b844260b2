//! Content digests.
//!
//! Every persisted record is identified by the SHA-256 digest of its tagged
//! encoding. [`Hash`] is the fixed 32-byte digest used as the primary key
//! inside each Merkle trie and as the node identifier within a trie.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of bytes in a content digest.
pub const HASH_SIZE: usize = 32;

/// A 32-byte SHA-256 content digest.
///
/// The all-zero digest is the sentinel for "no hash yet" (an unsealed record)
/// and for the parent hash of the genesis block.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// The all-zero sentinel digest.
    pub const ZERO: Hash = Hash([0u8; HASH_SIZE]);

    /// Compute the SHA-256 digest of `data`.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let digest = hasher.finalize();
        let mut bytes = [0u8; HASH_SIZE];
        bytes.copy_from_slice(&digest);
        Hash(bytes)
    }

    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    /// Wrap a byte slice, or `None` if it is not exactly 32 bytes.
    pub fn try_from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; HASH_SIZE] = slice.try_into().ok()?;
        Some(Hash(bytes))
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// `true` for the all-zero sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_SIZE]
    }

    /// Hex representation, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex digest.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        Self::try_from_slice(&bytes).ok_or(hex::FromHexError::InvalidStringLength)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        let a = Hash::of(b"aurum");
        let b = Hash::of(b"aurum");
        assert_eq!(a, b);
    }

    #[test]
    fn known_sha256_vector() {
        // SHA-256 of the empty string.
        let h = Hash::of(b"");
        assert_eq!(
            h.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn zero_sentinel() {
        assert!(Hash::ZERO.is_zero());
        assert!(!Hash::of(b"x").is_zero());
        assert_eq!(Hash::default(), Hash::ZERO);
    }

    #[test]
    fn hex_roundtrip() {
        let h = Hash::of(b"roundtrip");
        let recovered = Hash::from_hex(&h.to_hex()).unwrap();
        assert_eq!(h, recovered);
    }

    #[test]
    fn try_from_slice_rejects_wrong_length() {
        assert!(Hash::try_from_slice(&[0u8; 16]).is_none());
        assert!(Hash::try_from_slice(&[0u8; 33]).is_none());
        assert!(Hash::try_from_slice(&[0u8; 32]).is_some());
    }
}
