//! # Addresses
//!
//! An address is the chain-facing identity of an account, derived from the
//! account's Ed25519 public key:
//!
//! ```text
//! public_key (32 bytes)
//!     -> BLAKE3(public_key) -> 32 bytes
//!     -> Bech32("aurum", hash) -> aurum1qw508d6qe...
//! ```
//!
//! The Bech32 text form is the canonical human form (and the lookup key for
//! account state); the 32 hash bytes are the canonical binary form embedded
//! in encoded transactions. Equality is structural over the hash bytes.
//!
//! Hashing the key instead of exposing it keeps the address format stable if
//! the key scheme ever changes, and Bech32's checksum catches up to four
//! character errors when users copy-paste addresses.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::ADDRESS_HRP;
use crate::crypto::keys::PublicKey;

/// Errors that can occur while parsing an address.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The Bech32 string could not be decoded.
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// The decoded address has an unexpected human-readable prefix.
    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp { expected: String, got: String },

    /// The decoded data has an unexpected length.
    #[error("invalid address data length: expected 32 bytes, got {0}")]
    InvalidDataLength(usize),
}

/// A chain account identifier: the BLAKE3 hash of a public key.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl Address {
    /// Derive the address of a public key.
    pub fn from_public_key(pk: &PublicKey) -> Self {
        let digest = blake3::hash(pk.as_bytes());
        Address(*digest.as_bytes())
    }

    /// Wrap the canonical 32-byte binary form.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    /// Wrap a byte slice, validating the length.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, AddressError> {
        let bytes: [u8; 32] = slice
            .try_into()
            .map_err(|_| AddressError::InvalidDataLength(slice.len()))?;
        Ok(Address(bytes))
    }

    /// The canonical binary form.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encode the canonical Bech32 text form, e.g. `aurum1...`.
    pub fn to_text(&self) -> String {
        let hrp = Hrp::parse(ADDRESS_HRP).expect("static HRP is valid");
        bech32::encode::<Bech32>(hrp, &self.0)
            .expect("encoding a 32-byte payload should never fail")
    }

    /// Parse the Bech32 text form, validating HRP, checksum and length.
    pub fn from_text(addr: &str) -> Result<Self, AddressError> {
        let (hrp, data) =
            bech32::decode(addr).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;

        let expected_hrp = Hrp::parse(ADDRESS_HRP).expect("static HRP is valid");
        if hrp != expected_hrp {
            return Err(AddressError::InvalidHrp {
                expected: ADDRESS_HRP.to_string(),
                got: hrp.to_string(),
            });
        }

        Self::try_from_slice(&data)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_text();
        write!(f, "Address({})", &text[..14.min(text.len())])
    }
}
