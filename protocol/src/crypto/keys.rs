//! # Key Management
//!
//! Ed25519 keypair generation and the byte-level public key / signature
//! wrappers embedded in transactions.
//!
//! ## Why Ed25519?
//!
//! - Deterministic signatures (no k-value footguns like ECDSA).
//! - 128-bit security level in 32+32 bytes. Compact and sufficient.
//! - Fast verification. It matters when you're checking thousands of
//!   signatures per block.
//!
//! [`PublicKey`] and [`Signature`] are deliberately loose wrappers over raw
//! bytes: an unsigned transaction carries empty ones, and malformed material
//! simply fails verification. No panics, no undefined behavior.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during key operations.
///
/// Intentionally vague about *why* something failed: leaking details about
/// key material through error messages is a classic footgun.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,
}

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// An Ed25519 signing keypair.
///
/// The private half never leaves this struct except through
/// [`secret_key_bytes`](Self::secret_key_bytes), and it intentionally does
/// NOT implement `Serialize`. Exporting a secret key should be a deliberate
/// act, not something a JSON encoder does by accident.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS cryptographic RNG.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Derive a keypair deterministically from a 32-byte seed.
    ///
    /// In Ed25519 the 32-byte secret key *is* the seed. A weak seed gives a
    /// weak key; feed this from a CSPRNG or KDF only.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The public half of this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            bytes: self.signing_key.verifying_key().to_bytes().to_vec(),
        }
    }

    /// Sign a message.
    ///
    /// Ed25519 signing is deterministic: the same (key, message) pair always
    /// produces the same signature.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let sig = self.signing_key.sign(message);
        Signature {
            bytes: sig.to_bytes().to_vec(),
        }
    }

    /// Export the raw 32-byte secret. Handle with extreme care.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret material, not even "partially".
        write!(f, "Keypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// The public half of a keypair, as embedded in a transaction.
///
/// Stored as raw bytes so an unsigned transaction can carry an empty key.
/// Validity is checked when the key is actually used.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: Vec<u8>,
}

impl PublicKey {
    /// An empty placeholder, the state of a transaction before signing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap raw public key bytes without validating them.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// `true` if no key material is present.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Interpret the bytes as an Ed25519 verifying key.
    ///
    /// Fails on wrong length or bytes that are not a valid curve point
    /// (low-order points and other degenerate cases are rejected).
    pub fn to_verifying_key(&self) -> Result<VerifyingKey, KeyError> {
        let arr: [u8; 32] = self
            .bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&arr).map_err(|_| KeyError::InvalidPublicKey)
    }

    /// Verify `signature` over `message` against this key.
    ///
    /// Returns `false` on any failure: malformed key, malformed signature,
    /// or a genuine mismatch. Callers that need to distinguish should call
    /// [`to_verifying_key`](Self::to_verifying_key) first.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = self.to_verifying_key() else {
            return false;
        };
        let sig_bytes: [u8; 64] = match signature.bytes.as_slice().try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        let dalek_sig = DalekSignature::from_bytes(&sig_bytes);
        verifying_key.verify(message, &dalek_sig).is_ok()
    }

    /// Hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bytes.is_empty() {
            write!(f, "PublicKey(empty)")
        } else {
            write!(f, "PublicKey({})", &self.to_hex()[..16.min(self.bytes.len() * 2)])
        }
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// An Ed25519 signature, 64 bytes when present, empty before signing.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl Signature {
    /// An empty placeholder, the state of a transaction before signing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// `true` if no signature is present.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex representation, 128 characters for a valid signature.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bytes.is_empty() {
            write!(f, "Signature(empty)")
        } else {
            let hex_str = self.to_hex();
            write!(f, "Signature({}...)", &hex_str[..8.min(hex_str.len())])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let kp = Keypair::generate();
        let msg = b"transfer 100 aurum";
        let sig = kp.sign(msg);
        assert!(kp.public_key().verify(msg, &sig));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"correct message");
        assert!(!kp.public_key().verify(b"wrong message", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.public_key().verify(b"message", &sig));
    }

    #[test]
    fn deterministic_from_seed() {
        let seed = [42u8; 32];
        let kp1 = Keypair::from_seed(&seed);
        let kp2 = Keypair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn deterministic_signatures() {
        let kp = Keypair::generate();
        let msg = b"determinism is underrated";
        assert_eq!(kp.sign(msg), kp.sign(msg));
    }

    #[test]
    fn empty_key_and_signature_fail_verification() {
        assert!(!PublicKey::empty().verify(b"msg", &Signature::empty()));

        let kp = Keypair::generate();
        assert!(!kp.public_key().verify(b"msg", &Signature::empty()));
    }

    #[test]
    fn truncated_signature_fails_verification() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"msg");
        let truncated = Signature::from_bytes(sig.as_bytes()[..32].to_vec());
        assert!(!kp.public_key().verify(b"msg", &truncated));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = Keypair::generate();
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("Keypair(pub="));
        assert!(!debug_str.contains("signing_key"));
    }

    #[test]
    fn invalid_public_key_bytes_rejected() {
        let short = PublicKey::from_bytes(vec![1, 2, 3]);
        assert!(short.to_verifying_key().is_err());
    }
}
