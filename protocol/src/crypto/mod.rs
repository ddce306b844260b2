//! # Cryptographic Primitives
//!
//! Everything security-related the ledger core consumes: content digests,
//! Ed25519 key material, address derivation, and the seal/sign/verify
//! service operating over the domain records' capability contracts.
//!
//! Key generation and the signature algorithm come from `ed25519-dalek`;
//! this module wraps them behind the narrow surface the ledger needs.

pub mod address;
pub mod hash;
pub mod keys;
pub mod signer;

pub use address::Address;
pub use hash::Hash;
pub use keys::{Keypair, PublicKey, Signature};
pub use signer::{seal, sign, verify, Signable};
