//! # Error Taxonomy
//!
//! [`CoreError`] is the single error type the ledger core returns, and
//! [`CoreResult`] the matching result alias. The variants separate the
//! distinct failure modes the rest of the crate distinguishes by pattern
//! match: decode/tag failures, missing keys, the three transaction
//! rejections (which never mutate ledger state and are retryable), and the
//! underlying storage-engine failure (always fatal to the current
//! operation, never retried internally).

use thiserror::Error;

/// The single error taxonomy of the ledger core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A value could not be decoded, or carried the wrong kind tag.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// An encoded value carried a kind tag outside the closed variant set.
    #[error("unknown record kind tag: {0}")]
    UnknownKind(u8),

    /// A lookup found no value under the given key.
    #[error("not found: {0}")]
    NotFound(String),

    /// A signature failed to verify, or the embedded public key was invalid.
    #[error("bad signature")]
    BadSignature,

    /// The embedded public key does not derive the declared sender address.
    #[error("address does not match public key")]
    AddressMismatch,

    /// A transaction's sequence number did not match the account's next
    /// expected sequence.
    #[error("sequence mismatch: expected {expected}, got {got}")]
    SequenceMismatch { expected: u64, got: u64 },

    /// The account balance cannot cover the transaction's amount plus gas.
    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: i64, required: i64 },

    /// The underlying storage engine failed. Always fatal to the current
    /// operation.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),
}

/// The result type returned throughout the ledger core.
pub type CoreResult<T> = Result<T, CoreError>;
