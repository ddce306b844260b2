//! # Transactions
//!
//! [`Transaction`] is the signed unit of intent: account A moves `amount` to
//! `destination` and pays `gas`, at sequence position `sequence` in A's
//! stream. [`TransactionWithData`] pairs the transaction with the receipt its
//! processing produced. That pair, not the bare transaction, is what the
//! ledger persists and indexes.

use serde::{Deserialize, Serialize};

use crate::codec::{self, Record, RecordKind};
use crate::crypto::signer::{seal, Signable};
use crate::crypto::{Address, Hash, PublicKey, Signature};
use crate::error::CoreResult;
use crate::ledger::receipt::Receipt;

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// Discriminant for the operation a transaction represents.
///
/// A closed set: balance transfer is the only operation this core admits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Value transfer between two accounts.
    #[default]
    Transfer,
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A signed balance transfer.
///
/// `public_key` and `signature` are empty until [`crate::crypto::sign`] runs;
/// the signature covers the envelope encoding with the signature field blank,
/// while `hash` is the content digest of the fully-signed encoding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Content hash of the signed encoding. Not serialized; restored on decode.
    #[serde(skip)]
    pub hash: Hash,

    /// The operation kind.
    pub transaction_type: TransactionType,

    /// The sending account.
    pub account: Address,

    /// Per-account monotonic counter, 1-based. Prevents replay and enforces
    /// ordering.
    pub sequence: u64,

    /// Amount credited to the destination.
    pub amount: i64,

    /// Gas paid to the collector account.
    pub gas: i64,

    /// The receiving account.
    pub destination: Address,

    /// Opaque application payload.
    pub payload: Vec<u8>,

    /// The sender's public key, written during signing.
    pub public_key: PublicKey,

    /// Ed25519 signature, written during signing.
    pub signature: Signature,
}

impl Transaction {
    /// Build an unsigned transfer.
    pub fn new(
        account: Address,
        sequence: u64,
        amount: i64,
        gas: i64,
        destination: Address,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            hash: Hash::ZERO,
            transaction_type: TransactionType::Transfer,
            account,
            sequence,
            amount,
            gas,
            destination,
            payload,
            public_key: PublicKey::empty(),
            signature: Signature::empty(),
        }
    }

    /// `true` once a signature is attached.
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }
}

impl Record for Transaction {
    const KIND: RecordKind = RecordKind::Transaction;

    fn set_hash(&mut self, hash: Hash) {
        self.hash = hash;
    }
}

impl Signable for Transaction {
    fn sender(&self) -> &Address {
        &self.account
    }

    fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    fn set_public_key(&mut self, pk: PublicKey) {
        self.public_key = pk;
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn set_signature(&mut self, sig: Signature) {
        self.signature = sig;
    }

    fn signable_bytes(&self) -> CoreResult<Vec<u8>> {
        let mut unsigned = self.clone();
        unsigned.signature = Signature::empty();
        codec::encode(&unsigned)
    }
}

// ---------------------------------------------------------------------------
// TransactionWithData
// ---------------------------------------------------------------------------

/// A processed transaction together with its receipt: the unit the ledger
/// actually persists and indexes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionWithData {
    /// Content hash of the encoded pair. Not serialized; restored on decode.
    #[serde(skip)]
    pub hash: Hash,

    /// The signed transaction.
    pub transaction: Transaction,

    /// The receipt its processing produced.
    pub receipt: Receipt,
}

impl TransactionWithData {
    /// Pair a transaction with its receipt.
    pub fn new(transaction: Transaction, receipt: Receipt) -> Self {
        Self {
            hash: Hash::ZERO,
            transaction,
            receipt,
        }
    }
}

impl Record for TransactionWithData {
    const KIND: RecordKind = RecordKind::TransactionWithData;

    fn set_hash(&mut self, hash: Hash) {
        self.hash = hash;
    }

    fn seal_children(&mut self) -> CoreResult<()> {
        seal(&mut self.transaction)?;
        self.receipt.seal_children()?;
        seal(&mut self.receipt)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{sign, Keypair};
    use crate::ledger::state::{AccountState, State};

    fn signed_tx() -> Transaction {
        let kp = Keypair::from_seed(&[11u8; 32]);
        let mut tx = Transaction::new(
            Address::from_public_key(&kp.public_key()),
            1,
            100,
            10,
            Address::from_bytes([2u8; 32]),
            vec![1, 2, 3, 4],
        );
        sign(&kp, &mut tx).unwrap();
        tx
    }

    #[test]
    fn transaction_roundtrip() {
        let tx = signed_tx();
        let bytes = codec::encode(&tx).unwrap();
        assert_eq!(bytes[0], 101);

        let recovered: Transaction = codec::decode(&bytes).unwrap();
        assert_eq!(recovered, tx);
        assert_eq!(recovered.hash, tx.hash);
    }

    #[test]
    fn unsigned_transaction_has_empty_signing_fields() {
        let tx = Transaction::new(
            Address::from_bytes([1u8; 32]),
            1,
            50,
            5,
            Address::from_bytes([2u8; 32]),
            Vec::new(),
        );
        assert!(!tx.is_signed());
        assert!(tx.public_key.is_empty());
        assert!(tx.hash.is_zero());
    }

    #[test]
    fn signable_bytes_blank_the_signature_only() {
        let tx = signed_tx();
        let signable = tx.signable_bytes().unwrap();

        let mut unsigned = tx.clone();
        unsigned.signature = Signature::empty();
        assert_eq!(signable, codec::encode(&unsigned).unwrap());
        // The public key stays in the signable form.
        assert_ne!(signable, {
            let mut stripped = unsigned.clone();
            stripped.public_key = PublicKey::empty();
            codec::encode(&stripped).unwrap()
        });
    }

    #[test]
    fn with_data_roundtrip_restores_nested_hashes() {
        let tx = signed_tx();
        let delta = State::Account(AccountState {
            hash: Hash::ZERO,
            block_index: 1,
            account: tx.account,
            sequence: 1,
            amount: 890,
        });
        let mut twd = TransactionWithData::new(tx, Receipt::success(vec![delta]));
        twd.seal_children().unwrap();
        let (hash, bytes) = seal(&mut twd).unwrap();
        assert_eq!(bytes[0], 103);

        let recovered: TransactionWithData = codec::decode(&bytes).unwrap();
        assert_eq!(recovered, twd);
        assert_eq!(recovered.hash, hash);
        assert!(!recovered.transaction.hash.is_zero());
        assert!(!recovered.receipt.hash.is_zero());
        assert!(!recovered.receipt.states[0].hash().is_zero());
    }

    #[test]
    fn decoding_with_wrong_tag_fails() {
        let tx = signed_tx();
        let bytes = codec::encode(&tx).unwrap();
        let result: CoreResult<TransactionWithData> = codec::decode(&bytes);
        assert!(result.is_err());
    }
}
