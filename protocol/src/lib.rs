// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Aurum Protocol: Ledger Core
//!
//! The state-storage and transaction-processing core of an Aurum node: it
//! persists blocks, transactions, receipts and account state in
//! hash-addressed Merkle tries, maintains the secondary indices that make
//! them findable by human keys, and enforces the ledger's balance-transfer
//! invariants before a transaction makes it into a block.
//!
//! ## Architecture
//!
//! - **codec**: The typed envelope every persisted value travels in: one
//!   kind tag byte, then the record's binary encoding.
//! - **crypto**: Content digests, Ed25519 keys, address derivation, and the
//!   seal/sign/verify service.
//! - **ledger**: The domain records (Block, Transaction, Receipt, State)
//!   and the transaction processor.
//! - **storage**: A Merkle Patricia trie per namespace, and the four-trie
//!   ledger store with transactional commit/cancel.
//! - **config**: Chain constants and the handful of runtime knobs.
//!
//! Consensus, networking, and process bootstrap live elsewhere; this crate
//! only guarantees a single candidate block's internal consistency.
//!
//! ## Data Flow
//!
//! ```text
//! Transaction -> sign -> TransactionProcessor::verify
//!             -> TransactionProcessor::process -> TransactionWithData
//!             -> LedgerStore::put_transaction (+ indices)
//!             -> Block -> LedgerStore::put_block -> commit
//! ```

pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod storage;

pub use crypto::{Address, Hash, Keypair};
pub use error::{CoreError, CoreResult};
pub use ledger::{
    AccountState, Block, CurrencyState, Receipt, State, Transaction, TransactionProcessor,
    TransactionWithData,
};
pub use storage::LedgerStore;
