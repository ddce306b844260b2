//! # Blocks
//!
//! A block aggregates an ordered run of processed transactions under one
//! index in the chain. It owns its transactions and receipts by value:
//! they are copied in at construction and never shared.
//!
//! `transaction_root` and `receipt_root` are the trie roots captured when
//! the block was built. They are part of the encoded (and therefore hashed)
//! form, and they are **authoritative after decode**: a loaded block reports
//! the roots it was built with, never roots recomputed from current state.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::codec::{Record, RecordKind};
use crate::config::GENESIS_INDEX;
use crate::crypto::signer::seal;
use crate::crypto::Hash;
use crate::error::CoreResult;
use crate::ledger::receipt::Receipt;
use crate::ledger::transaction::TransactionWithData;

/// One block of the chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Content hash of the encoded block. Not serialized; restored on decode.
    #[serde(skip)]
    pub hash: Hash,

    /// Monotonic block index; the genesis block is 0.
    pub index: u64,

    /// Hash of the parent block. All zeros for genesis.
    pub parent_hash: Hash,

    /// Transaction trie root captured when this block was built.
    pub transaction_root: Hash,

    /// Receipt trie root captured when this block was built.
    pub receipt_root: Hash,

    /// Unix timestamp in milliseconds at construction time.
    pub timestamp: i64,

    /// The processed transactions included in this block, in order.
    pub transactions: Vec<TransactionWithData>,

    /// The receipts of those transactions, in the same order.
    pub receipts: Vec<Receipt>,
}

impl Block {
    /// The genesis block: index 0, zero parent, no transactions.
    ///
    /// Timestamp zero keeps genesis identical on every node.
    pub fn genesis() -> Self {
        Self {
            hash: Hash::ZERO,
            index: GENESIS_INDEX,
            parent_hash: Hash::ZERO,
            transaction_root: Hash::ZERO,
            receipt_root: Hash::ZERO,
            timestamp: 0,
            transactions: Vec::new(),
            receipts: Vec::new(),
        }
    }

    /// Build a block over the given processed transactions.
    ///
    /// The block takes ownership of the transactions, copies their receipts
    /// into its own receipt sequence, and stamps its index onto every state
    /// they carry. The roots come from the caller: the trie roots at the
    /// time the block is assembled.
    pub fn new(
        index: u64,
        parent_hash: Hash,
        transaction_root: Hash,
        receipt_root: Hash,
        mut transactions: Vec<TransactionWithData>,
    ) -> Self {
        for twd in &mut transactions {
            for state in &mut twd.receipt.states {
                state.set_block_index(index);
            }
        }
        let receipts = transactions.iter().map(|twd| twd.receipt.clone()).collect();

        Self {
            hash: Hash::ZERO,
            index,
            parent_hash,
            transaction_root,
            receipt_root,
            timestamp: Utc::now().timestamp_millis(),
            transactions,
            receipts,
        }
    }
}

impl Record for Block {
    const KIND: RecordKind = RecordKind::Block;

    fn set_hash(&mut self, hash: Hash) {
        self.hash = hash;
    }

    fn seal_children(&mut self) -> CoreResult<()> {
        for twd in &mut self.transactions {
            twd.seal_children()?;
            seal(twd)?;
        }
        for receipt in &mut self.receipts {
            receipt.seal_children()?;
            seal(receipt)?;
        }
        Ok(())
    }
}
