//! # Ledger Store
//!
//! The persistence layer of the ledger: four independent Merkle tries over
//! four named namespaces of one sled database.
//!
//! | Trie          | Key                          | Value                     |
//! |---------------|------------------------------|---------------------------|
//! | `block`       | content hash (32B)           | tagged Block              |
//! | `transaction` | content hash (32B)           | tagged TransactionWithData|
//! | `receipt`     | content hash (32B)           | tagged Receipt or State   |
//! | `index`       | composite text key (UTF-8)   | 32-byte content hash      |
//!
//! States share the receipt trie rather than getting a fifth one. The index
//! trie stores only forwarding pointers, never primary content; its keys are
//! namespaced text so entity kinds cannot collide:
//!
//! ```text
//! block@{blockIndex}
//! transaction@{txInnerHash}
//! transaction@{senderAddressText}:{sequence}
//! state@{key}
//! state@{key}:{sequence}
//! ```
//!
//! `state@{key}` is overwritten on every version and always points at the
//! latest one, giving O(1) "current value" lookup; `state@{key}:{sequence}` keeps
//! each historical version reachable.

use std::path::Path;

use crate::codec::{self, Record};
use crate::crypto::signer::seal;
use crate::crypto::{Address, Hash};
use crate::error::{CoreError, CoreResult};
use crate::ledger::block::Block;
use crate::ledger::receipt::Receipt;
use crate::ledger::state::{AccountState, State};
use crate::ledger::transaction::TransactionWithData;
use crate::storage::trie::TrieStore;

// ---------------------------------------------------------------------------
// Index key grammar
// ---------------------------------------------------------------------------

fn block_key(index: u64) -> String {
    format!("block@{}", index)
}

fn hash_key(name: &str, hash: &Hash) -> String {
    format!("{}@{}", name, hash)
}

fn name_key(name: &str, key: &str) -> String {
    format!("{}@{}", name, key)
}

fn index_key(key: &str, index: u64) -> String {
    format!("{}:{}", key, index)
}

// ---------------------------------------------------------------------------
// LedgerStore
// ---------------------------------------------------------------------------

/// Hash-addressed storage for blocks, transactions, receipts and states,
/// with secondary indices for every human-facing lookup.
pub struct LedgerStore {
    /// The underlying database; kept so the four trees outlive their handles.
    _db: sled::Db,
    /// Forwarding pointers: composite text key -> content hash.
    index: TrieStore,
    /// Blocks by content hash.
    block: TrieStore,
    /// Transactions-with-data by content hash.
    transaction: TrieStore,
    /// Receipts and states by content hash (shared namespace).
    receipt: TrieStore,
}

impl LedgerStore {
    /// Open (or create) a ledger under the given directory.
    pub fn open<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// An in-memory ledger that disappears on drop. For tests.
    pub fn open_temporary() -> CoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> CoreResult<Self> {
        let index = TrieStore::open(db.open_tree("index")?)?;
        let block = TrieStore::open(db.open_tree("block")?)?;
        let transaction = TrieStore::open(db.open_tree("transaction")?)?;
        let receipt = TrieStore::open(db.open_tree("receipt")?)?;
        Ok(Self {
            _db: db,
            index,
            block,
            transaction,
            receipt,
        })
    }

    // -- Blocks -------------------------------------------------------------

    /// Persist a block, its index entry, and everything it contains.
    ///
    /// Writes `(hash -> block)` into the block trie and `block@{index}` into
    /// the index trie, then fans out into [`put_transaction`](Self::put_transaction)
    /// for every transaction the block carries. Hashes are written back onto
    /// the block and its children.
    pub fn put_block(&self, block: &mut Block) -> CoreResult<()> {
        block.seal_children()?;
        let (hash, data) = seal(block)?;
        self.block.put(hash.as_bytes(), &data)?;
        self.index
            .put(block_key(block.index).as_bytes(), hash.as_bytes())?;

        tracing::debug!(index = block.index, hash = %hash, "put block");

        for twd in &mut block.transactions {
            self.put_transaction(twd)?;
        }
        Ok(())
    }

    /// Resolve a block through the `block@{index}` pointer.
    pub fn get_block_by_index(&self, index: u64) -> CoreResult<Block> {
        let key = block_key(index);
        let hash = self.read_index(&key)?;
        self.get_block_by_hash(hash)
    }

    /// Load a block by its content hash.
    pub fn get_block_by_hash(&self, hash: Hash) -> CoreResult<Block> {
        let data = self
            .block
            .get(hash.as_bytes())?
            .ok_or_else(|| CoreError::NotFound(format!("block {}", hash)))?;
        codec::decode(&data)
    }

    // -- Transactions -------------------------------------------------------

    /// Persist a processed transaction and derive its two index entries:
    /// `transaction@{txInnerHash}` and `transaction@{sender}:{sequence}`,
    /// both pointing at the pair's content hash. The embedded receipt is
    /// persisted recursively.
    pub fn put_transaction(&self, twd: &mut TransactionWithData) -> CoreResult<()> {
        twd.seal_children()?;
        let (hash, data) = seal(twd)?;
        self.transaction.put(hash.as_bytes(), &data)?;

        let tx_key = hash_key("transaction", &twd.transaction.hash);
        self.index.put(tx_key.as_bytes(), hash.as_bytes())?;

        let address = twd.transaction.account.to_text();
        let account_key = name_key("transaction", &index_key(&address, twd.transaction.sequence));
        self.index.put(account_key.as_bytes(), hash.as_bytes())?;

        self.put_receipt(&mut twd.receipt)
    }

    /// Load a transaction-with-data by its own content hash.
    pub fn get_transaction(&self, hash: Hash) -> CoreResult<TransactionWithData> {
        let data = self
            .transaction
            .get(hash.as_bytes())?
            .ok_or_else(|| CoreError::NotFound(format!("transaction {}", hash)))?;
        codec::decode(&data)
    }

    /// Resolve through `transaction@{txInnerHash}`: lookup by the inner
    /// transaction's hash, which is what wallets hold.
    pub fn get_transaction_by_hash(&self, tx_hash: Hash) -> CoreResult<TransactionWithData> {
        let hash = self.read_index(&hash_key("transaction", &tx_hash))?;
        self.get_transaction(hash)
    }

    /// Resolve through `transaction@{sender}:{sequence}`.
    pub fn get_transaction_by_index(
        &self,
        account: &Address,
        sequence: u64,
    ) -> CoreResult<TransactionWithData> {
        let key = name_key("transaction", &index_key(&account.to_text(), sequence));
        let hash = self.read_index(&key)?;
        self.get_transaction(hash)
    }

    // -- Receipts -----------------------------------------------------------

    /// Persist a receipt: every embedded state first, then the receipt
    /// itself under its content hash.
    pub fn put_receipt(&self, receipt: &mut Receipt) -> CoreResult<()> {
        for state in &mut receipt.states {
            self.put_state(state)?;
        }
        let (hash, data) = seal(receipt)?;
        self.receipt.put(hash.as_bytes(), &data)
    }

    /// Load a receipt by its content hash.
    pub fn get_receipt(&self, hash: Hash) -> CoreResult<Receipt> {
        let data = self
            .receipt
            .get(hash.as_bytes())?
            .ok_or_else(|| CoreError::NotFound(format!("receipt {}", hash)))?;
        codec::decode(&data)
    }

    /// The receipt of the transaction with the given inner hash.
    pub fn get_receipt_by_transaction_hash(&self, tx_hash: Hash) -> CoreResult<Receipt> {
        Ok(self.get_transaction_by_hash(tx_hash)?.receipt)
    }

    // -- States -------------------------------------------------------------

    /// Persist a state into the receipt trie and derive its two index
    /// entries: the sequence-versioned `state@{key}:{index}` and the
    /// always-overwritten `state@{key}` latest pointer.
    pub fn put_state(&self, state: &mut State) -> CoreResult<()> {
        let (hash, data) = state.seal()?;
        self.receipt.put(hash.as_bytes(), &data)?;

        let key = state.state_key();
        let versioned = name_key("state", &index_key(&key, state.index()));
        self.index.put(versioned.as_bytes(), hash.as_bytes())?;

        let latest = name_key("state", &key);
        self.index.put(latest.as_bytes(), hash.as_bytes())
    }

    /// Load a state by its content hash.
    pub fn get_state(&self, hash: Hash) -> CoreResult<State> {
        let data = self
            .receipt
            .get(hash.as_bytes())?
            .ok_or_else(|| CoreError::NotFound(format!("state {}", hash)))?;
        State::from_bytes(&data)
    }

    /// The latest version of the state under `key`, if the key has ever
    /// been written.
    pub fn get_state_by_key(&self, key: &str) -> CoreResult<Option<State>> {
        match self.index.get(name_key("state", key).as_bytes())? {
            Some(pointer) => {
                let hash = decode_pointer(&pointer)?;
                Ok(Some(self.get_state(hash)?))
            }
            None => Ok(None),
        }
    }

    /// A specific historical version of the state under `key`.
    pub fn get_state_by_index(&self, key: &str, index: u64) -> CoreResult<Option<State>> {
        let versioned = name_key("state", &index_key(key, index));
        match self.index.get(versioned.as_bytes())? {
            Some(pointer) => {
                let hash = decode_pointer(&pointer)?;
                Ok(Some(self.get_state(hash)?))
            }
            None => Ok(None),
        }
    }

    /// The current account state for an address, or `None` for an account
    /// that has never been funded. Absence is a legitimate answer here, not
    /// an error.
    pub fn get_account(&self, address: &str) -> CoreResult<Option<AccountState>> {
        match self.get_state_by_key(address)? {
            Some(State::Account(state)) => Ok(Some(state)),
            Some(other) => Err(CoreError::MalformedPayload(format!(
                "state under account key is a {}",
                other.kind().name()
            ))),
            None => Ok(None),
        }
    }

    // -- Roots --------------------------------------------------------------

    /// Root digest of the transaction trie, for embedding into a block.
    pub fn transaction_root(&self) -> Hash {
        self.transaction.root()
    }

    /// Root digest of the receipt trie, for embedding into a block.
    pub fn receipt_root(&self) -> Hash {
        self.receipt.root()
    }

    // -- Commit / cancel ----------------------------------------------------

    /// Commit all four tries, in the fixed order index, block, transaction,
    /// receipt.
    ///
    /// There is no two-phase protocol across the tries: if a commit fails
    /// partway, the tries before it are committed and the rest are not, and
    /// this layer cannot undo that. Callers must treat a partial commit as
    /// fatal and reconcile externally.
    pub fn commit(&self) -> CoreResult<()> {
        tracing::debug!("ledger commit");
        self.index.commit()?;
        self.block.commit()?;
        self.transaction.commit()?;
        self.receipt.commit()?;
        Ok(())
    }

    /// Discard staged writes on all four tries, in the same fixed order.
    pub fn cancel(&self) {
        tracing::debug!("ledger cancel");
        self.index.cancel();
        self.block.cancel();
        self.transaction.cancel();
        self.receipt.cancel();
    }

    // -- Internals ----------------------------------------------------------

    /// Read a forwarding pointer from the index trie.
    fn read_index(&self, key: &str) -> CoreResult<Hash> {
        let pointer = self
            .index
            .get(key.as_bytes())?
            .ok_or_else(|| CoreError::NotFound(key.to_string()))?;
        decode_pointer(&pointer)
    }
}

/// Interpret an index value as a content hash.
fn decode_pointer(pointer: &[u8]) -> CoreResult<Hash> {
    Hash::try_from_slice(pointer)
        .ok_or_else(|| CoreError::MalformedPayload("index entry is not a hash".to_string()))
}
