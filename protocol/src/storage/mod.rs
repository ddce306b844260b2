//! # Storage
//!
//! Hash-addressed persistence for the ledger: a Merkle Patricia trie per
//! namespace ([`trie`]) and the four-trie [`LedgerStore`](store::LedgerStore)
//! with its secondary indices ([`store`]).

pub mod store;
pub mod trie;

pub use store::LedgerStore;
pub use trie::{MerkleTrie, TrieStore};
