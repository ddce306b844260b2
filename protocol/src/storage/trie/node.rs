//! Trie node types.
//!
//! Three node shapes plus the empty sentinel. A node's identity is the
//! SHA-256 digest of its encoding, which is also its key in the underlying
//! store. Content addressing all the way down.

use serde::{Deserialize, Serialize};

use crate::crypto::Hash;
use crate::error::{CoreError, CoreResult};

use super::nibbles::Nibbles;

/// A node in the Merkle Patricia trie.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrieNode {
    /// Absence of data. Hashes to the zero sentinel and is never stored.
    #[default]
    Empty,

    /// Terminal node: the remaining key nibbles and the stored value.
    Leaf { partial: Vec<u8>, value: Vec<u8> },

    /// Path compression: shared nibbles leading to a single child.
    Extension { partial: Vec<u8>, child: Hash },

    /// 16-way fanout, one slot per nibble, plus an optional value for keys
    /// that terminate here.
    Branch {
        children: [Option<Hash>; 16],
        value: Option<Vec<u8>>,
    },
}

impl TrieNode {
    /// A leaf holding `value` at the end of `partial`.
    pub fn leaf(partial: Nibbles, value: Vec<u8>) -> Self {
        TrieNode::Leaf {
            partial: partial.as_slice().to_vec(),
            value,
        }
    }

    /// An extension covering `partial` on the way to `child`.
    pub fn extension(partial: Nibbles, child: Hash) -> Self {
        TrieNode::Extension {
            partial: partial.as_slice().to_vec(),
            child,
        }
    }

    /// An empty branch.
    pub fn branch() -> Self {
        TrieNode::Branch {
            children: [None; 16],
            value: None,
        }
    }

    /// A branch with the given slots filled.
    pub fn branch_with(children: [Option<Hash>; 16], value: Option<Vec<u8>>) -> Self {
        TrieNode::Branch { children, value }
    }

    /// `true` for the empty sentinel.
    pub fn is_empty(&self) -> bool {
        matches!(self, TrieNode::Empty)
    }

    /// The node's content hash, which doubles as its storage key.
    ///
    /// The empty node hashes to [`Hash::ZERO`] without touching the encoder.
    pub fn node_hash(&self) -> CoreResult<Hash> {
        if self.is_empty() {
            return Ok(Hash::ZERO);
        }
        Ok(Hash::of(&self.to_bytes()?))
    }

    /// Encode the node for storage.
    pub fn to_bytes(&self) -> CoreResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CoreError::MalformedPayload(e.to_string()))
    }

    /// Decode a stored node.
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        bincode::deserialize(bytes).map_err(|e| CoreError::MalformedPayload(e.to_string()))
    }
}
