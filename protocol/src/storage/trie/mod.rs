//! # Merkle Trie Store
//!
//! A Merkle Patricia trie over one key-value namespace. Keys are opaque byte
//! strings (content hashes or composite text keys); values are the tagged
//! record encodings. Every node is stored under its own content hash, so the
//! root digest authenticates the entire dataset.
//!
//! ## Staging model
//!
//! `put` stages new nodes in an in-memory dirty map and moves the root
//! immediately; the staged root and the committed root are the same value
//! as far as readers are concerned. `commit` flushes the staged nodes plus
//! the root pointer to the underlying engine in one batch; `cancel` drops
//! the staged nodes and rewinds the root to the last committed one.
//!
//! Stale nodes from overwritten paths are never deleted. The trie is
//! append-oriented; old roots simply stop being reachable.
//!
//! ## Locking
//!
//! [`TrieStore`] serializes access with a single reader/writer lock: reads
//! proceed concurrently, any put/commit/cancel excludes everything else on
//! that trie. The underlying engine's own thread safety is not relied upon.

mod nibbles;
mod node;

pub use nibbles::Nibbles;
pub use node::TrieNode;

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::crypto::Hash;
use crate::error::{CoreError, CoreResult};

/// Reserved key holding the committed root pointer.
///
/// Node keys are exactly 32 bytes, so a 4-byte key can never collide.
const ROOT_KEY: &[u8] = b"root";

// ---------------------------------------------------------------------------
// MerkleTrie
// ---------------------------------------------------------------------------

/// The trie structure itself, without locking. Use [`TrieStore`] unless you
/// already hold exclusive access.
pub struct MerkleTrie {
    /// The underlying key-value namespace.
    tree: sled::Tree,
    /// Current root, reflecting committed state plus staged writes.
    root: Hash,
    /// Root as of the last successful commit (or open).
    committed_root: Hash,
    /// Staged nodes, keyed by their content hash.
    dirty: HashMap<Hash, TrieNode>,
}

impl MerkleTrie {
    /// Open a trie over the given namespace, reloading the committed root.
    pub fn open(tree: sled::Tree) -> CoreResult<Self> {
        let root = match tree.get(ROOT_KEY)? {
            Some(bytes) => Hash::try_from_slice(&bytes).ok_or_else(|| {
                CoreError::MalformedPayload("invalid trie root pointer".to_string())
            })?,
            None => Hash::ZERO,
        };
        Ok(Self {
            tree,
            root,
            committed_root: root,
            dirty: HashMap::new(),
        })
    }

    /// The current root digest.
    pub fn root(&self) -> Hash {
        self.root
    }

    /// Look up a key. `Ok(None)` means genuine absence.
    pub fn get(&self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        if self.root.is_zero() {
            return Ok(None);
        }
        let path = Nibbles::from_bytes(key);
        self.get_at(self.root, &path, 0)
    }

    /// Stage a write. The root moves immediately; durability comes with
    /// [`commit`](Self::commit).
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> CoreResult<()> {
        let path = Nibbles::from_bytes(key);
        self.root = self.insert_at(self.root, &path, 0, value.to_vec())?;
        Ok(())
    }

    /// Persist all staged nodes and the root pointer in one batch.
    pub fn commit(&mut self) -> CoreResult<()> {
        let mut batch = sled::Batch::default();
        for (hash, node) in &self.dirty {
            batch.insert(&hash.as_bytes()[..], node.to_bytes()?);
        }
        batch.insert(ROOT_KEY, &self.root.as_bytes()[..]);
        self.tree.apply_batch(batch)?;
        self.tree.flush()?;

        tracing::debug!(staged = self.dirty.len(), root = %self.root, "trie commit");
        self.dirty.clear();
        self.committed_root = self.root;
        Ok(())
    }

    /// Discard staged nodes and rewind the root to the last committed one.
    pub fn cancel(&mut self) {
        tracing::debug!(staged = self.dirty.len(), root = %self.committed_root, "trie cancel");
        self.dirty.clear();
        self.root = self.committed_root;
    }

    // -- Node access --------------------------------------------------------

    /// Load a node: staged nodes shadow the engine.
    ///
    /// A referenced node that exists in neither place is corruption, surfaced
    /// as `NotFound`.
    fn load_node(&self, hash: Hash) -> CoreResult<TrieNode> {
        if hash.is_zero() {
            return Ok(TrieNode::Empty);
        }
        if let Some(node) = self.dirty.get(&hash) {
            return Ok(node.clone());
        }
        match self.tree.get(hash.as_bytes())? {
            Some(bytes) => TrieNode::from_bytes(&bytes),
            None => Err(CoreError::NotFound(format!("trie node {}", hash))),
        }
    }

    /// Stage a node and return its hash.
    fn store_node(&mut self, node: TrieNode) -> CoreResult<Hash> {
        let hash = node.node_hash()?;
        if !node.is_empty() {
            self.dirty.insert(hash, node);
        }
        Ok(hash)
    }

    // -- Traversal ----------------------------------------------------------

    fn get_at(&self, node_hash: Hash, path: &Nibbles, offset: usize) -> CoreResult<Option<Vec<u8>>> {
        if node_hash.is_zero() {
            return Ok(None);
        }
        match self.load_node(node_hash)? {
            TrieNode::Empty => Ok(None),
            TrieNode::Leaf { partial, value } => {
                if path.suffix(offset) == Nibbles::from_raw(partial) {
                    Ok(Some(value))
                } else {
                    Ok(None)
                }
            }
            TrieNode::Extension { partial, child } => {
                let partial = Nibbles::from_raw(partial);
                if path.suffix(offset).starts_with(&partial) {
                    self.get_at(child, path, offset + partial.len())
                } else {
                    Ok(None)
                }
            }
            TrieNode::Branch { children, value } => {
                let Some(nibble) = path.get(offset) else {
                    return Ok(value);
                };
                match children[nibble as usize] {
                    Some(child) => self.get_at(child, path, offset + 1),
                    None => Ok(None),
                }
            }
        }
    }

    fn insert_at(
        &mut self,
        node_hash: Hash,
        path: &Nibbles,
        offset: usize,
        value: Vec<u8>,
    ) -> CoreResult<Hash> {
        let remaining = path.suffix(offset);
        if node_hash.is_zero() {
            return self.store_node(TrieNode::leaf(remaining, value));
        }

        match self.load_node(node_hash)? {
            TrieNode::Empty => self.store_node(TrieNode::leaf(remaining, value)),

            TrieNode::Leaf {
                partial,
                value: existing_value,
            } => {
                let existing = Nibbles::from_raw(partial);
                let common = remaining.common_prefix_len(&existing);

                // Same key: overwrite in place.
                if common == existing.len() && common == remaining.len() {
                    return self.store_node(TrieNode::leaf(remaining, value));
                }

                // The keys diverge; split into a branch. At most one of the
                // two can terminate at the branch itself.
                let mut children: [Option<Hash>; 16] = [None; 16];
                let mut branch_value = None;

                if common == existing.len() {
                    branch_value = Some(existing_value);
                } else {
                    let nibble = existing.as_slice()[common] as usize;
                    let rest = existing.suffix(common + 1);
                    children[nibble] = Some(self.store_node(TrieNode::leaf(rest, existing_value))?);
                }

                if common == remaining.len() {
                    branch_value = Some(value);
                } else {
                    let nibble = remaining.as_slice()[common] as usize;
                    let rest = remaining.suffix(common + 1);
                    children[nibble] = Some(self.store_node(TrieNode::leaf(rest, value))?);
                }

                let branch = self.store_node(TrieNode::branch_with(children, branch_value))?;
                if common > 0 {
                    self.store_node(TrieNode::extension(remaining.prefix(common), branch))
                } else {
                    Ok(branch)
                }
            }

            TrieNode::Extension { partial, child } => {
                let ext = Nibbles::from_raw(partial);
                let common = remaining.common_prefix_len(&ext);

                // The extension is fully on our path: recurse into its child.
                if common == ext.len() {
                    let new_child = self.insert_at(child, path, offset + ext.len(), value)?;
                    return self.store_node(TrieNode::extension(ext, new_child));
                }

                // Split the extension at the divergence point.
                let mut children: [Option<Hash>; 16] = [None; 16];
                let mut branch_value = None;

                let ext_nibble = ext.as_slice()[common] as usize;
                children[ext_nibble] = Some(if common + 1 < ext.len() {
                    self.store_node(TrieNode::extension(ext.suffix(common + 1), child))?
                } else {
                    child
                });

                if common == remaining.len() {
                    branch_value = Some(value);
                } else {
                    let nibble = remaining.as_slice()[common] as usize;
                    let rest = remaining.suffix(common + 1);
                    children[nibble] = Some(self.store_node(TrieNode::leaf(rest, value))?);
                }

                let branch = self.store_node(TrieNode::branch_with(children, branch_value))?;
                if common > 0 {
                    self.store_node(TrieNode::extension(remaining.prefix(common), branch))
                } else {
                    Ok(branch)
                }
            }

            TrieNode::Branch {
                mut children,
                value: branch_value,
            } => {
                let Some(nibble) = remaining.get(0) else {
                    // Key terminates at this branch.
                    return self.store_node(TrieNode::branch_with(children, Some(value)));
                };
                let child = children[nibble as usize].unwrap_or(Hash::ZERO);
                let new_child = self.insert_at(child, path, offset + 1, value)?;
                children[nibble as usize] = Some(new_child);
                self.store_node(TrieNode::branch_with(children, branch_value))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TrieStore
// ---------------------------------------------------------------------------

/// A [`MerkleTrie`] behind one reader/writer lock.
///
/// Reads share the lock; any put/commit/cancel takes it exclusively. This is
/// the single-writer-per-trie concurrency model; no operation relies on the
/// storage engine being independently thread-safe.
pub struct TrieStore {
    inner: RwLock<MerkleTrie>,
}

impl TrieStore {
    /// Open a locked trie over the given namespace.
    pub fn open(tree: sled::Tree) -> CoreResult<Self> {
        Ok(Self {
            inner: RwLock::new(MerkleTrie::open(tree)?),
        })
    }

    /// Look up a key (shared lock).
    pub fn get(&self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        self.inner.read().get(key)
    }

    /// Stage a write (exclusive lock).
    pub fn put(&self, key: &[u8], value: &[u8]) -> CoreResult<()> {
        self.inner.write().put(key, value)
    }

    /// The current root digest (shared lock).
    pub fn root(&self) -> Hash {
        self.inner.read().root()
    }

    /// Persist staged writes (exclusive lock).
    pub fn commit(&self) -> CoreResult<()> {
        self.inner.write().commit()
    }

    /// Discard staged writes (exclusive lock).
    pub fn cancel(&self) {
        self.inner.write().cancel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_trie() -> (sled::Db, MerkleTrie) {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .expect("temporary sled db");
        let tree = db.open_tree("trie").unwrap();
        (db, MerkleTrie::open(tree).unwrap())
    }

    #[test]
    fn empty_trie() {
        let (_db, trie) = temp_trie();
        assert_eq!(trie.root(), Hash::ZERO);
        assert!(trie.get(b"missing").unwrap().is_none());
    }

    #[test]
    fn put_then_get() {
        let (_db, mut trie) = temp_trie();
        trie.put(b"key", b"value").unwrap();
        assert_eq!(trie.get(b"key").unwrap(), Some(b"value".to_vec()));
        assert!(trie.get(b"other").unwrap().is_none());
    }

    #[test]
    fn root_moves_on_put() {
        let (_db, mut trie) = temp_trie();
        let root0 = trie.root();
        trie.put(b"a", b"1").unwrap();
        let root1 = trie.root();
        trie.put(b"b", b"2").unwrap();
        let root2 = trie.root();

        assert_ne!(root0, root1);
        assert_ne!(root1, root2);
    }

    #[test]
    fn overwrite_same_key() {
        let (_db, mut trie) = temp_trie();
        trie.put(b"key", b"one").unwrap();
        trie.put(b"key", b"two").unwrap();
        assert_eq!(trie.get(b"key").unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn shared_prefixes_and_prefix_keys() {
        let (_db, mut trie) = temp_trie();
        trie.put(b"abc", b"1").unwrap();
        trie.put(b"abd", b"2").unwrap();
        trie.put(b"abcdef", b"3").unwrap();
        trie.put(b"ab", b"4").unwrap();

        assert_eq!(trie.get(b"abc").unwrap(), Some(b"1".to_vec()));
        assert_eq!(trie.get(b"abd").unwrap(), Some(b"2".to_vec()));
        assert_eq!(trie.get(b"abcdef").unwrap(), Some(b"3".to_vec()));
        assert_eq!(trie.get(b"ab").unwrap(), Some(b"4".to_vec()));
        assert!(trie.get(b"abcde").unwrap().is_none());
    }

    #[test]
    fn deterministic_root_regardless_of_order() {
        let (_db1, mut trie1) = temp_trie();
        trie1.put(b"a", b"1").unwrap();
        trie1.put(b"b", b"2").unwrap();
        trie1.put(b"c", b"3").unwrap();

        let (_db2, mut trie2) = temp_trie();
        trie2.put(b"c", b"3").unwrap();
        trie2.put(b"a", b"1").unwrap();
        trie2.put(b"b", b"2").unwrap();

        assert_eq!(trie1.root(), trie2.root());
    }

    #[test]
    fn cancel_discards_staged_writes() {
        let (_db, mut trie) = temp_trie();
        trie.put(b"committed", b"yes").unwrap();
        trie.commit().unwrap();
        let committed_root = trie.root();

        trie.put(b"staged", b"no").unwrap();
        assert_ne!(trie.root(), committed_root);

        trie.cancel();
        assert_eq!(trie.root(), committed_root);
        assert_eq!(trie.get(b"committed").unwrap(), Some(b"yes".to_vec()));
        assert!(trie.get(b"staged").unwrap().is_none());
    }

    #[test]
    fn commit_survives_reopen() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let tree = db.open_tree("trie").unwrap();

        let root = {
            let mut trie = MerkleTrie::open(tree.clone()).unwrap();
            trie.put(b"key1", b"value1").unwrap();
            trie.put(b"key2", b"value2").unwrap();
            trie.commit().unwrap();
            trie.root()
        };

        // A fresh handle over the same namespace sees the committed state.
        let trie = MerkleTrie::open(tree).unwrap();
        assert_eq!(trie.root(), root);
        assert_eq!(trie.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(trie.get(b"key2").unwrap(), Some(b"value2".to_vec()));
    }

    #[test]
    fn uncommitted_writes_invisible_to_fresh_handle() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let tree = db.open_tree("trie").unwrap();

        {
            let mut trie = MerkleTrie::open(tree.clone()).unwrap();
            trie.put(b"staged", b"only").unwrap();
            // No commit.
        }

        let trie = MerkleTrie::open(tree).unwrap();
        assert_eq!(trie.root(), Hash::ZERO);
        assert!(trie.get(b"staged").unwrap().is_none());
    }

    #[test]
    fn locked_store_shares_reads() {
        use std::sync::Arc;
        use std::thread;

        let db = sled::Config::new().temporary(true).open().unwrap();
        let store = Arc::new(TrieStore::open(db.open_tree("trie").unwrap()).unwrap());
        for i in 0..16u8 {
            store.put(&[i], &[i, i]).unwrap();
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..16u8 {
                        assert_eq!(store.get(&[i]).unwrap(), Some(vec![i, i]));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("reader thread should not panic");
        }
    }
}
