//! Merkle Tree for Note Commitments
//!
//! Sparse, fixed-depth Merkle tree used off-ledger to mirror both layers of
//! the accumulator: the active subtree (leaves are note commitments) and the
//! finalized tree (leaves are the roots of retired subtrees).
//!
//! ```text
//!                    Root
//!                   /    \
//!                 H01    H23
//!                /  \   /   \
//!               H0  H1 H2   H3
//!               |   |   |    |
//!              L0  L1  L2   L3
//! ```

use ark_bls12_381::Fr;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::PrivacyError;
use crate::poseidon;

/// Deepest supported tree (2^32 leaves)
pub const MAX_DEPTH: usize = 32;

static HASHER: LazyLock<MerkleHasher> = LazyLock::new(MerkleHasher::new);

/// A Merkle path proving inclusion of a leaf
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerklePath {
    /// Sibling hashes from leaf to root
    pub siblings: Vec<[u8; 32]>,
    /// Position bits (0 = left, 1 = right)
    pub path_bits: Vec<bool>,
    /// The leaf position
    pub position: u64,
}

impl MerklePath {
    /// Verify that this path proves inclusion of `leaf` in `root`
    pub fn verify(&self, leaf: &[u8; 32], root: &[u8; 32]) -> bool {
        let computed =
            MerkleHasher::shared().compute_root_from_path(leaf, &self.siblings, &self.path_bits);
        &computed == root
    }

    /// Get the authentication path as field elements (for ZK circuits)
    pub fn to_field_elements(&self) -> Vec<Fr> {
        self.siblings.iter().map(poseidon::from_bytes).collect()
    }
}

/// Poseidon-based Merkle hash function
pub struct MerkleHasher {
    /// Precomputed empty subtree roots at each level, `empty_roots[0]` is the empty leaf
    empty_roots: Vec<[u8; 32]>,
}

impl MerkleHasher {
    pub fn new() -> Self {
        let empty_leaf = poseidon::to_bytes(poseidon::hash(&[Fr::from(0u64)]));
        let mut empty_roots = Vec::with_capacity(MAX_DEPTH + 1);
        empty_roots.push(empty_leaf);

        let mut current = empty_leaf;
        for _ in 0..MAX_DEPTH {
            current = Self::hash_pair_raw(&current, &current);
            empty_roots.push(current);
        }

        Self { empty_roots }
    }

    /// Process-wide hasher; empty roots are computed once.
    pub fn shared() -> &'static MerkleHasher {
        &HASHER
    }

    /// Hash two children to get parent
    pub fn hash_pair(&self, left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
        Self::hash_pair_raw(left, right)
    }

    fn hash_pair_raw(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
        poseidon::to_bytes(poseidon::hash(&[
            poseidon::from_bytes(left),
            poseidon::from_bytes(right),
        ]))
    }

    /// Root of an empty subtree of the given height.
    ///
    /// `depth` must not exceed [`MAX_DEPTH`].
    pub fn empty_root(&self, depth: usize) -> &[u8; 32] {
        &self.empty_roots[depth.min(MAX_DEPTH)]
    }

    /// Compute root from leaf and authentication path
    pub fn compute_root_from_path(
        &self,
        leaf: &[u8; 32],
        siblings: &[[u8; 32]],
        path_bits: &[bool],
    ) -> [u8; 32] {
        let mut current = *leaf;

        for (sibling, is_right) in siblings.iter().zip(path_bits.iter()) {
            current = if *is_right {
                self.hash_pair(sibling, &current)
            } else {
                self.hash_pair(&current, sibling)
            };
        }

        current
    }
}

impl Default for MerkleHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Sparse Merkle tree with a fixed depth.
///
/// Only non-empty nodes are stored.
#[derive(Clone)]
pub struct MerkleTree {
    depth: usize,
    /// Non-empty nodes: (level, index) -> hash
    nodes: HashMap<(usize, u64), [u8; 32]>,
    next_index: u64,
    root: [u8; 32],
}

impl MerkleTree {
    /// Create a new empty tree of `depth` levels (capacity `2^depth`).
    pub fn new(depth: usize) -> Result<Self, PrivacyError> {
        if depth == 0 || depth > MAX_DEPTH {
            return Err(PrivacyError::InvalidDepth(depth));
        }

        Ok(Self {
            depth,
            nodes: HashMap::new(),
            next_index: 0,
            root: *MerkleHasher::shared().empty_root(depth),
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    pub fn root(&self) -> [u8; 32] {
        self.root
    }

    /// Next available position
    pub fn next_position(&self) -> u64 {
        self.next_index
    }

    pub fn is_full(&self) -> bool {
        self.next_index >= self.capacity()
    }

    /// Append a leaf and return its position
    pub fn insert(&mut self, leaf: [u8; 32]) -> Result<u64, PrivacyError> {
        if self.is_full() {
            return Err(PrivacyError::TreeFull {
                depth: self.depth,
                capacity: self.capacity(),
            });
        }

        let position = self.next_index;
        self.insert_at(position, leaf)?;
        self.next_index += 1;
        Ok(position)
    }

    /// Write a leaf at a specific position (for reconstruction)
    pub fn insert_at(&mut self, position: u64, leaf: [u8; 32]) -> Result<(), PrivacyError> {
        if position >= self.capacity() {
            return Err(PrivacyError::PositionOutOfRange {
                position,
                capacity: self.capacity(),
            });
        }

        let hasher = MerkleHasher::shared();
        self.nodes.insert((0, position), leaf);

        let mut current_index = position;
        let mut current_hash = leaf;

        for level in 0..self.depth {
            let is_right = current_index & 1 == 1;
            let sibling = self.node(level, current_index ^ 1);

            current_hash = if is_right {
                hasher.hash_pair(&sibling, &current_hash)
            } else {
                hasher.hash_pair(&current_hash, &sibling)
            };
            current_index /= 2;

            self.nodes.insert((level + 1, current_index), current_hash);
        }

        self.root = current_hash;
        self.next_index = self.next_index.max(position + 1);
        Ok(())
    }

    /// Get Merkle path for a position
    pub fn path(&self, position: u64) -> Option<MerklePath> {
        if position >= self.next_index {
            return None;
        }

        let mut siblings = Vec::with_capacity(self.depth);
        let mut path_bits = Vec::with_capacity(self.depth);
        let mut current_index = position;

        for level in 0..self.depth {
            path_bits.push(current_index & 1 == 1);
            siblings.push(self.node(level, current_index ^ 1));
            current_index /= 2;
        }

        Some(MerklePath {
            siblings,
            path_bits,
            position,
        })
    }

    /// Get the leaf at a position
    pub fn get(&self, position: u64) -> Option<[u8; 32]> {
        self.nodes.get(&(0, position)).copied()
    }

    fn node(&self, level: usize, index: u64) -> [u8; 32] {
        self.nodes
            .get(&(level, index))
            .copied()
            .unwrap_or_else(|| *MerkleHasher::shared().empty_root(level))
    }
}
