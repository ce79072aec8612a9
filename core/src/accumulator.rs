//! Two-layer note accumulator
//!
//! ```text
//!   finalized tree (h2)         leaves = retired subtree roots
//!        ┌──────┐
//!        │ root │ ◀──── rollover: absorb full subtree root
//!        └──────┘
//!   active subtree (h1)         leaves = note commitments
//!   [c0 c1 c2 ... c(2^h1 - 1)]  next_leaf_index counts used slots
//! ```
//!
//! Only roots and counters live on the ledger; the tree contents are the
//! prover's business. Every transition is a pure function from the current
//! state and a verified claim to the next state, so a rejected operation
//! can never leave a half-applied accumulator behind.

use serde::{Deserialize, Serialize};
use shade_privacy::{MAX_DEPTH, MerkleHasher, Root};

use crate::error::PoolError;

/// Tree geometry, fixed for the lifetime of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatorParams {
    /// Active subtree height (h1)
    pub subtree_height: u8,
    /// Finalized tree height (h2)
    pub finalized_height: u8,
}

impl AccumulatorParams {
    pub fn new(subtree_height: u8, finalized_height: u8) -> Result<Self, PoolError> {
        for (name, height) in [("subtree", subtree_height), ("finalized", finalized_height)] {
            if height == 0 || height as usize > MAX_DEPTH {
                return Err(PoolError::InvalidConfig(format!(
                    "{} height {} out of range (1..={})",
                    name, height, MAX_DEPTH
                )));
            }
        }

        Ok(Self {
            subtree_height,
            finalized_height,
        })
    }

    pub fn subtree_capacity(&self) -> u64 {
        1u64 << self.subtree_height
    }

    pub fn finalized_capacity(&self) -> u64 {
        1u64 << self.finalized_height
    }
}

/// Roots of the two empty trees a pool starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisRoots {
    #[serde(with = "hex::serde")]
    pub active: Root,
    #[serde(with = "hex::serde")]
    pub finalized: Root,
}

impl GenesisRoots {
    /// Poseidon empty-tree roots, matching the SDK Merkle tree.
    pub fn empty(params: &AccumulatorParams) -> Self {
        let hasher = MerkleHasher::shared();
        Self {
            active: *hasher.empty_root(params.subtree_height as usize),
            finalized: *hasher.empty_root(params.finalized_height as usize),
        }
    }
}

/// On-ledger accumulator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatorState {
    /// Number of completed rollovers
    pub subtree_index: u64,
    /// Used slots in the active subtree, `0..=capacity`
    pub next_leaf_index: u64,
    pub params: AccumulatorParams,
    #[serde(with = "hex::serde")]
    pub active_root: Root,
    #[serde(with = "hex::serde")]
    pub finalized_root: Root,
}

impl AccumulatorState {
    pub fn genesis(params: AccumulatorParams, roots: GenesisRoots) -> Self {
        Self {
            subtree_index: 0,
            next_leaf_index: 0,
            params,
            active_root: roots.active,
            finalized_root: roots.finalized,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.params.subtree_capacity()
    }

    pub fn remaining(&self) -> u64 {
        self.capacity().saturating_sub(self.next_leaf_index)
    }

    pub fn is_full(&self) -> bool {
        self.next_leaf_index >= self.capacity()
    }

    // ------------------------------------------------------------------
    // Guards
    // ------------------------------------------------------------------

    pub fn check_active_root(&self, claimed: &Root) -> Result<(), PoolError> {
        if claimed != &self.active_root {
            return Err(PoolError::ActiveRootMismatch {
                expected: self.active_root,
                claimed: *claimed,
            });
        }
        Ok(())
    }

    pub fn check_finalized_root(&self, claimed: &Root) -> Result<(), PoolError> {
        if claimed != &self.finalized_root {
            return Err(PoolError::FinalizedRootMismatch {
                expected: self.finalized_root,
                claimed: *claimed,
            });
        }
        Ok(())
    }

    pub fn check_subtree_index(&self, claimed: u64) -> Result<(), PoolError> {
        if claimed != self.subtree_index {
            return Err(PoolError::SubtreeIndexMismatch {
                expected: self.subtree_index,
                claimed,
            });
        }
        Ok(())
    }

    /// Non-rollover operations need a subtree with `count` free slots.
    pub fn check_insert(&self, count: u64) -> Result<(), PoolError> {
        if self.is_full() {
            return Err(PoolError::SubtreeFull {
                capacity: self.capacity(),
            });
        }
        if count > self.remaining() {
            return Err(PoolError::InsufficientCapacity {
                requested: count,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Rollover operations need an exactly full subtree and room in the
    /// finalized tree for its root.
    pub fn check_rollover(&self, outputs: u64) -> Result<(), PoolError> {
        if !self.is_full() {
            return Err(PoolError::SubtreeNotFull {
                next_leaf_index: self.next_leaf_index,
                capacity: self.capacity(),
            });
        }
        if self.subtree_index >= self.params.finalized_capacity() {
            return Err(PoolError::FinalizedTreeFull {
                capacity: self.params.finalized_capacity(),
            });
        }
        if outputs > self.capacity() {
            return Err(PoolError::InsufficientCapacity {
                requested: outputs,
                remaining: self.capacity(),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Append `count` leaves to the active subtree.
    pub fn insert_leaves(&self, new_active_root: Root, count: u64) -> Result<Self, PoolError> {
        self.check_insert(count)?;

        Ok(Self {
            next_leaf_index: self.next_leaf_index + count,
            active_root: new_active_root,
            ..*self
        })
    }

    pub fn insert_leaf(&self, new_active_root: Root) -> Result<Self, PoolError> {
        self.insert_leaves(new_active_root, 1)
    }

    /// Retire the full subtree into the finalized tree, open the next one and
    /// place `outputs` leaves at its front.
    pub fn rollover(
        &self,
        new_active_root: Root,
        new_finalized_root: Root,
        outputs: u64,
    ) -> Result<Self, PoolError> {
        self.check_rollover(outputs)?;

        Ok(Self {
            subtree_index: self.subtree_index + 1,
            next_leaf_index: outputs,
            active_root: new_active_root,
            finalized_root: new_finalized_root,
            ..*self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_state() -> AccumulatorState {
        let params = AccumulatorParams::new(2, 3).unwrap();
        AccumulatorState::genesis(
            params,
            GenesisRoots {
                active: [0xa0; 32],
                finalized: [0xf0; 32],
            },
        )
    }

    #[test]
    fn test_params_validation() {
        assert!(AccumulatorParams::new(0, 4).is_err());
        assert!(AccumulatorParams::new(4, 33).is_err());
        let params = AccumulatorParams::new(2, 3).unwrap();
        assert_eq!(params.subtree_capacity(), 4);
        assert_eq!(params.finalized_capacity(), 8);
    }

    #[test]
    fn test_insert_leaf_advances_counter() {
        let s0 = small_state();
        let s1 = s0.insert_leaf([1u8; 32]).unwrap();

        assert_eq!(s1.next_leaf_index, 1);
        assert_eq!(s1.active_root, [1u8; 32]);
        assert_eq!(s1.finalized_root, s0.finalized_root);
        assert_eq!(s0.next_leaf_index, 0, "transition must not mutate input");
    }

    #[test]
    fn test_insert_rejected_when_full() {
        let mut s = small_state();
        for i in 0..4u8 {
            s = s.insert_leaf([i; 32]).unwrap();
        }
        assert!(s.is_full());
        assert_eq!(
            s.insert_leaf([9u8; 32]),
            Err(PoolError::SubtreeFull { capacity: 4 })
        );
    }

    #[test]
    fn test_insert_leaves_respects_remaining() {
        let s = small_state().insert_leaves([1u8; 32], 3).unwrap();
        assert_eq!(
            s.insert_leaves([2u8; 32], 2),
            Err(PoolError::InsufficientCapacity {
                requested: 2,
                remaining: 1
            })
        );

        let zero = s.insert_leaves([3u8; 32], 0).unwrap();
        assert_eq!(zero.next_leaf_index, 3);
    }

    #[test]
    fn test_rollover_requires_full_subtree() {
        let s = small_state().insert_leaf([1u8; 32]).unwrap();
        assert_eq!(
            s.rollover([2u8; 32], [3u8; 32], 1),
            Err(PoolError::SubtreeNotFull {
                next_leaf_index: 1,
                capacity: 4
            })
        );
    }

    #[test]
    fn test_rollover_resets_counter_and_places_output() {
        let full = small_state().insert_leaves([1u8; 32], 4).unwrap();
        let next = full.rollover([2u8; 32], [3u8; 32], 1).unwrap();

        assert_eq!(next.subtree_index, 1);
        assert_eq!(next.next_leaf_index, 1);
        assert_eq!(next.active_root, [2u8; 32]);
        assert_eq!(next.finalized_root, [3u8; 32]);

        let two = full.rollover([2u8; 32], [3u8; 32], 2).unwrap();
        assert_eq!(two.next_leaf_index, 2);
    }

    #[test]
    fn test_rollover_rejected_when_finalized_tree_full() {
        let mut s = small_state().insert_leaves([1u8; 32], 4).unwrap();
        s.subtree_index = s.params.finalized_capacity();
        assert_eq!(
            s.rollover([2u8; 32], [3u8; 32], 1),
            Err(PoolError::FinalizedTreeFull { capacity: 8 })
        );
    }

    #[test]
    fn test_guards() {
        let s = small_state();
        assert!(s.check_active_root(&[0xa0; 32]).is_ok());
        assert!(matches!(
            s.check_active_root(&[0u8; 32]),
            Err(PoolError::ActiveRootMismatch { .. })
        ));
        assert!(s.check_finalized_root(&[0xf0; 32]).is_ok());
        assert!(s.check_finalized_root(&[0xa0; 32]).is_err());
        assert_eq!(
            s.check_subtree_index(1),
            Err(PoolError::SubtreeIndexMismatch {
                expected: 0,
                claimed: 1
            })
        );
    }

    #[test]
    fn test_genesis_roots_match_empty_tree() {
        let params = AccumulatorParams::new(2, 3).unwrap();
        let roots = GenesisRoots::empty(&params);
        let tree = shade_privacy::MerkleTree::new(2).unwrap();
        assert_eq!(roots.active, tree.root());
        assert_ne!(roots.active, roots.finalized);
    }
}
