use anyhow::Result;
use serde::{Deserialize, Serialize};
use shade_privacy::{Commitment, Nullifier};

use crate::accumulator::AccumulatorState;

/// Where a commitment landed in the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafPosition {
    pub subtree_index: u64,
    pub leaf_index: u64,
}

impl LeafPosition {
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.subtree_index.to_be_bytes());
        out[8..].copy_from_slice(&self.leaf_index.to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 16 {
            return None;
        }
        let mut subtree = [0u8; 8];
        let mut leaf = [0u8; 8];
        subtree.copy_from_slice(&bytes[..8]);
        leaf.copy_from_slice(&bytes[8..]);
        Some(Self {
            subtree_index: u64::from_be_bytes(subtree),
            leaf_index: u64::from_be_bytes(leaf),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafRecord {
    pub commitment: Commitment,
    pub position: LeafPosition,
}

/// Everything about the pool that is not a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub accumulator: AccumulatorState,
    pub total_supply: u128,
    pub fee_balance: u128,
}

/// Writes produced by one accepted operation, applied atomically.
#[derive(Debug, Clone)]
pub struct StateDiff {
    pub nullifiers: Vec<Nullifier>,
    pub commitments: Vec<LeafRecord>,
    pub encrypted_notes: Vec<(Commitment, Vec<u8>)>,
    pub snapshot: PoolSnapshot,
}

impl StateDiff {
    /// A diff that only moves the snapshot (e.g. fee distribution).
    pub fn snapshot_only(snapshot: PoolSnapshot) -> Self {
        Self {
            nullifiers: Vec::new(),
            commitments: Vec::new(),
            encrypted_notes: Vec::new(),
            snapshot,
        }
    }
}

/// Key-existence store behind the nullifier and commitment ledgers.
///
/// Both ledgers are append-only. `apply` must commit the whole diff or
/// nothing.
pub trait PoolStore: Send {
    fn contains_nullifier(&self, nullifier: &Nullifier) -> Result<bool>;

    fn contains_commitment(&self, commitment: &Commitment) -> Result<bool>;

    fn commitment_position(&self, commitment: &Commitment) -> Result<Option<LeafPosition>>;

    fn encrypted_note(&self, commitment: &Commitment) -> Result<Option<Vec<u8>>>;

    fn load_snapshot(&self) -> Result<Option<PoolSnapshot>>;

    fn apply(&mut self, diff: &StateDiff) -> Result<()>;
}
