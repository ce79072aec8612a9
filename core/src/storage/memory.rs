use anyhow::{Result, bail};
use shade_privacy::{Commitment, Nullifier};
use std::collections::{HashMap, HashSet};

use super::state::{LeafPosition, PoolSnapshot, PoolStore, StateDiff};

/// Hash-set backed ledgers for tests and the in-memory demo.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    nullifiers: HashSet<Nullifier>,
    commitments: HashMap<Commitment, LeafPosition>,
    encrypted_notes: HashMap<Commitment, Vec<u8>>,
    snapshot: Option<PoolSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nullifier_count(&self) -> usize {
        self.nullifiers.len()
    }

    pub fn commitment_count(&self) -> usize {
        self.commitments.len()
    }
}

impl PoolStore for MemoryStore {
    fn contains_nullifier(&self, nullifier: &Nullifier) -> Result<bool> {
        Ok(self.nullifiers.contains(nullifier))
    }

    fn contains_commitment(&self, commitment: &Commitment) -> Result<bool> {
        Ok(self.commitments.contains_key(commitment))
    }

    fn commitment_position(&self, commitment: &Commitment) -> Result<Option<LeafPosition>> {
        Ok(self.commitments.get(commitment).copied())
    }

    fn encrypted_note(&self, commitment: &Commitment) -> Result<Option<Vec<u8>>> {
        Ok(self.encrypted_notes.get(commitment).cloned())
    }

    fn load_snapshot(&self) -> Result<Option<PoolSnapshot>> {
        Ok(self.snapshot)
    }

    fn apply(&mut self, diff: &StateDiff) -> Result<()> {
        // Validate everything before touching the sets
        for nullifier in &diff.nullifiers {
            if self.nullifiers.contains(nullifier) {
                bail!("nullifier {} already recorded", nullifier);
            }
        }
        for record in &diff.commitments {
            if self.commitments.contains_key(&record.commitment) {
                bail!("commitment {} already recorded", record.commitment);
            }
        }

        self.nullifiers.extend(diff.nullifiers.iter().copied());
        for record in &diff.commitments {
            self.commitments.insert(record.commitment, record.position);
        }
        for (commitment, note) in &diff.encrypted_notes {
            self.encrypted_notes.insert(*commitment, note.clone());
        }
        self.snapshot = Some(diff.snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::{AccumulatorParams, AccumulatorState, GenesisRoots};
    use crate::storage::state::LeafRecord;

    fn snapshot() -> PoolSnapshot {
        let params = AccumulatorParams::new(2, 4).unwrap();
        PoolSnapshot {
            accumulator: AccumulatorState::genesis(
                params,
                GenesisRoots {
                    active: [1u8; 32],
                    finalized: [2u8; 32],
                },
            ),
            total_supply: 0,
            fee_balance: 0,
        }
    }

    fn diff(nullifier: u8, commitment: u8) -> StateDiff {
        StateDiff {
            nullifiers: vec![Nullifier([nullifier; 32])],
            commitments: vec![LeafRecord {
                commitment: Commitment([commitment; 32]),
                position: LeafPosition {
                    subtree_index: 0,
                    leaf_index: 0,
                },
            }],
            encrypted_notes: vec![(Commitment([commitment; 32]), vec![9, 9])],
            snapshot: snapshot(),
        }
    }

    #[test]
    fn test_apply_records_everything() {
        let mut store = MemoryStore::new();
        store.apply(&diff(1, 2)).unwrap();

        assert!(store.contains_nullifier(&Nullifier([1u8; 32])).unwrap());
        assert!(store.contains_commitment(&Commitment([2u8; 32])).unwrap());
        assert_eq!(
            store.encrypted_note(&Commitment([2u8; 32])).unwrap(),
            Some(vec![9, 9])
        );
        assert_eq!(store.load_snapshot().unwrap(), Some(snapshot()));
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let mut store = MemoryStore::new();
        store.apply(&diff(1, 2)).unwrap();

        // Fresh nullifier, duplicate commitment: nothing may land
        assert!(store.apply(&diff(3, 2)).is_err());
        assert!(!store.contains_nullifier(&Nullifier([3u8; 32])).unwrap());
        assert_eq!(store.nullifier_count(), 1);
        assert_eq!(store.commitment_count(), 1);
    }
}
