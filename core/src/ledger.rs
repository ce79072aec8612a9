//! Nullifier and commitment ledgers
//!
//! Both ledgers are append-only sets keyed by 32-byte hashes. During one
//! operation, inserts are staged against the committed store *and* against
//! earlier inserts of the same call, so a proof that lists the same
//! nullifier twice is rejected just like a replay. Staged entries only reach
//! the store through the operation's [`StateDiff`](crate::storage::StateDiff).

use shade_privacy::{Commitment, Nullifier};

use crate::error::PoolError;
use crate::storage::PoolStore;

pub struct StagedLedgers<'a, S: PoolStore + ?Sized> {
    store: &'a S,
    nullifiers: Vec<Nullifier>,
    commitments: Vec<Commitment>,
}

impl<'a, S: PoolStore + ?Sized> StagedLedgers<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            nullifiers: Vec::with_capacity(2),
            commitments: Vec::with_capacity(2),
        }
    }

    pub fn is_spent(&self, nullifier: &Nullifier) -> Result<bool, PoolError> {
        if self.nullifiers.contains(nullifier) {
            return Ok(true);
        }
        self.store
            .contains_nullifier(nullifier)
            .map_err(PoolError::storage)
    }

    pub fn commitment_exists(&self, commitment: &Commitment) -> Result<bool, PoolError> {
        if self.commitments.contains(commitment) {
            return Ok(true);
        }
        self.store
            .contains_commitment(commitment)
            .map_err(PoolError::storage)
    }

    /// Stage a nullifier; fails hard if it was ever spent.
    pub fn spend_nullifier(&mut self, nullifier: Nullifier) -> Result<(), PoolError> {
        if self.is_spent(&nullifier)? {
            return Err(PoolError::NullifierSpent(nullifier));
        }
        self.nullifiers.push(nullifier);
        Ok(())
    }

    /// Stage a commitment; fails hard if it already exists.
    pub fn record_commitment(&mut self, commitment: Commitment) -> Result<(), PoolError> {
        if self.commitment_exists(&commitment)? {
            return Err(PoolError::CommitmentExists(commitment));
        }
        self.commitments.push(commitment);
        Ok(())
    }

    /// Staged entries in insertion order.
    pub fn into_parts(self) -> (Vec<Nullifier>, Vec<Commitment>) {
        (self.nullifiers, self.commitments)
    }
}
