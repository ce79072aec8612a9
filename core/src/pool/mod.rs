//! Shielded Pool
//!
//! Operation dispatcher tying the accumulator, both ledgers, the verifiers and
//! the fee splitter together.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       ShieldedPool                              │
//! │                                                                 │
//! │   request ──▶ decode ──▶ state checks ──▶ ledger staging        │
//! │   (tag +       (typed     (roots, index,    (nullifiers,        │
//! │    signals)     variant)   capacity)         commitments)       │
//! │                                                   │             │
//! │                                                   ▼             │
//! │        events ◀── apply StateDiff ◀── transition ◀── verify     │
//! │                   (atomic store      (pure)         (opaque)    │
//! │                    write)                                       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is written until every check and the proof have passed, so a
//! failed call has no observable effect. Mutating entry points take
//! `&mut self`; concurrent callers go through [`crate::service::PoolService`].

mod config;
mod mint;
mod transfer;

pub use config::PoolConfig;

use shade_privacy::{Commitment, Nullifier, Root};

use crate::account::AccountId;
use crate::accumulator::{AccumulatorState, GenesisRoots};
use crate::error::PoolError;
use crate::events::PoolEvent;
use crate::fees::{FeeSplitter, Payout};
use crate::ledger::StagedLedgers;
use crate::operation::Proof;
use crate::signal::Signal;
use crate::storage::{LeafPosition, MemoryStore, PoolSnapshot, PoolStore, StateDiff};
use crate::verifier::{Circuit, VerifierSet};

// ============================================================================
// Requests & Results
// ============================================================================

/// Ambient call data: who is calling, what value is attached, and when the
/// call is included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountId,
    pub value: u128,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    pub variant: u8,
    pub proof: Proof,
    /// Ciphertext of the minted note for its owner
    pub encrypted_note: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub variant: u8,
    pub proof: Proof,
    /// Ciphertexts, index-aligned with the output commitment slots
    pub encrypted_notes: Vec<Vec<u8>>,
    pub ephemeral_keys: [[u8; 32]; 2],
    pub view_tag: u8,
}

/// Outcome of an accepted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub events: Vec<PoolEvent>,
    /// Accumulator state after the operation
    pub accumulator: AccumulatorState,
}

// ============================================================================
// Pool
// ============================================================================

pub struct ShieldedPool<S: PoolStore = MemoryStore> {
    config: PoolConfig,
    verifiers: VerifierSet,
    store: S,
    /// `None` until [`ShieldedPool::initialize`] runs
    state: Option<AccumulatorState>,
    total_supply: u128,
    fees: FeeSplitter,
}

impl<S: PoolStore> ShieldedPool<S> {
    /// Open a pool over `store`, resuming from its snapshot if one exists.
    pub fn open(config: PoolConfig, verifiers: VerifierSet, store: S) -> Result<Self, PoolError> {
        config.validate()?;

        let snapshot = store.load_snapshot().map_err(PoolError::storage)?;
        if let Some(snapshot) = &snapshot {
            if snapshot.accumulator.params != config.params {
                return Err(PoolError::InvalidConfig(format!(
                    "stored tree geometry {:?} differs from configured {:?}",
                    snapshot.accumulator.params, config.params
                )));
            }
            log::info!(
                "Resuming pool at subtree {} leaf {} (supply {})",
                snapshot.accumulator.subtree_index,
                snapshot.accumulator.next_leaf_index,
                snapshot.total_supply
            );
        }

        let fees = FeeSplitter::new(config.fees, snapshot.map_or(0, |s| s.fee_balance));

        Ok(Self {
            verifiers,
            store,
            state: snapshot.map(|s| s.accumulator),
            total_supply: snapshot.map_or(0, |s| s.total_supply),
            fees,
            config,
        })
    }

    /// One-shot setup with the roots of the two empty trees.
    pub fn initialize(&mut self, roots: GenesisRoots) -> Result<AccumulatorState, PoolError> {
        if self.state.is_some() {
            return Err(PoolError::AlreadyInitialized);
        }

        let state = AccumulatorState::genesis(self.config.params, roots);
        let snapshot = self.snapshot(state, self.fees.balance());
        self.store
            .apply(&StateDiff::snapshot_only(snapshot))
            .map_err(PoolError::storage)?;
        self.state = Some(state);

        log::info!(
            "Initialized pool {} ({}): subtree capacity {}, finalized capacity {}",
            self.config.name,
            self.config.symbol,
            self.config.params.subtree_capacity(),
            self.config.params.finalized_capacity()
        );
        Ok(state)
    }

    /// Permissionless payout of all accrued mint fees.
    ///
    /// The cleared balance is written to the store before anything is paid,
    /// so a reopened pool never pays the same fees twice. A failed payout
    /// writes the balance back; if that write also fails the in-memory pool
    /// keeps the balance and the store catches up with the next snapshot.
    pub fn distribute_fees(&mut self, payout: &mut dyn Payout) -> Result<Receipt, PoolError> {
        let state = self.current_state()?;
        let plan = self.fees.plan()?;
        let held = self.fees.balance();

        let cleared = self.snapshot(state, held - plan.total());
        self.store
            .apply(&StateDiff::snapshot_only(cleared))
            .map_err(PoolError::storage)
            .inspect_err(|e| {
                log::warn!("Fee distribution not started: {}", e);
            })?;

        if let Err(e) = self.fees.execute(&plan, payout) {
            log::warn!("Fee distribution failed: {}", e);
            let restored = self.snapshot(state, held);
            if let Err(restore) = self.store.apply(&StateDiff::snapshot_only(restored)) {
                log::error!("Failed to restore fee balance {} in store: {:#}", held, restore);
            }
            return Err(e);
        }

        log::info!(
            "Distributed fees: {} to {}, {} to {}",
            plan.primary_amount,
            plan.primary,
            plan.secondary_amount,
            plan.secondary
        );

        Ok(Receipt {
            events: vec![PoolEvent::FeesDistributed {
                primary: plan.primary,
                primary_amount: plan.primary_amount,
                secondary: plan.secondary,
                secondary_amount: plan.secondary_amount,
            }],
            accumulator: state,
        })
    }

    // ------------------------------------------------------------------
    // Read-only views
    // ------------------------------------------------------------------

    pub fn is_spent(&self, nullifier: &Nullifier) -> Result<bool, PoolError> {
        self.store
            .contains_nullifier(nullifier)
            .map_err(PoolError::storage)
    }

    pub fn commitment_exists(&self, commitment: &Commitment) -> Result<bool, PoolError> {
        self.store
            .contains_commitment(commitment)
            .map_err(PoolError::storage)
    }

    pub fn commitment_position(
        &self,
        commitment: &Commitment,
    ) -> Result<Option<LeafPosition>, PoolError> {
        self.store
            .commitment_position(commitment)
            .map_err(PoolError::storage)
    }

    pub fn encrypted_note(&self, commitment: &Commitment) -> Result<Option<Vec<u8>>, PoolError> {
        self.store
            .encrypted_note(commitment)
            .map_err(PoolError::storage)
    }

    pub fn active_subtree_root(&self) -> Result<Root, PoolError> {
        Ok(self.current_state()?.active_root)
    }

    pub fn finalized_root(&self) -> Result<Root, PoolError> {
        Ok(self.current_state()?.finalized_root)
    }

    pub fn accumulator(&self) -> Option<&AccumulatorState> {
        self.state.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.config.decimals
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn fee_balance(&self) -> u128 {
        self.fees.balance()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ------------------------------------------------------------------
    // Shared dispatcher plumbing
    // ------------------------------------------------------------------

    fn current_state(&self) -> Result<AccumulatorState, PoolError> {
        self.state.ok_or(PoolError::NotInitialized)
    }

    fn snapshot(&self, accumulator: AccumulatorState, fee_balance: u128) -> PoolSnapshot {
        PoolSnapshot {
            accumulator,
            total_supply: self.total_supply,
            fee_balance,
        }
    }

    fn staged(&self) -> StagedLedgers<'_, S> {
        StagedLedgers::new(&self.store)
    }

    fn verify(&self, circuit: Circuit, proof: &[u8], signals: &[Signal]) -> Result<(), PoolError> {
        if !self.verifiers.verify(circuit, proof, signals) {
            return Err(PoolError::InvalidProof(circuit));
        }
        Ok(())
    }

    /// Persist `diff`, then adopt its snapshot. The in-memory state only
    /// moves once the store accepted the write.
    fn commit(&mut self, diff: StateDiff) -> Result<(), PoolError> {
        self.store.apply(&diff).map_err(PoolError::storage)?;

        self.state = Some(diff.snapshot.accumulator);
        self.total_supply = diff.snapshot.total_supply;
        self.fees.set_balance(diff.snapshot.fee_balance);
        Ok(())
    }
}
