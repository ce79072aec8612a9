//! Pool error taxonomy
//!
//! Every rejected operation leaves the pool untouched. [`PoolError::kind`]
//! groups variants so callers can decide whether a fresh proof is worth
//! generating ([`ErrorKind::StaleState`]) or the submission is dead.

use shade_privacy::{Commitment, Nullifier, Root};
use thiserror::Error;

use crate::verifier::Circuit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or unauthorized request
    Precondition,
    /// Proof was built against roots or counters that have since moved
    StaleState,
    /// Commitment or nullifier already recorded
    Uniqueness,
    /// Proof rejected by the verifier
    Cryptographic,
    /// Tree capacity exhausted
    Capacity,
    /// Fee accounting or payout failure
    Economic,
    /// Backing store I/O failure
    Storage,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    // ------------------------------------------------------------------
    // Preconditions
    // ------------------------------------------------------------------
    #[error("pool is not initialized")]
    NotInitialized,

    #[error("pool is already initialized")]
    AlreadyInitialized,

    #[error("wrong payment: expected {expected}, received {received}")]
    WrongPayment { expected: u128, received: u128 },

    #[error("supply cap exceeded: {current} + {mint_amount} > {cap}")]
    SupplyCapExceeded {
        current: u128,
        mint_amount: u128,
        cap: u128,
    },

    #[error("unknown {operation} variant tag {tag}")]
    UnknownVariant { operation: &'static str, tag: u8 },

    #[error("{circuit} expects {expected} public signals, got {got}")]
    SignalCount {
        circuit: Circuit,
        expected: usize,
        got: usize,
    },

    #[error("public signal {index} ({name}) does not fit its integer type")]
    SignalOutOfRange { index: usize, name: &'static str },

    #[error("proven amount {proven} does not match mint amount {expected}")]
    AmountMismatch { expected: u128, proven: u128 },

    #[error("mint commitment is empty")]
    EmptyCommitment,

    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    #[error("invalid pool configuration: {0}")]
    InvalidConfig(String),

    // ------------------------------------------------------------------
    // State consistency
    // ------------------------------------------------------------------
    #[error(
        "active root mismatch: current {}, claimed {}",
        hex::encode(.expected),
        hex::encode(.claimed)
    )]
    ActiveRootMismatch { expected: Root, claimed: Root },

    #[error(
        "finalized root mismatch: current {}, claimed {}",
        hex::encode(.expected),
        hex::encode(.claimed)
    )]
    FinalizedRootMismatch { expected: Root, claimed: Root },

    #[error("subtree index mismatch: current {expected}, claimed {claimed}")]
    SubtreeIndexMismatch { expected: u64, claimed: u64 },

    #[error("rollover requires a full subtree ({next_leaf_index}/{capacity} leaves used)")]
    SubtreeNotFull { next_leaf_index: u64, capacity: u64 },

    // ------------------------------------------------------------------
    // Uniqueness
    // ------------------------------------------------------------------
    #[error("commitment {0} already exists")]
    CommitmentExists(Commitment),

    #[error("nullifier {0} already spent")]
    NullifierSpent(Nullifier),

    // ------------------------------------------------------------------
    // Cryptographic
    // ------------------------------------------------------------------
    #[error("invalid proof for {0}")]
    InvalidProof(Circuit),

    // ------------------------------------------------------------------
    // Capacity
    // ------------------------------------------------------------------
    #[error("active subtree is full ({capacity} leaves), rollover required")]
    SubtreeFull { capacity: u64 },

    #[error("insufficient subtree capacity: {requested} outputs, {remaining} slots left")]
    InsufficientCapacity { requested: u64, remaining: u64 },

    #[error("finalized tree is full ({capacity} subtrees)")]
    FinalizedTreeFull { capacity: u64 },

    // ------------------------------------------------------------------
    // Economic
    // ------------------------------------------------------------------
    #[error("no fees to distribute")]
    NoFeesToDistribute,

    #[error("fee payout failed: {0}")]
    PayoutFailed(String),

    // ------------------------------------------------------------------
    // Storage
    // ------------------------------------------------------------------
    #[error("storage error: {0}")]
    Storage(String),
}

impl PoolError {
    pub fn kind(&self) -> ErrorKind {
        use PoolError::*;

        match self {
            NotInitialized
            | AlreadyInitialized
            | WrongPayment { .. }
            | SupplyCapExceeded { .. }
            | UnknownVariant { .. }
            | SignalCount { .. }
            | SignalOutOfRange { .. }
            | AmountMismatch { .. }
            | EmptyCommitment
            | ArithmeticOverflow(_)
            | InvalidConfig(_) => ErrorKind::Precondition,

            ActiveRootMismatch { .. }
            | FinalizedRootMismatch { .. }
            | SubtreeIndexMismatch { .. }
            | SubtreeNotFull { .. } => ErrorKind::StaleState,

            CommitmentExists(_) | NullifierSpent(_) => ErrorKind::Uniqueness,

            InvalidProof(_) => ErrorKind::Cryptographic,

            SubtreeFull { .. } | InsufficientCapacity { .. } | FinalizedTreeFull { .. } => {
                ErrorKind::Capacity
            }

            NoFeesToDistribute | PayoutFailed(_) => ErrorKind::Economic,

            Storage(_) => ErrorKind::Storage,
        }
    }

    /// True when regenerating the proof against current state may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::StaleState
    }

    /// Wrap a backing-store failure, keeping the full context chain.
    pub fn storage(err: anyhow::Error) -> Self {
        PoolError::Storage(format!("{:#}", err))
    }
}
