//! Shade Core
//!
//! Privacy-preserving value-transfer pool built on a two-layer note
//! accumulator: a small active subtree that fills quickly and a large
//! finalized tree of retired subtree roots. Notes are created by minting or
//! by transfers that spend existing notes; every state change is authorized
//! by an externally verified zero-knowledge proof whose public signals must
//! match the current ledger state exactly.

pub mod account;
pub mod accumulator;
pub mod error;
pub mod events;
pub mod fees;
pub mod ledger;
pub mod operation;
pub mod pool;
pub mod prover;
pub mod service;
pub mod signal;
pub mod storage;
pub mod verifier;

#[cfg(test)]
mod tests;

pub use account::AccountId;
pub use accumulator::{AccumulatorParams, AccumulatorState, GenesisRoots};
pub use error::{ErrorKind, PoolError};
pub use events::PoolEvent;
pub use fees::{FeeConfig, FeeDistribution, MemoryPayout, Payout};
pub use operation::{MintOperation, Proof, TransferOperation};
pub use pool::{CallContext, MintRequest, PoolConfig, Receipt, ShieldedPool, TransferRequest};
pub use prover::{InputSource, MockProver, PreparedOperation};
pub use service::{PoolService, PoolStatus};
pub use signal::Signal;
pub use storage::{MemoryStore, PoolStore, RocksDbStore};
pub use verifier::{Circuit, MockVerifier, ProofVerifier, VerifierSet};

pub use shade_privacy::{Commitment, Nullifier, Root};
