//! Shade Privacy SDK
//!
//! Off-ledger note primitives for the shielded pool: commitments, nullifiers
//! and the Poseidon Merkle tree used to mirror the two-layer accumulator.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Shielded Operation                          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────────┐  │
//! │  │  Nullifiers  │  │ Commitments  │  │  Encrypted Outputs    │  │
//! │  │  (spent)     │  │  (new notes) │  │  (opaque ciphertext)  │  │
//! │  └──────────────┘  └──────────────┘  └───────────────────────┘  │
//! │         │                 │                     │               │
//! │         ▼                 ▼                     ▼               │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │     Active subtree (h1)  ──rollover──▶  Finalized (h2)   │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod error;
pub mod merkle;
pub mod nullifier;
pub mod poseidon;

pub use commitment::{Commitment, CommitmentScheme};
pub use error::PrivacyError;
pub use merkle::{MAX_DEPTH, MerkleHasher, MerklePath, MerkleTree};
pub use nullifier::{Nullifier, NullifierKey};

/// A 32-byte Merkle root.
pub type Root = [u8; 32];
