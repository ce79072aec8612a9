//! Proof verification capability
//!
//! The pool never inspects proofs itself. Each circuit has its own opaque
//! verifier answering `verify(proof, public_signals) -> bool`; real backends
//! (Groth16, PLONK, ...) plug in behind [`ProofVerifier`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::signal::Signal;

/// Domain separator for mock proofs
const MOCK_PROOF_DOMAIN: &[u8] = b"shade-mock-proof-v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Circuit {
    MintRegular,
    MintRollover,
    TransferActive,
    TransferFinalized,
    TransferRollover,
}

impl Circuit {
    pub const ALL: [Circuit; 5] = [
        Circuit::MintRegular,
        Circuit::MintRollover,
        Circuit::TransferActive,
        Circuit::TransferFinalized,
        Circuit::TransferRollover,
    ];

    /// Exact number of public signals the circuit exposes.
    pub fn signal_count(&self) -> usize {
        match self {
            Circuit::MintRegular => 4,
            Circuit::MintRollover => 7,
            Circuit::TransferActive => 6,
            Circuit::TransferFinalized => 7,
            Circuit::TransferRollover => 9,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Circuit::MintRegular => "mint-regular",
            Circuit::MintRollover => "mint-rollover",
            Circuit::TransferActive => "transfer-active",
            Circuit::TransferFinalized => "transfer-finalized",
            Circuit::TransferRollover => "transfer-rollover",
        }
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque proof checker for one circuit.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, proof: &[u8], public_signals: &[Signal]) -> bool;
}

/// One verifier per circuit.
#[derive(Clone)]
pub struct VerifierSet {
    mint_regular: Arc<dyn ProofVerifier>,
    mint_rollover: Arc<dyn ProofVerifier>,
    transfer_active: Arc<dyn ProofVerifier>,
    transfer_finalized: Arc<dyn ProofVerifier>,
    transfer_rollover: Arc<dyn ProofVerifier>,
}

impl VerifierSet {
    pub fn new(
        mint_regular: Arc<dyn ProofVerifier>,
        mint_rollover: Arc<dyn ProofVerifier>,
        transfer_active: Arc<dyn ProofVerifier>,
        transfer_finalized: Arc<dyn ProofVerifier>,
        transfer_rollover: Arc<dyn ProofVerifier>,
    ) -> Self {
        Self {
            mint_regular,
            mint_rollover,
            transfer_active,
            transfer_finalized,
            transfer_rollover,
        }
    }

    /// Mock verifiers bound to each circuit, for dev mode and tests.
    pub fn mock() -> Self {
        Self::new(
            Arc::new(MockVerifier::new(Circuit::MintRegular)),
            Arc::new(MockVerifier::new(Circuit::MintRollover)),
            Arc::new(MockVerifier::new(Circuit::TransferActive)),
            Arc::new(MockVerifier::new(Circuit::TransferFinalized)),
            Arc::new(MockVerifier::new(Circuit::TransferRollover)),
        )
    }

    pub fn get(&self, circuit: Circuit) -> &dyn ProofVerifier {
        match circuit {
            Circuit::MintRegular => self.mint_regular.as_ref(),
            Circuit::MintRollover => self.mint_rollover.as_ref(),
            Circuit::TransferActive => self.transfer_active.as_ref(),
            Circuit::TransferFinalized => self.transfer_finalized.as_ref(),
            Circuit::TransferRollover => self.transfer_rollover.as_ref(),
        }
    }

    pub fn verify(&self, circuit: Circuit, proof: &[u8], public_signals: &[Signal]) -> bool {
        self.get(circuit).verify(proof, public_signals)
    }
}

/// Mock verifier for development and testing.
///
/// Accepts exactly the proof produced by [`mock_proof`] for its circuit and
/// the same signals, so a proof for one circuit never verifies on another.
#[derive(Debug, Clone, Copy)]
pub struct MockVerifier {
    circuit: Circuit,
}

impl MockVerifier {
    pub fn new(circuit: Circuit) -> Self {
        Self { circuit }
    }
}

impl ProofVerifier for MockVerifier {
    fn verify(&self, proof: &[u8], public_signals: &[Signal]) -> bool {
        proof == mock_proof(self.circuit, public_signals)
    }
}

/// Deterministic mock proof: `blake3(domain || circuit || signals)`.
pub fn mock_proof(circuit: Circuit, public_signals: &[Signal]) -> Vec<u8> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(MOCK_PROOF_DOMAIN);
    hasher.update(circuit.name().as_bytes());
    for signal in public_signals {
        hasher.update(signal.as_bytes());
    }
    hasher.finalize().as_bytes().to_vec()
}
