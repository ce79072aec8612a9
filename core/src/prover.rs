//! Prover-side accumulator mirror
//!
//! Wallets and provers keep the full tree contents the ledger only tracks
//! roots for. [`MockProver`] mirrors both layers with the SDK Poseidon tree,
//! derives the next roots for an operation, lays out the public signals in
//! circuit order and attaches a [`mock_proof`]. A prepared operation only
//! advances the mirror once it is confirmed, so a rejected submission leaves
//! the mirror in sync with the ledger.

use anyhow::{Context, Result, ensure};
use shade_privacy::{Commitment, MerklePath, MerkleTree, Nullifier, Root};

use crate::accumulator::{AccumulatorParams, GenesisRoots};
use crate::operation::{
    ActiveTransfer, FinalizedTransfer, MintOperation, NoteSlots, Proof, RegularMint, RolloverMint,
    RolloverTransfer, TransferOperation,
};
use crate::pool::{MintRequest, TransferRequest};
use crate::verifier::mock_proof;

/// Which tree a transfer's inputs are proven against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Active,
    Finalized,
}

#[derive(Clone)]
struct Mirror {
    active: MerkleTree,
    finalized: MerkleTree,
    subtree_index: u64,
}

/// A proven operation waiting for submission.
pub struct PreparedOperation {
    pub variant: u8,
    pub proof: Proof,
    mirror: Mirror,
}

impl PreparedOperation {
    pub fn mint_request(&self, encrypted_note: Vec<u8>) -> MintRequest {
        MintRequest {
            variant: self.variant,
            proof: self.proof.clone(),
            encrypted_note,
        }
    }

    pub fn transfer_request(
        &self,
        encrypted_notes: Vec<Vec<u8>>,
        ephemeral_keys: [[u8; 32]; 2],
        view_tag: u8,
    ) -> TransferRequest {
        TransferRequest {
            variant: self.variant,
            proof: self.proof.clone(),
            encrypted_notes,
            ephemeral_keys,
            view_tag,
        }
    }
}

pub struct MockProver {
    params: AccumulatorParams,
    mirror: Mirror,
}

impl MockProver {
    pub fn new(params: AccumulatorParams) -> Result<Self> {
        Ok(Self {
            params,
            mirror: Mirror {
                active: MerkleTree::new(params.subtree_height as usize)?,
                finalized: MerkleTree::new(params.finalized_height as usize)?,
                subtree_index: 0,
            },
        })
    }

    pub fn genesis_roots(&self) -> GenesisRoots {
        GenesisRoots::empty(&self.params)
    }

    pub fn active_root(&self) -> Root {
        self.mirror.active.root()
    }

    pub fn finalized_root(&self) -> Root {
        self.mirror.finalized.root()
    }

    pub fn subtree_index(&self) -> u64 {
        self.mirror.subtree_index
    }

    pub fn next_leaf_index(&self) -> u64 {
        self.mirror.active.next_position()
    }

    /// Membership witness for a leaf of the current active subtree.
    pub fn active_path(&self, leaf_index: u64) -> Option<MerklePath> {
        self.mirror.active.path(leaf_index)
    }

    /// Membership witness for a retired subtree root.
    pub fn finalized_path(&self, subtree_index: u64) -> Option<MerklePath> {
        self.mirror.finalized.path(subtree_index)
    }

    /// Prove a mint, choosing the rollover variant when the subtree is full.
    pub fn prepare_mint(&self, commitment: Commitment, amount: u128) -> Result<PreparedOperation> {
        let old = &self.mirror;
        let mut next = old.clone();

        let op = if old.active.is_full() {
            self.roll(&mut next)?;
            next.active.insert(commitment.0)?;
            MintOperation::Rollover(RolloverMint {
                new_active_root: next.active.root(),
                new_finalized_root: next.finalized.root(),
                old_active_root: old.active.root(),
                old_finalized_root: old.finalized.root(),
                commitment,
                amount,
                subtree_index: old.subtree_index,
            })
        } else {
            next.active.insert(commitment.0)?;
            MintOperation::Regular(RegularMint {
                new_active_root: next.active.root(),
                old_active_root: old.active.root(),
                commitment,
                amount,
            })
        };

        let signals = op.public_signals();
        Ok(PreparedOperation {
            variant: op.tag(),
            proof: Proof {
                bytes: mock_proof(op.circuit(), &signals),
                public_signals: signals,
            },
            mirror: next,
        })
    }

    /// Prove a transfer, choosing the rollover variant when the subtree is
    /// full (the input source is then irrelevant to the ledger).
    pub fn prepare_transfer(
        &self,
        source: InputSource,
        nullifiers: [Nullifier; 2],
        commitments: [Commitment; 2],
    ) -> Result<PreparedOperation> {
        let old = &self.mirror;
        let mut next = old.clone();
        let notes = NoteSlots {
            nullifiers,
            commitments,
        };
        let rollover = old.active.is_full();

        if rollover {
            self.roll(&mut next)?;
        }
        for commitment in notes.outputs() {
            next.active
                .insert(commitment.0)
                .context("not enough room in the active subtree for transfer outputs")?;
        }

        let op = match (rollover, source) {
            (true, _) => TransferOperation::Rollover(RolloverTransfer {
                new_active_root: next.active.root(),
                new_finalized_root: next.finalized.root(),
                old_active_root: old.active.root(),
                old_finalized_root: old.finalized.root(),
                notes,
                subtree_index: old.subtree_index,
            }),
            (false, InputSource::Active) => TransferOperation::ActiveInput(ActiveTransfer {
                new_active_root: next.active.root(),
                old_active_root: old.active.root(),
                notes,
            }),
            (false, InputSource::Finalized) => TransferOperation::FinalizedInput(FinalizedTransfer {
                new_active_root: next.active.root(),
                old_active_root: old.active.root(),
                old_finalized_root: old.finalized.root(),
                notes,
            }),
        };

        let signals = op.public_signals();
        Ok(PreparedOperation {
            variant: op.tag(),
            proof: Proof {
                bytes: mock_proof(op.circuit(), &signals),
                public_signals: signals,
            },
            mirror: next,
        })
    }

    /// Adopt a prepared operation after the ledger accepted it.
    pub fn confirm(&mut self, prepared: PreparedOperation) {
        self.mirror = prepared.mirror;
    }

    fn roll(&self, mirror: &mut Mirror) -> Result<()> {
        ensure!(mirror.active.is_full(), "rollover of a subtree that is not full");

        mirror
            .finalized
            .insert(mirror.active.root())
            .context("finalized tree is full")?;
        mirror.active = MerkleTree::new(self.params.subtree_height as usize)?;
        mirror.subtree_index += 1;
        Ok(())
    }
}
