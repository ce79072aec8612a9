use crate::error::PoolError;
use crate::events::PoolEvent;
use crate::operation::MintOperation;
use crate::storage::{LeafPosition, LeafRecord, PoolSnapshot, PoolStore, StateDiff};

use super::{CallContext, MintRequest, Receipt, ShieldedPool};

impl<S: PoolStore> ShieldedPool<S> {
    /// Create one note worth `mint_amount` in exchange for exactly
    /// `mint_price`.
    ///
    /// Regular variant while the active subtree has room; rollover variant
    /// once it is exactly full.
    pub fn mint(&mut self, ctx: &CallContext, request: MintRequest) -> Result<Receipt, PoolError> {
        self.try_mint(ctx, request).inspect_err(|e| {
            log::warn!("Mint from {} rejected ({:?}): {}", ctx.caller, e.kind(), e);
        })
    }

    fn try_mint(&mut self, ctx: &CallContext, request: MintRequest) -> Result<Receipt, PoolError> {
        let state = self.current_state()?;

        // --- Preconditions ---
        if ctx.value != self.config.mint_price {
            return Err(PoolError::WrongPayment {
                expected: self.config.mint_price,
                received: ctx.value,
            });
        }

        let total_supply = self
            .total_supply
            .checked_add(self.config.mint_amount)
            .filter(|supply| *supply <= self.config.max_supply)
            .ok_or(PoolError::SupplyCapExceeded {
                current: self.total_supply,
                mint_amount: self.config.mint_amount,
                cap: self.config.max_supply,
            })?;
        let fee_balance = self.fees.accrued(ctx.value)?;

        let op = MintOperation::decode(request.variant, &request.proof.public_signals)?;
        let commitment = op.commitment();
        if commitment.is_empty() {
            return Err(PoolError::EmptyCommitment);
        }
        if op.amount() != self.config.mint_amount {
            return Err(PoolError::AmountMismatch {
                expected: self.config.mint_amount,
                proven: op.amount(),
            });
        }

        // --- Uniqueness ---
        let mut staged = self.staged();
        staged.record_commitment(commitment)?;
        drop(staged);

        // --- State consistency & capacity ---
        match &op {
            MintOperation::Regular(m) => {
                state.check_insert(1)?;
                state.check_active_root(&m.old_active_root)?;
            }
            MintOperation::Rollover(m) => {
                state.check_rollover(1)?;
                state.check_active_root(&m.old_active_root)?;
                state.check_finalized_root(&m.old_finalized_root)?;
                state.check_subtree_index(m.subtree_index)?;
            }
        }

        // --- Proof ---
        self.verify(op.circuit(), &request.proof.bytes, &op.public_signals())?;

        // --- Transition ---
        let (next, position) = match &op {
            MintOperation::Regular(m) => (
                state.insert_leaf(m.new_active_root)?,
                LeafPosition {
                    subtree_index: state.subtree_index,
                    leaf_index: state.next_leaf_index,
                },
            ),
            MintOperation::Rollover(m) => {
                let next = state.rollover(m.new_active_root, m.new_finalized_root, 1)?;
                log::info!(
                    "Subtree {} retired into finalized tree, opening subtree {}",
                    state.subtree_index,
                    next.subtree_index
                );
                (
                    next,
                    LeafPosition {
                        subtree_index: next.subtree_index,
                        leaf_index: 0,
                    },
                )
            }
        };

        self.commit(StateDiff {
            nullifiers: Vec::new(),
            commitments: vec![LeafRecord {
                commitment,
                position,
            }],
            encrypted_notes: vec![(commitment, request.encrypted_note.clone())],
            snapshot: PoolSnapshot {
                accumulator: next,
                total_supply,
                fee_balance,
            },
        })?;

        log::info!(
            "Minted {} to subtree {} leaf {} (supply {})",
            commitment,
            position.subtree_index,
            position.leaf_index,
            total_supply
        );

        Ok(Receipt {
            events: vec![
                PoolEvent::CommitmentAppended {
                    subtree_index: position.subtree_index,
                    commitment,
                    leaf_index: position.leaf_index,
                    timestamp: ctx.timestamp,
                },
                PoolEvent::Minted {
                    minter: ctx.caller,
                    commitment,
                    encrypted_note: request.encrypted_note,
                    subtree_index: position.subtree_index,
                    leaf_index: position.leaf_index,
                    timestamp: ctx.timestamp,
                },
            ],
            accumulator: next,
        })
    }
}
