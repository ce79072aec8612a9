use crate::error::PoolError;
use crate::events::PoolEvent;
use crate::operation::TransferOperation;
use crate::storage::{LeafPosition, LeafRecord, PoolSnapshot, PoolStore, StateDiff};

use super::{CallContext, Receipt, ShieldedPool, TransferRequest};

impl<S: PoolStore> ShieldedPool<S> {
    /// Spend up to two notes and create up to two new ones.
    ///
    /// Empty (all-zero) nullifier and commitment slots are skipped; each real
    /// output takes the next leaf of the active subtree.
    pub fn transfer(
        &mut self,
        ctx: &CallContext,
        request: TransferRequest,
    ) -> Result<Receipt, PoolError> {
        self.try_transfer(ctx, request).inspect_err(|e| {
            log::warn!("Transfer from {} rejected ({:?}): {}", ctx.caller, e.kind(), e);
        })
    }

    fn try_transfer(
        &mut self,
        ctx: &CallContext,
        request: TransferRequest,
    ) -> Result<Receipt, PoolError> {
        let state = self.current_state()?;

        let op = TransferOperation::decode(request.variant, &request.proof.public_signals)?;
        let notes = *op.notes();
        let outputs = notes.output_count();

        // --- Uniqueness (a replay is a double-spend whatever else went stale) ---
        let mut staged = self.staged();
        for nullifier in notes.spent() {
            staged.spend_nullifier(*nullifier)?;
        }
        for commitment in notes.outputs() {
            staged.record_commitment(*commitment)?;
        }
        let (nullifiers, _) = staged.into_parts();

        // --- State consistency & capacity ---
        match &op {
            TransferOperation::ActiveInput(t) => {
                state.check_insert(outputs)?;
                state.check_active_root(&t.old_active_root)?;
            }
            TransferOperation::FinalizedInput(t) => {
                state.check_insert(outputs)?;
                state.check_active_root(&t.old_active_root)?;
                state.check_finalized_root(&t.old_finalized_root)?;
            }
            TransferOperation::Rollover(t) => {
                state.check_rollover(outputs)?;
                state.check_active_root(&t.old_active_root)?;
                state.check_finalized_root(&t.old_finalized_root)?;
                state.check_subtree_index(t.subtree_index)?;
            }
        }

        // --- Proof ---
        self.verify(op.circuit(), &request.proof.bytes, &op.public_signals())?;

        // --- Transition ---
        let (next, first_leaf) = match &op {
            TransferOperation::ActiveInput(t) => {
                (state.insert_leaves(t.new_active_root, outputs)?, state.next_leaf_index)
            }
            TransferOperation::FinalizedInput(t) => {
                (state.insert_leaves(t.new_active_root, outputs)?, state.next_leaf_index)
            }
            TransferOperation::Rollover(t) => {
                let next = state.rollover(t.new_active_root, t.new_finalized_root, outputs)?;
                log::info!(
                    "Subtree {} retired into finalized tree, opening subtree {}",
                    state.subtree_index,
                    next.subtree_index
                );
                (next, 0)
            }
        };

        // Real outputs in slot order, each paired with its slot's ciphertext
        let mut records = Vec::with_capacity(2);
        let mut encrypted_notes = Vec::with_capacity(2);
        for (slot, commitment) in notes.commitments.iter().enumerate() {
            if commitment.is_empty() {
                continue;
            }
            records.push(LeafRecord {
                commitment: *commitment,
                position: LeafPosition {
                    subtree_index: next.subtree_index,
                    leaf_index: first_leaf + records.len() as u64,
                },
            });
            if let Some(note) = request.encrypted_notes.get(slot) {
                encrypted_notes.push((*commitment, note.clone()));
            }
        }

        let mut events = Vec::with_capacity(nullifiers.len() + records.len() + 1);
        events.extend(
            nullifiers
                .iter()
                .map(|nullifier| PoolEvent::NullifierSpent { nullifier: *nullifier }),
        );
        events.extend(records.iter().map(|record| PoolEvent::CommitmentAppended {
            subtree_index: record.position.subtree_index,
            commitment: record.commitment,
            leaf_index: record.position.leaf_index,
            timestamp: ctx.timestamp,
        }));

        self.commit(StateDiff {
            nullifiers,
            commitments: records,
            encrypted_notes,
            snapshot: PoolSnapshot {
                accumulator: next,
                total_supply: self.total_supply,
                fee_balance: self.fees.balance(),
            },
        })?;

        log::info!(
            "Transfer ({}) accepted: {} spent, {} created, subtree {} at leaf {}",
            op.circuit(),
            notes.spent().count(),
            outputs,
            next.subtree_index,
            next.next_leaf_index
        );

        events.push(PoolEvent::Transaction {
            new_commitments: notes.commitments,
            encrypted_notes: request.encrypted_notes,
            ephemeral_keys: request.ephemeral_keys,
            view_tag: request.view_tag,
        });

        Ok(Receipt {
            events,
            accumulator: next,
        })
    }
}
