use super::*;
use crate::error::ErrorKind;
use crate::events::PoolEvent;
use crate::operation::{MintOperation, Proof, RegularMint, RolloverMint};
use crate::pool::MintRequest;
use crate::verifier::{Circuit, mock_proof};

fn signed(op: MintOperation) -> MintRequest {
    let signals = op.public_signals();
    MintRequest {
        variant: op.tag(),
        proof: Proof {
            bytes: mock_proof(op.circuit(), &signals),
            public_signals: signals,
        },
        encrypted_note: vec![0xEE],
    }
}

/// Everything a rejected call must leave untouched.
fn observable(h: &Harness) -> (Option<crate::AccumulatorState>, u128, u128, usize) {
    (
        h.pool.accumulator().copied(),
        h.pool.total_supply(),
        h.pool.fee_balance(),
        h.pool.store().commitment_count(),
    )
}

#[test]
fn first_mint_appends_leaf_zero() {
    let mut h = Harness::new();
    let genesis_root = h.pool.active_subtree_root().unwrap();

    let receipt = h.mint(note(1)).unwrap();

    // --- Events ---
    assert_eq!(receipt.events.len(), 2);
    match &receipt.events[0] {
        PoolEvent::CommitmentAppended {
            subtree_index,
            commitment,
            leaf_index,
            timestamp,
        } => {
            assert_eq!(*subtree_index, 0);
            assert_eq!(*commitment, note(1));
            assert_eq!(*leaf_index, 0);
            assert_eq!(*timestamp, 1_700_000_000);
        }
        other => panic!("unexpected event {:?}", other),
    }
    match &receipt.events[1] {
        PoolEvent::Minted {
            minter, leaf_index, ..
        } => {
            assert_eq!(*minter, account(1));
            assert_eq!(*leaf_index, 0);
        }
        other => panic!("unexpected event {:?}", other),
    }

    // --- State ---
    let state = h.pool.accumulator().copied().unwrap();
    assert_eq!(state.next_leaf_index, 1);
    assert_eq!(state.subtree_index, 0);
    assert_ne!(state.active_root, genesis_root);
    assert_eq!(state.active_root, h.prover.active_root());
    assert_eq!(h.pool.total_supply(), MINT_AMOUNT);
    assert_eq!(h.pool.fee_balance(), MINT_PRICE);
    assert!(h.pool.commitment_exists(&note(1)).unwrap());
    assert_eq!(h.pool.encrypted_note(&note(1)).unwrap(), Some(vec![0xEE, 1]));
}

#[test]
fn full_subtree_requires_rollover_mint() {
    let mut h = Harness::new();
    h.mint_many(1, 4);

    let full = h.pool.accumulator().copied().unwrap();
    assert!(full.is_full());

    // A regular mint against the full subtree is rejected outright
    let regular = signed(MintOperation::Regular(RegularMint {
        new_active_root: [9u8; 32],
        old_active_root: full.active_root,
        commitment: note(5),
        amount: MINT_AMOUNT,
    }));
    let before = observable(&h);
    let err = h.pool.mint(&mint_ctx(account(1)), regular).unwrap_err();
    assert_eq!(err, PoolError::SubtreeFull { capacity: 4 });
    assert_eq!(err.kind(), ErrorKind::Capacity);
    assert_eq!(observable(&h), before);

    // The prover switches to the rollover variant on its own
    let receipt = h.mint(note(5)).unwrap();
    let state = receipt.accumulator;
    assert_eq!(state.subtree_index, 1);
    assert_eq!(state.next_leaf_index, 1);
    assert_eq!(state.finalized_root, h.prover.finalized_root());
    assert_eq!(state.active_root, h.prover.active_root());
    assert_ne!(state.finalized_root, full.finalized_root);

    match &receipt.events[0] {
        PoolEvent::CommitmentAppended {
            subtree_index,
            leaf_index,
            ..
        } => {
            assert_eq!((*subtree_index, *leaf_index), (1, 0));
        }
        other => panic!("unexpected event {:?}", other),
    }

    // The retired subtree root is provable against the new finalized root
    let path = h.prover.finalized_path(0).unwrap();
    assert!(path.verify(&full.active_root, &state.finalized_root));
}

#[test]
fn rollover_mint_before_full_is_rejected() {
    let mut h = Harness::new();
    h.mint(note(1)).unwrap();
    let state = h.pool.accumulator().copied().unwrap();

    let request = signed(MintOperation::Rollover(RolloverMint {
        new_active_root: [1u8; 32],
        new_finalized_root: [2u8; 32],
        old_active_root: state.active_root,
        old_finalized_root: state.finalized_root,
        commitment: note(2),
        amount: MINT_AMOUNT,
        subtree_index: 0,
    }));

    let err = h.pool.mint(&mint_ctx(account(1)), request).unwrap_err();
    assert_eq!(
        err,
        PoolError::SubtreeNotFull {
            next_leaf_index: 1,
            capacity: 4
        }
    );
}

#[test]
fn rollover_mint_with_wrong_subtree_index_is_rejected() {
    let mut h = Harness::new();
    h.mint_many(1, 4);
    let state = h.pool.accumulator().copied().unwrap();

    let request = signed(MintOperation::Rollover(RolloverMint {
        new_active_root: [1u8; 32],
        new_finalized_root: [2u8; 32],
        old_active_root: state.active_root,
        old_finalized_root: state.finalized_root,
        commitment: note(5),
        amount: MINT_AMOUNT,
        subtree_index: 3,
    }));

    let before = observable(&h);
    let err = h.pool.mint(&mint_ctx(account(1)), request).unwrap_err();
    assert_eq!(
        err,
        PoolError::SubtreeIndexMismatch {
            expected: 0,
            claimed: 3
        }
    );
    assert!(err.is_retryable());
    assert_eq!(observable(&h), before);
}

#[test]
fn rollover_mint_into_full_finalized_tree_is_rejected() {
    let mut h = Harness::with_config(tiny_config(), MemoryStore::new());
    h.mint_many(1, 6);
    let state = h.pool.accumulator().copied().unwrap();
    assert_eq!(state.subtree_index, 2);

    let request = signed(MintOperation::Rollover(RolloverMint {
        new_active_root: [1u8; 32],
        new_finalized_root: [2u8; 32],
        old_active_root: state.active_root,
        old_finalized_root: state.finalized_root,
        commitment: note(7),
        amount: MINT_AMOUNT,
        subtree_index: 2,
    }));

    let before = observable(&h);
    let err = h.pool.mint(&mint_ctx(account(1)), request).unwrap_err();
    assert_eq!(err, PoolError::FinalizedTreeFull { capacity: 2 });
    assert!(!err.is_retryable());
    assert!(!h.pool.commitment_exists(&note(7)).unwrap());
    assert_eq!(observable(&h), before);
}

#[test]
fn wrong_payment_is_rejected() {
    let mut h = Harness::new();
    let prepared = h.prover.prepare_mint(note(1), MINT_AMOUNT).unwrap();

    for value in [0, MINT_PRICE - 1, MINT_PRICE + 1] {
        let ctx = CallContext {
            value,
            ..mint_ctx(account(1))
        };
        let err = h.pool.mint(&ctx, prepared.mint_request(vec![])).unwrap_err();
        assert_eq!(
            err,
            PoolError::WrongPayment {
                expected: MINT_PRICE,
                received: value
            }
        );
    }
    assert_eq!(h.pool.fee_balance(), 0);
    assert_eq!(h.pool.total_supply(), 0);
}

#[test]
fn supply_cap_stops_minting() {
    let mut h = Harness::new();
    // Ten mints span two rollovers
    h.mint_many(1, 10);
    assert_eq!(h.pool.total_supply(), 10 * MINT_AMOUNT);
    assert_eq!(h.pool.accumulator().unwrap().subtree_index, 2);

    let before = observable(&h);
    let err = h.mint(note(11)).unwrap_err();
    assert_eq!(
        err,
        PoolError::SupplyCapExceeded {
            current: 10 * MINT_AMOUNT,
            mint_amount: MINT_AMOUNT,
            cap: 10 * MINT_AMOUNT
        }
    );
    assert_eq!(observable(&h), before);
}

#[test]
fn duplicate_commitment_is_rejected() {
    let mut h = Harness::new();
    h.mint(note(1)).unwrap();

    let before = observable(&h);
    let err = h.mint(note(1)).unwrap_err();
    assert_eq!(err, PoolError::CommitmentExists(note(1)));
    assert_eq!(err.kind(), ErrorKind::Uniqueness);
    assert_eq!(observable(&h), before);
}

#[test]
fn tampered_proof_is_rejected() {
    let mut h = Harness::new();
    let prepared = h.prover.prepare_mint(note(1), MINT_AMOUNT).unwrap();
    let mut request = prepared.mint_request(vec![]);
    request.proof.bytes[0] ^= 0xFF;

    let err = h.pool.mint(&mint_ctx(account(1)), request).unwrap_err();
    assert_eq!(err, PoolError::InvalidProof(Circuit::MintRegular));
    assert_eq!(err.kind(), ErrorKind::Cryptographic);
    assert!(!h.pool.commitment_exists(&note(1)).unwrap());
}

#[test]
fn proven_amount_must_match_mint_amount() {
    let mut h = Harness::new();
    let prepared = h.prover.prepare_mint(note(1), MINT_AMOUNT - 1).unwrap();

    let err = h.pool.mint(&mint_ctx(account(1)), prepared.mint_request(vec![])).unwrap_err();
    assert_eq!(
        err,
        PoolError::AmountMismatch {
            expected: MINT_AMOUNT,
            proven: MINT_AMOUNT - 1
        }
    );
}

#[test]
fn empty_commitment_is_rejected() {
    let mut h = Harness::new();
    let err = h.mint(Commitment::EMPTY).unwrap_err();
    assert_eq!(err, PoolError::EmptyCommitment);
}

#[test]
fn unknown_variant_is_rejected() {
    let mut h = Harness::new();
    let prepared = h.prover.prepare_mint(note(1), MINT_AMOUNT).unwrap();
    let mut request = prepared.mint_request(vec![]);
    request.variant = 7;

    let err = h.pool.mint(&mint_ctx(account(1)), request).unwrap_err();
    assert!(matches!(err, PoolError::UnknownVariant { tag: 7, .. }));
}

#[test]
fn stale_active_root_is_retryable() {
    let mut h = Harness::new();

    // Two proofs built against the same root; only the first can land
    let first = h.prover.prepare_mint(note(1), MINT_AMOUNT).unwrap();
    let second = h.prover.prepare_mint(note(2), MINT_AMOUNT).unwrap();

    h.pool.mint(&mint_ctx(account(1)), first.mint_request(vec![])).unwrap();
    h.prover.confirm(first);

    let before = observable(&h);
    let err = h.pool.mint(&mint_ctx(account(1)), second.mint_request(vec![])).unwrap_err();
    assert!(matches!(err, PoolError::ActiveRootMismatch { .. }));
    assert!(err.is_retryable());
    assert_eq!(observable(&h), before);

    // Re-proving against the fresh root succeeds
    h.mint(note(2)).unwrap();
    assert_eq!(h.pool.accumulator().unwrap().next_leaf_index, 2);
}

#[test]
fn operations_require_initialization() {
    let config = test_config();
    let prover = MockProver::new(config.params).unwrap();
    let mut pool = ShieldedPool::open(config, VerifierSet::mock(), MemoryStore::new()).unwrap();
    assert!(!pool.is_initialized());

    let prepared = prover.prepare_mint(note(1), MINT_AMOUNT).unwrap();
    let err = pool.mint(&mint_ctx(account(1)), prepared.mint_request(vec![])).unwrap_err();
    assert_eq!(err, PoolError::NotInitialized);
    assert_eq!(pool.active_subtree_root().unwrap_err(), PoolError::NotInitialized);

    pool.initialize(prover.genesis_roots()).unwrap();
    assert_eq!(
        pool.initialize(prover.genesis_roots()).unwrap_err(),
        PoolError::AlreadyInitialized
    );
}
