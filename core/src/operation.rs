//! Typed operation records
//!
//! Each proof arrives as a variant tag plus a flat list of public signals.
//! Decoding turns that pair into one struct per circuit so the dispatcher
//! matches exhaustively instead of indexing into arrays. The layouts below
//! are the compatibility contract with the prover and must not be reordered.
//!
//! | Circuit            | Signals (in order)                                                        |
//! |--------------------|---------------------------------------------------------------------------|
//! | mint / regular     | new_active, old_active, commitment, amount                                |
//! | mint / rollover    | new_active, new_finalized, old_active, old_finalized, commitment, amount, subtree_index |
//! | transfer / active  | new_active, old_active, nf0, nf1, cm0, cm1                                |
//! | transfer / final.  | new_active, old_active, old_finalized, nf0, nf1, cm0, cm1                 |
//! | transfer / rollover| new_active, new_finalized, old_active, old_finalized, nf0, nf1, cm0, cm1, subtree_index |

use serde::{Deserialize, Serialize};
use shade_privacy::{Commitment, Nullifier, Root};

use crate::error::PoolError;
use crate::signal::{Signal, SignalReader};
use crate::verifier::Circuit;

/// Opaque proof bytes plus the public signals they attest to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    #[serde(with = "hex::serde")]
    pub bytes: Vec<u8>,
    pub public_signals: Vec<Signal>,
}

// ============================================================================
// Mint
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegularMint {
    pub new_active_root: Root,
    pub old_active_root: Root,
    pub commitment: Commitment,
    pub amount: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloverMint {
    pub new_active_root: Root,
    pub new_finalized_root: Root,
    pub old_active_root: Root,
    pub old_finalized_root: Root,
    pub commitment: Commitment,
    pub amount: u128,
    pub subtree_index: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintOperation {
    Regular(RegularMint),
    Rollover(RolloverMint),
}

impl MintOperation {
    pub const REGULAR: u8 = 0;
    pub const ROLLOVER: u8 = 1;

    pub fn decode(tag: u8, signals: &[Signal]) -> Result<Self, PoolError> {
        match tag {
            Self::REGULAR => {
                let mut r = SignalReader::new(Circuit::MintRegular, signals)?;
                Ok(Self::Regular(RegularMint {
                    new_active_root: r.root(),
                    old_active_root: r.root(),
                    commitment: r.commitment(),
                    amount: r.u128("amount")?,
                }))
            }
            Self::ROLLOVER => {
                let mut r = SignalReader::new(Circuit::MintRollover, signals)?;
                Ok(Self::Rollover(RolloverMint {
                    new_active_root: r.root(),
                    new_finalized_root: r.root(),
                    old_active_root: r.root(),
                    old_finalized_root: r.root(),
                    commitment: r.commitment(),
                    amount: r.u128("amount")?,
                    subtree_index: r.u64("subtree_index")?,
                }))
            }
            tag => Err(PoolError::UnknownVariant {
                operation: "mint",
                tag,
            }),
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            Self::Regular(_) => Self::REGULAR,
            Self::Rollover(_) => Self::ROLLOVER,
        }
    }

    pub fn circuit(&self) -> Circuit {
        match self {
            Self::Regular(_) => Circuit::MintRegular,
            Self::Rollover(_) => Circuit::MintRollover,
        }
    }

    pub fn commitment(&self) -> Commitment {
        match self {
            Self::Regular(m) => m.commitment,
            Self::Rollover(m) => m.commitment,
        }
    }

    pub fn amount(&self) -> u128 {
        match self {
            Self::Regular(m) => m.amount,
            Self::Rollover(m) => m.amount,
        }
    }

    pub fn public_signals(&self) -> Vec<Signal> {
        match self {
            Self::Regular(m) => vec![
                m.new_active_root.into(),
                m.old_active_root.into(),
                m.commitment.into(),
                Signal::from_u128(m.amount),
            ],
            Self::Rollover(m) => vec![
                m.new_active_root.into(),
                m.new_finalized_root.into(),
                m.old_active_root.into(),
                m.old_finalized_root.into(),
                m.commitment.into(),
                Signal::from_u128(m.amount),
                Signal::from_u64(m.subtree_index),
            ],
        }
    }
}

// ============================================================================
// Transfer
// ============================================================================

/// The two input and two output slots every transfer circuit carries.
/// All-zero entries are unused slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteSlots {
    pub nullifiers: [Nullifier; 2],
    pub commitments: [Commitment; 2],
}

impl NoteSlots {
    fn read(r: &mut SignalReader<'_>) -> Self {
        Self {
            nullifiers: [r.nullifier(), r.nullifier()],
            commitments: [r.commitment(), r.commitment()],
        }
    }

    fn write(&self, out: &mut Vec<Signal>) {
        out.extend(self.nullifiers.iter().map(|n| Signal::from(*n)));
        out.extend(self.commitments.iter().map(|c| Signal::from(*c)));
    }

    pub fn spent(&self) -> impl Iterator<Item = &Nullifier> {
        self.nullifiers.iter().filter(|n| !n.is_empty())
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Commitment> {
        self.commitments.iter().filter(|c| !c.is_empty())
    }

    /// Number of real (non-empty) output commitments.
    pub fn output_count(&self) -> u64 {
        self.outputs().count() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveTransfer {
    pub new_active_root: Root,
    pub old_active_root: Root,
    pub notes: NoteSlots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizedTransfer {
    pub new_active_root: Root,
    pub old_active_root: Root,
    pub old_finalized_root: Root,
    pub notes: NoteSlots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloverTransfer {
    pub new_active_root: Root,
    pub new_finalized_root: Root,
    pub old_active_root: Root,
    pub old_finalized_root: Root,
    pub notes: NoteSlots,
    pub subtree_index: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOperation {
    /// Inputs proven against the active subtree
    ActiveInput(ActiveTransfer),
    /// Inputs proven against the finalized tree
    FinalizedInput(FinalizedTransfer),
    /// Subtree is full; retire it and open the next one
    Rollover(RolloverTransfer),
}

impl TransferOperation {
    pub const ACTIVE_INPUT: u8 = 0;
    pub const FINALIZED_INPUT: u8 = 1;
    pub const ROLLOVER: u8 = 2;

    pub fn decode(tag: u8, signals: &[Signal]) -> Result<Self, PoolError> {
        match tag {
            Self::ACTIVE_INPUT => {
                let mut r = SignalReader::new(Circuit::TransferActive, signals)?;
                Ok(Self::ActiveInput(ActiveTransfer {
                    new_active_root: r.root(),
                    old_active_root: r.root(),
                    notes: NoteSlots::read(&mut r),
                }))
            }
            Self::FINALIZED_INPUT => {
                let mut r = SignalReader::new(Circuit::TransferFinalized, signals)?;
                Ok(Self::FinalizedInput(FinalizedTransfer {
                    new_active_root: r.root(),
                    old_active_root: r.root(),
                    old_finalized_root: r.root(),
                    notes: NoteSlots::read(&mut r),
                }))
            }
            Self::ROLLOVER => {
                let mut r = SignalReader::new(Circuit::TransferRollover, signals)?;
                Ok(Self::Rollover(RolloverTransfer {
                    new_active_root: r.root(),
                    new_finalized_root: r.root(),
                    old_active_root: r.root(),
                    old_finalized_root: r.root(),
                    notes: NoteSlots::read(&mut r),
                    subtree_index: r.u64("subtree_index")?,
                }))
            }
            tag => Err(PoolError::UnknownVariant {
                operation: "transfer",
                tag,
            }),
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            Self::ActiveInput(_) => Self::ACTIVE_INPUT,
            Self::FinalizedInput(_) => Self::FINALIZED_INPUT,
            Self::Rollover(_) => Self::ROLLOVER,
        }
    }

    pub fn circuit(&self) -> Circuit {
        match self {
            Self::ActiveInput(_) => Circuit::TransferActive,
            Self::FinalizedInput(_) => Circuit::TransferFinalized,
            Self::Rollover(_) => Circuit::TransferRollover,
        }
    }

    pub fn notes(&self) -> &NoteSlots {
        match self {
            Self::ActiveInput(t) => &t.notes,
            Self::FinalizedInput(t) => &t.notes,
            Self::Rollover(t) => &t.notes,
        }
    }

    pub fn public_signals(&self) -> Vec<Signal> {
        let mut out = Vec::with_capacity(self.circuit().signal_count());
        match self {
            Self::ActiveInput(t) => {
                out.push(t.new_active_root.into());
                out.push(t.old_active_root.into());
                t.notes.write(&mut out);
            }
            Self::FinalizedInput(t) => {
                out.push(t.new_active_root.into());
                out.push(t.old_active_root.into());
                out.push(t.old_finalized_root.into());
                t.notes.write(&mut out);
            }
            Self::Rollover(t) => {
                out.push(t.new_active_root.into());
                out.push(t.new_finalized_root.into());
                out.push(t.old_active_root.into());
                out.push(t.old_finalized_root.into());
                t.notes.write(&mut out);
                out.push(Signal::from_u64(t.subtree_index));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(b: u8) -> Signal {
        Signal([b; 32])
    }

    #[test]
    fn test_decode_regular_mint() {
        let signals = vec![sig(1), sig(2), sig(3), Signal::from_u128(500)];
        let op = MintOperation::decode(MintOperation::REGULAR, &signals).unwrap();

        match op {
            MintOperation::Regular(m) => {
                assert_eq!(m.new_active_root, [1u8; 32]);
                assert_eq!(m.old_active_root, [2u8; 32]);
                assert_eq!(m.commitment, Commitment([3u8; 32]));
                assert_eq!(m.amount, 500);
            }
            other => panic!("expected regular mint, got {:?}", other),
        }
        assert_eq!(op.public_signals(), signals, "encoding must preserve order");
    }

    #[test]
    fn test_decode_rollover_mint() {
        let signals = vec![
            sig(1),
            sig(2),
            sig(3),
            sig(4),
            sig(5),
            Signal::from_u128(7),
            Signal::from_u64(9),
        ];
        let op = MintOperation::decode(MintOperation::ROLLOVER, &signals).unwrap();
        let MintOperation::Rollover(m) = op else {
            panic!("expected rollover mint");
        };
        assert_eq!(m.new_finalized_root, [2u8; 32]);
        assert_eq!(m.old_finalized_root, [4u8; 32]);
        assert_eq!(m.subtree_index, 9);
        assert_eq!(op.circuit(), Circuit::MintRollover);
        assert_eq!(op.public_signals(), signals);
    }

    #[test]
    fn test_mint_wrong_count_and_tag() {
        let err = MintOperation::decode(MintOperation::ROLLOVER, &[sig(1); 4]).unwrap_err();
        assert!(matches!(err, PoolError::SignalCount { expected: 7, got: 4, .. }));

        let err = MintOperation::decode(5, &[sig(1); 4]).unwrap_err();
        assert_eq!(
            err,
            PoolError::UnknownVariant {
                operation: "mint",
                tag: 5
            }
        );
    }

    #[test]
    fn test_decode_transfer_variants() {
        let active = vec![sig(1), sig(2), sig(3), sig(0), sig(5), sig(6)];
        let op = TransferOperation::decode(TransferOperation::ACTIVE_INPUT, &active).unwrap();
        assert_eq!(op.notes().spent().count(), 1, "zero nullifier is an empty slot");
        assert_eq!(op.notes().output_count(), 2);
        assert_eq!(op.public_signals(), active);

        let finalized = vec![sig(1), sig(2), sig(3), sig(4), sig(5), sig(6), sig(0)];
        let op = TransferOperation::decode(TransferOperation::FINALIZED_INPUT, &finalized).unwrap();
        let TransferOperation::FinalizedInput(t) = op else {
            panic!("expected finalized-input transfer");
        };
        assert_eq!(t.old_finalized_root, [3u8; 32]);
        assert_eq!(t.notes.output_count(), 1);
        assert_eq!(op.public_signals(), finalized);

        let mut rollover = vec![sig(1), sig(2), sig(3), sig(4), sig(5), sig(6), sig(7), sig(8)];
        rollover.push(Signal::from_u64(3));
        let op = TransferOperation::decode(TransferOperation::ROLLOVER, &rollover).unwrap();
        let TransferOperation::Rollover(t) = op else {
            panic!("expected rollover transfer");
        };
        assert_eq!(t.subtree_index, 3);
        assert_eq!(t.notes.commitments, [Commitment([7u8; 32]), Commitment([8u8; 32])]);
        assert_eq!(op.public_signals(), rollover);
    }

    #[test]
    fn test_transfer_unknown_tag() {
        assert!(matches!(
            TransferOperation::decode(3, &[]),
            Err(PoolError::UnknownVariant { operation: "transfer", tag: 3 })
        ));
    }

    #[test]
    fn test_subtree_index_out_of_range() {
        let mut signals = vec![sig(1); 5];
        signals.push(Signal::from_u128(1));
        signals.push(Signal([0xff; 32]));
        let err = MintOperation::decode(MintOperation::ROLLOVER, &signals).unwrap_err();
        assert_eq!(
            err,
            PoolError::SignalOutOfRange {
                index: 6,
                name: "subtree_index"
            }
        );
    }
}
