//! Public-signal encoding
//!
//! A signal is one 32-byte little-endian field element. Roots, commitments
//! and nullifiers are carried verbatim; integers are zero-extended.

use serde::{Deserialize, Serialize};
use shade_privacy::{Commitment, Nullifier, Root};
use std::fmt;

use crate::error::PoolError;
use crate::verifier::Circuit;

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signal(#[serde(with = "hex::serde")] pub [u8; 32]);

impl Signal {
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&value.to_le_bytes());
        Self(bytes)
    }

    pub fn from_u128(value: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..16].copy_from_slice(&value.to_le_bytes());
        Self(bytes)
    }

    /// `None` if any byte above the low 8 is set.
    pub fn to_u64(&self) -> Option<u64> {
        if self.0[8..].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 8];
        low.copy_from_slice(&self.0[..8]);
        Some(u64::from_le_bytes(low))
    }

    /// `None` if any byte above the low 16 is set.
    pub fn to_u128(&self) -> Option<u128> {
        if self.0[16..].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&self.0[..16]);
        Some(u128::from_le_bytes(low))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Signal {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Commitment> for Signal {
    fn from(c: Commitment) -> Self {
        Self(c.0)
    }
}

impl From<Nullifier> for Signal {
    fn from(n: Nullifier) -> Self {
        Self(n.0)
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signal({})", hex::encode(self.0))
    }
}

/// Positional reader over a circuit's public signals.
///
/// Construction checks the exact count, so the typed accessors never run
/// past the end.
pub(crate) struct SignalReader<'a> {
    signals: &'a [Signal],
    cursor: usize,
}

impl<'a> SignalReader<'a> {
    pub fn new(circuit: Circuit, signals: &'a [Signal]) -> Result<Self, PoolError> {
        let expected = circuit.signal_count();
        if signals.len() != expected {
            return Err(PoolError::SignalCount {
                circuit,
                expected,
                got: signals.len(),
            });
        }
        Ok(Self { signals, cursor: 0 })
    }

    fn next(&mut self) -> Signal {
        let signal = self.signals[self.cursor];
        self.cursor += 1;
        signal
    }

    pub fn root(&mut self) -> Root {
        self.next().0
    }

    pub fn commitment(&mut self) -> Commitment {
        Commitment(self.next().0)
    }

    pub fn nullifier(&mut self) -> Nullifier {
        Nullifier(self.next().0)
    }

    pub fn u64(&mut self, name: &'static str) -> Result<u64, PoolError> {
        let index = self.cursor;
        self.next()
            .to_u64()
            .ok_or(PoolError::SignalOutOfRange { index, name })
    }

    pub fn u128(&mut self, name: &'static str) -> Result<u128, PoolError> {
        let index = self.cursor;
        self.next()
            .to_u128()
            .ok_or(PoolError::SignalOutOfRange { index, name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_encoding_is_little_endian() {
        let s = Signal::from_u64(0x0102);
        assert_eq!(s.0[0], 0x02);
        assert_eq!(s.0[1], 0x01);
        assert!(s.0[2..].iter().all(|b| *b == 0));
        assert_eq!(s.to_u64(), Some(0x0102));
        assert_eq!(s.to_u128(), Some(0x0102));
    }

    #[test]
    fn test_out_of_range_integers_rejected() {
        let big = Signal::from_u128(u128::from(u64::MAX) + 1);
        assert_eq!(big.to_u64(), None);
        assert_eq!(big.to_u128(), Some(u128::from(u64::MAX) + 1));

        let field = Signal([0xff; 32]);
        assert_eq!(field.to_u128(), None);
    }

    #[test]
    fn test_reader_rejects_wrong_count() {
        let signals = vec![Signal::default(); 3];
        let err = SignalReader::new(Circuit::MintRegular, &signals).err().unwrap();
        assert_eq!(
            err,
            PoolError::SignalCount {
                circuit: Circuit::MintRegular,
                expected: 4,
                got: 3
            }
        );
    }

    #[test]
    fn test_reader_reports_bad_index() {
        let signals = vec![
            Signal([1u8; 32]),
            Signal([2u8; 32]),
            Signal([3u8; 32]),
            Signal([0xff; 32]),
        ];
        let mut reader = SignalReader::new(Circuit::MintRegular, &signals).unwrap();
        assert_eq!(reader.root(), [1u8; 32]);
        assert_eq!(reader.root(), [2u8; 32]);
        assert_eq!(reader.commitment(), Commitment([3u8; 32]));
        assert_eq!(
            reader.u128("amount"),
            Err(PoolError::SignalOutOfRange {
                index: 3,
                name: "amount"
            })
        );
    }
}
