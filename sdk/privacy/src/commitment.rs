//! Note Commitments
//!
//! ```text
//! Commitment = Poseidon(value || randomness || owner_pk)
//! ```
//!
//! The all-zero commitment is reserved as the "empty output slot" marker and
//! is never produced by the scheme for a real note in practice.

use ark_bls12_381::Fr;
use ark_std::rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::poseidon;

/// A note commitment (32 bytes)
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Commitment(#[serde(with = "hex::serde")] pub [u8; 32]);

impl Commitment {
    /// Marker for an unused output slot.
    pub const EMPTY: Self = Self([0u8; 32]);

    pub fn from_field(f: Fr) -> Self {
        Self(poseidon::to_bytes(f))
    }

    pub fn to_field(&self) -> Fr {
        poseidon::from_bytes(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl AsRef<[u8]> for Commitment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Commitment {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Commitment scheme using Poseidon hash
#[derive(Debug, Default, Clone, Copy)]
pub struct CommitmentScheme;

impl CommitmentScheme {
    pub fn new() -> Self {
        Self
    }

    /// Commit to a note: C = Poseidon(value, randomness, owner_pk)
    ///
    /// # Arguments
    /// * `value` - The note value (amount)
    /// * `randomness` - Random blinding factor (32 bytes)
    /// * `owner_pk` - Owner's public key (32 bytes, compressed)
    pub fn commit(&self, value: u128, randomness: &[u8; 32], owner_pk: &[u8; 32]) -> Commitment {
        let result = poseidon::hash(&[
            Fr::from(value),
            poseidon::from_bytes(randomness),
            poseidon::from_bytes(owner_pk),
        ]);
        Commitment::from_field(result)
    }

    /// Generate random blinding factor
    pub fn random_blinding<R: Rng>(rng: &mut R) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_deterministic() {
        let scheme = CommitmentScheme::new();
        let randomness = [42u8; 32];
        let owner_pk = [1u8; 32];

        let c1 = scheme.commit(1000, &randomness, &owner_pk);
        let c2 = scheme.commit(1000, &randomness, &owner_pk);

        assert_eq!(c1, c2, "same inputs should produce same commitment");
    }

    #[test]
    fn test_commitment_hiding() {
        let scheme = CommitmentScheme::new();
        let owner_pk = [1u8; 32];

        let c1 = scheme.commit(1000, &[1u8; 32], &owner_pk);
        let c2 = scheme.commit(1000, &[2u8; 32], &owner_pk);

        assert_ne!(c1, c2, "different randomness should produce different commitments");
    }

    #[test]
    fn test_commitment_binding() {
        let scheme = CommitmentScheme::new();
        let randomness = [42u8; 32];
        let owner_pk = [1u8; 32];

        let c1 = scheme.commit(1000, &randomness, &owner_pk);
        let c2 = scheme.commit(2000, &randomness, &owner_pk);

        assert_ne!(c1, c2, "different values should produce different commitments");
        assert!(!c1.is_empty());
    }

    #[test]
    fn test_random_blinding_varies() {
        let mut rng = rand::thread_rng();
        let a = CommitmentScheme::random_blinding(&mut rng);
        let b = CommitmentScheme::random_blinding(&mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_marker() {
        assert!(Commitment::EMPTY.is_empty());
        assert!(!Commitment([1u8; 32]).is_empty());
    }
}
