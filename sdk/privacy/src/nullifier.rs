//! Nullifiers
//!
//! ```text
//! Nullifier = PRF(spending_key, note_commitment, position)
//! ```
//!
//! Once a nullifier is published, the corresponding note cannot be spent again.

use ark_bls12_381::Fr;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::commitment::Commitment;
use crate::poseidon;

/// "NULL" domain separator for nullifier derivation
const NULLIFIER_DOMAIN: u64 = 0x4e55_4c4c;

/// A nullifier (32 bytes) - unique tag for a spent note
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Nullifier(#[serde(with = "hex::serde")] pub [u8; 32]);

impl Nullifier {
    /// Marker for an unused input slot.
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

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl AsRef<[u8]> for Nullifier {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nullifier({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Nullifier derivation key (spending key)
///
/// Knowledge of this key is required to derive valid nullifiers.
#[derive(Clone)]
pub struct NullifierKey {
    key: [u8; 32],
}

impl NullifierKey {
    pub fn from_bytes(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Derive a nullifier for a note
    ///
    /// Nullifier = PRF_nk(commitment || position)
    ///
    /// `position` is the note's global leaf position and prevents two notes
    /// with identical contents from sharing a nullifier.
    pub fn derive_nullifier(&self, commitment: &Commitment, position: u64) -> Nullifier {
        let result = poseidon::hash(&[
            Fr::from(NULLIFIER_DOMAIN),
            poseidon::from_bytes(&self.key),
            commitment.to_field(),
            Fr::from(position),
        ]);
        Nullifier::from_field(result)
    }
}

impl fmt::Debug for NullifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NullifierKey(..)")
    }
}
