//! Shared Poseidon parameters
//!
//! Field: BLS12-381 Fr (255 bits)
//! Rate: 2, Capacity: 1
//! Security: 128 bits
//!
//! Deriving the round constants is expensive, so the configuration is built
//! once per process and shared by the commitment scheme, nullifier PRF and
//! Merkle hasher.

use ark_bls12_381::Fr;
use ark_crypto_primitives::sponge::{
    CryptographicSponge,
    poseidon::{PoseidonConfig, PoseidonSponge, find_poseidon_ark_and_mds},
};
use ark_ff::{BigInteger, PrimeField};
use std::sync::LazyLock;

const PRIME_BITS: u64 = 255;
const RATE: usize = 2;
const CAPACITY: usize = 1;
const FULL_ROUNDS: u64 = 8;
const PARTIAL_ROUNDS: u64 = 57;
const ALPHA: u64 = 5;
const SKIP_MATRICES: u64 = 0;

static CONFIG: LazyLock<PoseidonConfig<Fr>> = LazyLock::new(|| {
    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        PRIME_BITS,
        RATE,
        FULL_ROUNDS,
        PARTIAL_ROUNDS,
        SKIP_MATRICES,
    );

    PoseidonConfig::new(
        FULL_ROUNDS as usize,
        PARTIAL_ROUNDS as usize,
        ALPHA,
        mds,
        ark,
        RATE,
        CAPACITY,
    )
});

/// The process-wide Poseidon configuration.
pub fn config() -> &'static PoseidonConfig<Fr> {
    &CONFIG
}

/// Absorb `inputs` in order and squeeze a single field element.
pub fn hash(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::new(config());
    for input in inputs {
        sponge.absorb(input);
    }
    sponge.squeeze_field_elements(1)[0]
}

/// Canonical little-endian encoding of a field element.
pub fn to_bytes(f: Fr) -> [u8; 32] {
    let bytes = f.into_bigint().to_bytes_le();
    let mut arr = [0u8; 32];
    arr[..bytes.len()].copy_from_slice(&bytes);
    arr
}

/// Reduce 32 little-endian bytes into the field.
pub fn from_bytes(bytes: &[u8; 32]) -> Fr {
    Fr::from_le_bytes_mod_order(bytes)
}
