mod mint;

use shade_privacy::{Commitment, Nullifier};

use crate::account::AccountId;
use crate::accumulator::AccumulatorParams;
use crate::error::PoolError;
use crate::fees::FeeConfig;
use crate::pool::{CallContext, PoolConfig, Receipt, ShieldedPool};
use crate::prover::{InputSource, MockProver};
use crate::storage::{MemoryStore, PoolStore};
use crate::verifier::VerifierSet;

pub(super) const MINT_AMOUNT: u128 = 100;
pub(super) const MINT_PRICE: u128 = 10;

pub(super) fn account(id: u8) -> AccountId {
    let mut bytes = [0u8; 32];
    bytes[0] = id;
    AccountId(bytes)
}

pub(super) fn note(id: u8) -> Commitment {
    let mut bytes = [0u8; 32];
    bytes[0] = 0xC0;
    bytes[31] = id;
    Commitment(bytes)
}

pub(super) fn nullifier(id: u8) -> Nullifier {
    let mut bytes = [0u8; 32];
    bytes[0] = 0x4E;
    bytes[31] = id;
    Nullifier(bytes)
}

/// Four-leaf subtrees, eight of them, ten mints of supply.
pub(super) fn test_config() -> PoolConfig {
    PoolConfig {
        name: "Test Shade".into(),
        symbol: "TSHD".into(),
        decimals: 18,
        params: AccumulatorParams::new(2, 3).unwrap(),
        mint_amount: MINT_AMOUNT,
        mint_price: MINT_PRICE,
        max_supply: 10 * MINT_AMOUNT,
        fees: FeeConfig::new(account(0xA1), account(0xB2), 9_000).unwrap(),
    }
}

/// Two-leaf subtrees, only two of which fit in the finalized tree.
pub(super) fn tiny_config() -> PoolConfig {
    PoolConfig {
        params: AccumulatorParams::new(1, 1).unwrap(),
        ..test_config()
    }
}

pub(super) fn mint_ctx(caller: AccountId) -> CallContext {
    CallContext {
        caller,
        value: MINT_PRICE,
        timestamp: 1_700_000_000,
    }
}

pub(super) fn transfer_ctx(caller: AccountId) -> CallContext {
    CallContext {
        caller,
        value: 0,
        timestamp: 1_700_000_100,
    }
}

/// An initialized pool driven by a prover mirror that only advances on
/// accepted operations.
pub(super) struct Harness<S: PoolStore = MemoryStore> {
    pub pool: ShieldedPool<S>,
    pub prover: MockProver,
}

impl Harness<MemoryStore> {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl<S: PoolStore> Harness<S> {
    pub fn with_store(store: S) -> Self {
        Self::with_config(test_config(), store)
    }

    pub fn with_config(config: PoolConfig, store: S) -> Self {
        let prover = MockProver::new(config.params).unwrap();
        let mut pool = ShieldedPool::open(config, VerifierSet::mock(), store).unwrap();
        pool.initialize(prover.genesis_roots()).unwrap();
        Self { pool, prover }
    }

    pub fn mint(&mut self, commitment: Commitment) -> Result<Receipt, PoolError> {
        let prepared = self.prover.prepare_mint(commitment, MINT_AMOUNT).unwrap();
        let request = prepared.mint_request(vec![0xEE, commitment.0[31]]);
        let receipt = self.pool.mint(&mint_ctx(account(1)), request)?;
        self.prover.confirm(prepared);
        Ok(receipt)
    }

    pub fn transfer(
        &mut self,
        source: InputSource,
        nullifiers: [Nullifier; 2],
        outputs: [Commitment; 2],
    ) -> Result<Receipt, PoolError> {
        let prepared = self.prover.prepare_transfer(source, nullifiers, outputs).unwrap();
        let request =
            prepared.transfer_request(vec![vec![0xA0], vec![0xB0]], [[1u8; 32], [2u8; 32]], 7);
        let receipt = self.pool.transfer(&transfer_ctx(account(2)), request)?;
        self.prover.confirm(prepared);
        Ok(receipt)
    }

    /// Mint notes `first..first + count`.
    pub fn mint_many(&mut self, first: u8, count: u8) {
        for id in first..first + count {
            self.mint(note(id)).unwrap();
        }
    }
}
