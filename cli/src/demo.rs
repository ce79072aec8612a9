//! Local Pool Walkthrough
//!
//! Drives a pool through the full note lifecycle against the mock prover:
//! filling the active subtree, a rollover mint, a transfer out of the
//! finalized tree, a rejected replay and a fee payout.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use shade_config::global_config;
use shade_core::{
    AccountId, Commitment, InputSource, MemoryPayout, MemoryStore, MockProver, PoolConfig,
    PoolError, PoolEvent, PoolService, PoolStore, Receipt, RocksDbStore, ShieldedPool, VerifierSet,
};
use shade_privacy::{CommitmentScheme, NullifierKey};

#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// RocksDB path; in-memory store when unset
    pub db_path: Option<PathBuf>,
    pub subtree_height: u8,
    pub finalized_height: u8,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            subtree_height: 2,
            finalized_height: 4,
        }
    }
}

/// A note the demo wallet knows the opening of.
struct OwnedNote {
    commitment: Commitment,
    /// Global position used for nullifier derivation
    position: u64,
}

pub async fn run(demo: DemoConfig) -> Result<()> {
    let mut settings = global_config().clone();
    settings.pool.subtree_height = demo.subtree_height;
    settings.pool.finalized_height = demo.finalized_height;
    let config = PoolConfig::from_config(&settings)?;

    match &demo.db_path {
        Some(path) => {
            println!("📁 Pool database: {}", path.display());
            let store = RocksDbStore::open(path)?;
            walkthrough(config, store).await
        }
        None => {
            println!("🧠 Pool database: in memory");
            walkthrough(config, MemoryStore::new()).await
        }
    }
}

async fn walkthrough<S: PoolStore + 'static>(config: PoolConfig, store: S) -> Result<()> {
    let mut prover = MockProver::new(config.params)?;
    let capacity = config.params.subtree_capacity();
    let mint_price = config.mint_price;
    let mint_amount = config.mint_amount;

    let mut pool = ShieldedPool::open(config, VerifierSet::mock(), store)?;
    if pool.is_initialized() {
        bail!("database already holds a pool; point --db at a fresh directory");
    }
    let genesis = pool.initialize(prover.genesis_roots())?;
    println!(
        "🌱 Initialized {} ({}): {} leaves per subtree",
        pool.name(),
        pool.symbol(),
        capacity
    );
    log::debug!("Genesis accumulator: {:?}", genesis);

    let service = PoolService::start(pool, MemoryPayout::new());
    let mut events = service.subscribe();
    let tally = tokio::spawn(async move {
        let mut count = 0usize;
        while let Ok(event) = events.recv().await {
            log::debug!("{} event", event.name());
            count += 1;
        }
        count
    });

    let minter = AccountId::derive(b"shade-demo-minter");
    let recipient = AccountId::derive(b"shade-demo-recipient");
    let scheme = CommitmentScheme::new();
    let spending_key = NullifierKey::from_bytes([7u8; 32]);
    let mut wallet = Vec::new();

    // --- Fill the active subtree, then roll it over ---
    println!();
    println!("🪙 Minting {} notes (the last one triggers a rollover)...", capacity + 1);
    for i in 0..=capacity {
        let commitment = scheme.commit(mint_amount, &blinding(i), recipient.as_bytes());
        let prepared = prover.prepare_mint(commitment, mint_amount)?;
        let receipt = service
            .mint(minter, mint_price, prepared.mint_request(format!("note-{}", i).into_bytes()))
            .await?;
        prover.confirm(prepared);

        print_receipt(&receipt)?;
        wallet.push(OwnedNote {
            commitment,
            position: i,
        });
    }

    // --- Spend the first two notes out of the finalized tree ---
    println!();
    println!("🔁 Spending two finalized notes into two fresh ones...");
    let spent = [
        spending_key.derive_nullifier(&wallet[0].commitment, wallet[0].position),
        spending_key.derive_nullifier(&wallet[1].commitment, wallet[1].position),
    ];
    let outputs = [
        scheme.commit(mint_amount, &blinding(100), recipient.as_bytes()),
        scheme.commit(mint_amount, &blinding(101), recipient.as_bytes()),
    ];
    let prepared = prover.prepare_transfer(InputSource::Finalized, spent, outputs)?;
    let request = prepared.transfer_request(
        vec![b"out-0".to_vec(), b"out-1".to_vec()],
        [[0x11; 32], [0x22; 32]],
        0x5a,
    );
    let receipt = service.transfer(recipient, request.clone()).await?;
    prover.confirm(prepared);
    print_receipt(&receipt)?;

    // --- Replays are double-spends ---
    println!();
    println!("🚫 Replaying the same transfer...");
    match service.transfer(recipient, request).await {
        Ok(_) => bail!("replayed transfer was accepted"),
        Err(e) => match e.downcast_ref::<PoolError>() {
            Some(err) if matches!(err, PoolError::NullifierSpent(_)) => {
                println!("   rejected ({:?}): {}", err.kind(), err);
            }
            _ => return Err(e.context("replay failed for the wrong reason")),
        },
    }

    // --- Payout ---
    println!();
    println!("💸 Distributing accrued mint fees...");
    let receipt = service.distribute_fees().await?;
    print_receipt(&receipt)?;

    let status = service.status().await?;
    let state = status.accumulator.context("pool lost its accumulator")?;
    println!();
    println!("✅ Done");
    println!("   subtree index  : {}", state.subtree_index);
    println!("   next leaf      : {}", state.next_leaf_index);
    println!("   active root    : {}", hex::encode(state.active_root));
    println!("   finalized root : {}", hex::encode(state.finalized_root));
    println!("   total supply   : {}", status.total_supply);
    println!("   fee balance    : {}", status.fee_balance);

    // Closing the service ends the event stream
    drop(service);
    let count = tally.await?;
    println!("   events emitted : {}", count);

    Ok(())
}

fn print_receipt(receipt: &Receipt) -> Result<()> {
    for event in &receipt.events {
        println!("   {}", render(event)?);
    }
    Ok(())
}

fn render(event: &PoolEvent) -> Result<String> {
    serde_json::to_string(event).context("failed to encode event")
}

fn blinding(seed: u64) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[..8].copy_from_slice(&seed.to_le_bytes());
    out[31] = 0x5d;
    out
}
