use std::path::PathBuf;

use anyhow::{Context, Result};
use shade_config::ShadeConfig;
use shade_core::{PoolStore, RocksDbStore};

/// Print the snapshot and ledger sizes of a persisted pool.
pub fn run(db_path: Option<PathBuf>) -> Result<()> {
    let path = match db_path {
        Some(path) => path,
        None => {
            let database = ShadeConfig::load()?.database;
            if database.in_memory {
                anyhow::bail!("configured pool is in memory only; pass --db <path>");
            }
            PathBuf::from(database.path)
        }
    };
    if !path.exists() {
        anyhow::bail!("no pool database at {}", path.display());
    }

    let store = RocksDbStore::open(&path)?;
    println!("📁 {}", path.display());

    match store.load_snapshot()? {
        Some(snapshot) => {
            let json =
                serde_json::to_string_pretty(&snapshot).context("failed to encode snapshot")?;
            println!("{}", json);
        }
        None => println!("(pool not initialized)"),
    }

    println!("nullifiers spent     : {}", store.nullifier_count()?);
    println!("commitments recorded : {}", store.commitment_count()?);
    Ok(())
}
