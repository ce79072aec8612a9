use anyhow::{Context, Result};
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use shade_privacy::{Commitment, Nullifier};
use std::path::Path;
use std::sync::Arc;

use super::state::{LeafPosition, PoolSnapshot, PoolStore, StateDiff};

const CF_NULLIFIERS: &str = "nullifiers";
const CF_COMMITMENTS: &str = "commitments";
const CF_ENCRYPTED_NOTES: &str = "encrypted_notes";
const CF_POOL_META: &str = "pool_meta";

const SNAPSHOT_KEY: &[u8] = b"snapshot";

/// A thread-safe wrapper around RocksDB.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
}

impl RocksDbStore {
    /// Opens the database at the specified path, creating it if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = vec![
            ColumnFamilyDescriptor::new(CF_NULLIFIERS, Options::default()),
            ColumnFamilyDescriptor::new(CF_COMMITMENTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_ENCRYPTED_NOTES, Options::default()),
            ColumnFamilyDescriptor::new(CF_POOL_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, families)
            .map_err(|e| anyhow::anyhow!("Failed to open RocksDB: {}", e))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Number of spent nullifiers (full scan, for inspection only)
    pub fn nullifier_count(&self) -> Result<usize> {
        self.count_cf(CF_NULLIFIERS)
    }

    /// Number of recorded commitments (full scan, for inspection only)
    pub fn commitment_count(&self) -> Result<usize> {
        self.count_cf(CF_COMMITMENTS)
    }

    fn count_cf(&self, name: &str) -> Result<usize> {
        let cf = self
            .db
            .cf_handle(name)
            .with_context(|| format!("{} CF missing", name))?;

        let mut count = 0;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

impl PoolStore for RocksDbStore {
    fn contains_nullifier(&self, nullifier: &Nullifier) -> Result<bool> {
        let cf = self
            .db
            .cf_handle(CF_NULLIFIERS)
            .context("nullifiers CF missing")?;

        Ok(self.db.get_cf(cf, nullifier.as_bytes())?.is_some())
    }

    fn contains_commitment(&self, commitment: &Commitment) -> Result<bool> {
        Ok(self.commitment_position(commitment)?.is_some())
    }

    fn commitment_position(&self, commitment: &Commitment) -> Result<Option<LeafPosition>> {
        let cf = self
            .db
            .cf_handle(CF_COMMITMENTS)
            .context("commitments CF missing")?;

        match self.db.get_cf(cf, commitment.as_bytes())? {
            Some(bytes) => {
                let position =
                    LeafPosition::from_bytes(&bytes).context("invalid leaf position length")?;
                Ok(Some(position))
            }
            None => Ok(None),
        }
    }

    fn encrypted_note(&self, commitment: &Commitment) -> Result<Option<Vec<u8>>> {
        let cf = self
            .db
            .cf_handle(CF_ENCRYPTED_NOTES)
            .context("encrypted_notes CF missing")?;

        Ok(self.db.get_cf(cf, commitment.as_bytes())?)
    }

    fn load_snapshot(&self) -> Result<Option<PoolSnapshot>> {
        let cf = self
            .db
            .cf_handle(CF_POOL_META)
            .context("pool_meta CF missing")?;

        match self.db.get_cf(cf, SNAPSHOT_KEY)? {
            Some(bytes) => {
                let snapshot = serde_json::from_slice(&bytes).context("corrupt pool snapshot")?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// Single WriteBatch: ledgers and snapshot land together or not at all.
    fn apply(&mut self, diff: &StateDiff) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_nullifiers = self
            .db
            .cf_handle(CF_NULLIFIERS)
            .context("nullifiers CF missing")?;
        let cf_commitments = self
            .db
            .cf_handle(CF_COMMITMENTS)
            .context("commitments CF missing")?;
        let cf_enc_notes = self
            .db
            .cf_handle(CF_ENCRYPTED_NOTES)
            .context("encrypted_notes CF missing")?;
        let cf_meta = self
            .db
            .cf_handle(CF_POOL_META)
            .context("pool_meta CF missing")?;

        for nullifier in &diff.nullifiers {
            batch.put_cf(cf_nullifiers, nullifier.as_bytes(), b"");
        }

        for record in &diff.commitments {
            batch.put_cf(
                cf_commitments,
                record.commitment.as_bytes(),
                record.position.to_bytes(),
            );
        }

        for (commitment, note) in &diff.encrypted_notes {
            batch.put_cf(cf_enc_notes, commitment.as_bytes(), note);
        }

        let snapshot = serde_json::to_vec(&diff.snapshot)?;
        batch.put_cf(cf_meta, SNAPSHOT_KEY, snapshot);

        self.db.write(batch)?;
        Ok(())
    }
}
