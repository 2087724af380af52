use crate::core::{TXOutput, UTXO};
use crate::error::{Result, SettlementError};
use crate::storage::UTXOPool;
use crate::utils::{deserialize, serialize};
use sled::{Batch, Db, Tree};
use std::path::Path;

const UTXO_TREE: &str = "chainstate";

/// Persists pool snapshots between epochs.
///
/// One snapshot is stored at a time; `save` replaces it as a single sled
/// batch so a crash never leaves half of an epoch's result on disk.
pub struct SnapshotStore {
    db: Db,
}

impl SnapshotStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SnapshotStore> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            SettlementError::Database(format!(
                "Failed to open snapshot store at {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Ok(SnapshotStore { db })
    }

    fn utxo_tree(&self) -> Result<Tree> {
        self.db
            .open_tree(UTXO_TREE)
            .map_err(|e| SettlementError::Database(format!("Failed to open UTXO tree: {e}")))
    }

    pub fn save(&self, pool: &UTXOPool) -> Result<()> {
        let utxo_tree = self.utxo_tree()?;

        let mut batch = Batch::default();
        for item in utxo_tree.iter() {
            let (k, _) = item.map_err(|e| {
                SettlementError::Database(format!("Failed to iterate UTXO tree: {e}"))
            })?;
            batch.remove(k);
        }
        for (utxo, out) in pool.iter() {
            batch.insert(serialize(utxo)?, serialize(out)?);
        }

        utxo_tree
            .apply_batch(batch)
            .map_err(|e| SettlementError::Database(format!("Failed to write snapshot: {e}")))?;
        utxo_tree
            .flush()
            .map_err(|e| SettlementError::Database(format!("Failed to flush snapshot: {e}")))?;
        log::debug!("Saved snapshot with {} outputs", pool.len());
        Ok(())
    }

    pub fn load(&self) -> Result<UTXOPool> {
        let utxo_tree = self.utxo_tree()?;
        let mut pool = UTXOPool::new();

        for item in utxo_tree.iter() {
            let (k, v) = item.map_err(|e| {
                SettlementError::Database(format!("Failed to iterate UTXO tree: {e}"))
            })?;
            let utxo: UTXO = deserialize(k.as_ref()).map_err(|e| {
                SettlementError::Serialization(format!("Failed to deserialize UTXO: {e}"))
            })?;
            let out: TXOutput = deserialize(v.as_ref()).map_err(|e| {
                SettlementError::Serialization(format!("Failed to deserialize TXOutput: {e}"))
            })?;
            pool.insert(utxo, out);
        }
        Ok(pool)
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.utxo_tree()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_pool() -> UTXOPool {
        vec![
            (UTXO::new(b"genesis", 0), TXOutput::new(10, b"alice")),
            (UTXO::new(b"genesis", 1), TXOutput::new(7, b"bob")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let store = SnapshotStore::open(temp_dir.path().join("snapshots")).unwrap();

        assert!(store.load().unwrap().is_empty());

        let pool = sample_pool();
        store.save(&pool).unwrap();
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.load().unwrap(), pool);
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let temp_dir = tempdir().unwrap();
        let store = SnapshotStore::open(temp_dir.path().join("snapshots")).unwrap();
        store.save(&sample_pool()).unwrap();

        let mut next = UTXOPool::new();
        next.insert(UTXO::new(b"tx1", 0), TXOutput::new(4, b"carol"));
        store.save(&next).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.load().unwrap(), next);
    }
}
