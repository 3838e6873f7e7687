use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadOnlyTable, ReadableTable, Table, TableDefinition};
use tracing::debug;

use crate::error::KVError;
use crate::traits::{KVRead, KVStore, KVTxn, TxnOutcome};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

fn storage<E: std::fmt::Display>(e: E) -> KVError {
    KVError::Storage(e.to_string())
}

/// RedbStore is a KVStore implementation backed by redb, a pure-Rust embedded
/// key-value database.
///
/// redb admits one write transaction at a time; `begin_write` blocks until
/// the current writer commits or aborts. Every [`KVStore::atomic`] call is
/// therefore serializable with respect to all other writes.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        let db = Database::create(path).map_err(storage)?;

        // Ensure the table exists by doing a write transaction.
        let write_txn = db.begin_write().map_err(storage)?;
        {
            let _table = write_txn.open_table(TABLE).map_err(storage)?;
        }
        write_txn.commit().map_err(storage)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn write<F>(&self, f: F) -> Result<(), KVError>
    where
        F: FnOnce(&mut Table<'_, &'static str, &'static [u8]>) -> Result<(), KVError>,
    {
        let write_txn = self.db.begin_write().map_err(storage)?;
        {
            let mut table = write_txn.open_table(TABLE).map_err(storage)?;
            f(&mut table)?;
        }
        write_txn.commit().map_err(storage)
    }
}

fn scan_table<T>(table: &T, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let mut results = Vec::new();
    for entry in table.range(prefix..).map_err(storage)? {
        let (key, value) = entry.map_err(storage)?;
        let key = key.value().to_string();
        if !key.starts_with(prefix) {
            break;
        }
        results.push((key, value.value().to_vec()));
    }
    Ok(results)
}

/// A redb write transaction's table, exposed as [`KVTxn`].
struct RedbTxn<'t> {
    table: Table<'t, &'static str, &'static [u8]>,
}

impl KVRead for RedbTxn<'_> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let value = self.table.get(key).map_err(storage)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        scan_table(&self.table, prefix)
    }
}

impl KVTxn for RedbTxn<'_> {
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.table.insert(key, value).map_err(storage)?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), KVError> {
        self.table.remove(key).map_err(storage)?;
        Ok(())
    }
}

/// A redb read transaction's table, exposed as [`KVRead`].
struct RedbSnapshot {
    table: ReadOnlyTable<&'static str, &'static [u8]>,
}

impl KVRead for RedbSnapshot {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let value = self.table.get(key).map_err(storage)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        scan_table(&self.table, prefix)
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(TABLE).map_err(storage)?;
        let value = table.get(key).map_err(storage)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.write(|table| {
            table.insert(key, value).map_err(storage)?;
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        self.write(|table| {
            table.remove(key).map_err(storage)?;
            Ok(())
        })
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(TABLE).map_err(storage)?;
        scan_table(&table, prefix)
    }

    fn atomic(
        &self,
        body: &mut dyn FnMut(&mut dyn KVTxn) -> Result<TxnOutcome, KVError>,
    ) -> Result<(), KVError> {
        let write_txn = self.db.begin_write().map_err(storage)?;
        let decision = {
            let table = write_txn.open_table(TABLE).map_err(storage)?;
            let mut txn = RedbTxn { table };
            body(&mut txn)
        };

        match decision {
            Ok(TxnOutcome::Commit) => write_txn.commit().map_err(storage),
            Ok(TxnOutcome::Rollback) => {
                debug!("kv transaction rolled back by caller");
                write_txn.abort().map_err(storage)
            }
            Err(e) => {
                debug!("kv transaction failed, rolling back: {e}");
                write_txn.abort().map_err(storage)?;
                Err(e)
            }
        }
    }

    fn view(
        &self,
        body: &mut dyn FnMut(&dyn KVRead) -> Result<(), KVError>,
    ) -> Result<(), KVError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(TABLE).map_err(storage)?;
        body(&RedbSnapshot { table })
    }
}
