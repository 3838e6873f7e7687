use crate::error::KVError;

/// Decision returned by a transaction body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnOutcome {
    Commit,
    Rollback,
}

/// Reads against one consistent state of the store.
pub trait KVRead {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Sorted (key, value) pairs under a prefix.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;
}

/// Read/write view of the store inside one atomic unit.
///
/// Reads observe the transaction's own earlier writes. Nothing becomes
/// visible to other readers until the enclosing transaction commits.
pub trait KVTxn: KVRead {
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&mut self, key: &str) -> Result<(), KVError>;
}

/// KVStore provides a key-value storage interface.
///
/// Keys follow a namespaced convention: `club:club:{id}`, `club:user:{id}`, etc.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns sorted (key, value) pairs.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    /// Run `body` inside a single all-or-nothing write transaction.
    ///
    /// The writes made through the [`KVTxn`] land only if `body` returns
    /// `Ok(TxnOutcome::Commit)`. `Rollback` or an error discards them.
    /// A backend that detects a conflicting writer returns
    /// [`KVError::Conflict`]; the body is not re-run.
    fn atomic(
        &self,
        body: &mut dyn FnMut(&mut dyn KVTxn) -> Result<TxnOutcome, KVError>,
    ) -> Result<(), KVError>;

    /// Run `body` against a read-only snapshot.
    ///
    /// Every read made through the [`KVRead`] sees the same committed state,
    /// even if writers commit while `body` runs. Does not block writers.
    fn view(
        &self,
        body: &mut dyn FnMut(&dyn KVRead) -> Result<(), KVError>,
    ) -> Result<(), KVError>;
}

/// Run a fallible body atomically, passing its result through.
///
/// `Ok` commits, `Err` rolls back and is returned unchanged. Store failures
/// (including commit failures) are converted with `E::from`.
pub fn run_atomic<T, E, F>(store: &dyn KVStore, mut body: F) -> Result<T, E>
where
    E: From<KVError>,
    F: FnMut(&mut dyn KVTxn) -> Result<T, E>,
{
    let mut result: Option<Result<T, E>> = None;
    store
        .atomic(&mut |txn: &mut dyn KVTxn| {
            let out = body(txn);
            let outcome = if out.is_ok() {
                TxnOutcome::Commit
            } else {
                TxnOutcome::Rollback
            };
            result = Some(out);
            Ok(outcome)
        })
        .map_err(E::from)?;

    match result {
        Some(out) => out,
        None => Err(E::from(KVError::Storage(
            "transaction body did not run".to_string(),
        ))),
    }
}

/// Run a fallible read-only body against one snapshot, passing its result through.
pub fn run_view<T, E, F>(store: &dyn KVStore, mut body: F) -> Result<T, E>
where
    E: From<KVError>,
    F: FnMut(&dyn KVRead) -> Result<T, E>,
{
    let mut result: Option<Result<T, E>> = None;
    store
        .view(&mut |snapshot: &dyn KVRead| {
            result = Some(body(snapshot));
            Ok(())
        })
        .map_err(E::from)?;

    match result {
        Some(out) => out,
        None => Err(E::from(KVError::Storage(
            "snapshot body did not run".to_string(),
        ))),
    }
}
