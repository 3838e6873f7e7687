use thiserror::Error;

#[derive(Error, Debug)]
pub enum KVError {
    /// Any backend failure that is not a write conflict.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// Another writer committed first and this transaction was rolled back.
    /// Nothing from the losing transaction is visible.
    #[error("transaction conflict: {0}")]
    Conflict(String),
}
