pub mod error;
pub mod redb;
pub mod traits;

pub use error::KVError;
pub use redb::RedbStore;
pub use traits::{KVRead, KVStore, KVTxn, TxnOutcome, run_atomic, run_view};
