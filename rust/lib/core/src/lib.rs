pub mod config;
pub mod error;
pub mod identity;
pub mod module;
pub mod types;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use identity::{Identity, USER_ID_HEADER};
pub use module::Module;
pub use types::{ListParams, ListResult, merge_patch, new_id, now_rfc3339};
