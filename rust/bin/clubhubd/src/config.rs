//! Server configuration, read from a TOML file.
//!
//! ```toml
//! [storage]
//! data_dir = "/var/lib/clubhub"
//! # db_path = "/mnt/fast/clubhub.redb"   # defaults to {data_dir}/data.redb
//!
//! [reconcile]
//! interval_secs = 300
//!
//! [pagination]
//! default_page_size = 50
//! max_page_size = 200
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `data.redb`.
    pub data_dir: String,
    /// Explicit database file, overriding `{data_dir}/data.redb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Seconds between follower-count reconciliation passes. 0 disables.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
        }
    }
}

fn default_interval() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "max_page_size")]
    pub max_page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: max_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    50
}

fn max_page_size() -> usize {
    200
}

/// Top-level `clubhubd` configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl ServerConfig {
    /// Load and parse a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Refuse to start on a config that cannot work.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            anyhow::bail!("storage.data_dir is empty in configuration.");
        }
        if self.storage.db_path.as_deref().is_some_and(|p| p.trim().is_empty()) {
            anyhow::bail!("storage.db_path is set but empty in configuration.");
        }
        if self.pagination.default_page_size == 0 {
            anyhow::bail!("pagination.default_page_size must be at least 1.");
        }
        if self.pagination.max_page_size < self.pagination.default_page_size {
            anyhow::bail!(
                "pagination.max_page_size ({}) is smaller than default_page_size ({}).",
                self.pagination.max_page_size,
                self.pagination.default_page_size
            );
        }
        Ok(())
    }
}
