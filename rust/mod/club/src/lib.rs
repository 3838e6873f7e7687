//! Club module: directory, follows, events and notifications.
//!
//! # Resources
//!
//! - **User**: student or club head, owns the set of clubs they follow
//! - **Club**: directory entry with a cached `followers_count`
//! - **Event**: club activity; free events confirm on registration, paid
//!   ones wait for the club head
//! - **Notification**: message fanned out to a club's followers
//!
//! A user's follow set and the club's follower counter change together in
//! one KV transaction. The [`worker`] periodically recomputes counters from
//! the follow sets.
//!
//! # Usage
//!
//! ```ignore
//! use club::{ClubModule, service::ClubConfig};
//!
//! let module = ClubModule::new(kv, ClubConfig::default());
//! let router = module.routes(); // Mount under /club
//! ```

pub mod model;
pub mod service;
pub mod api;
pub mod worker;

use std::sync::Arc;

use axum::Router;

use clubhub_core::Module;

use crate::service::{ClubConfig, ClubService};

/// Club module implementing the Module trait.
pub struct ClubModule {
    service: Arc<ClubService>,
}

impl ClubModule {
    pub fn new(kv: Arc<dyn clubhub_kv::KVStore>, config: ClubConfig) -> Self {
        Self {
            service: ClubService::new(kv, config),
        }
    }

    /// Get a reference to the underlying ClubService.
    pub fn service(&self) -> &Arc<ClubService> {
        &self.service
    }
}

impl Module for ClubModule {
    fn name(&self) -> &str {
        "club"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
