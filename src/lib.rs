//! albumstore library -- album catalog and object management over an S3
//! bucket.
//!
//! The catalog is derived from the bucket layout: every top-level prefix
//! holding audio becomes an album.  Management actions mint signed URLs and
//! perform validated single-object mutations.

use std::sync::Arc;

pub mod catalog;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod manage;
pub mod metrics;
pub mod server;
pub mod storage;

use crate::catalog::{AlbumAggregator, CatalogSettings};
use crate::config::Config;
use crate::errors::ApiError;
use crate::manage::ObjectManager;
use crate::storage::backend::StorageGateway;

/// Shared application state passed to all handlers via `axum::extract::State`.
///
/// Without a configured bucket there is no gateway, and every catalog or
/// management request fails with [`ApiError::MissingBucket`].
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    catalog: Option<AlbumAggregator>,
    manager: Option<ObjectManager>,
}

impl AppState {
    /// Wire the aggregator and the manager to `gateway`, if there is one.
    pub fn new(config: Config, gateway: Option<Arc<dyn StorageGateway>>) -> Self {
        let catalog = gateway
            .clone()
            .map(|gw| AlbumAggregator::new(gw, CatalogSettings::from_config(&config)));
        let manager = gateway.map(|gw| ObjectManager::from_config(gw, &config));
        Self {
            config,
            catalog,
            manager,
        }
    }

    pub fn catalog(&self) -> Result<&AlbumAggregator, ApiError> {
        self.catalog.as_ref().ok_or(ApiError::MissingBucket)
    }

    pub fn manager(&self) -> Result<&ObjectManager, ApiError> {
        self.manager.as_ref().ok_or(ApiError::MissingBucket)
    }
}
