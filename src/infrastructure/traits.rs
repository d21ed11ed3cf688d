//! Remote boundary traits for testability
//!
//! These traits abstract the directory and registry services the picker talks to,
//! allowing the engine to be tested with scripted implementations.
//! Transport, authentication, retries and timeouts live behind them.

use async_trait::async_trait;

use crate::domain::{AssetId, FetchError, Location, LocationId, RelocationReceipt};

/// Location directory service.
#[async_trait]
pub trait LocationDirectory: Send + Sync {
    /// Top-level locations, in source order.
    async fn fetch_root_locations(&self) -> Result<Vec<Location>, FetchError>;

    /// Direct children of `id`, in source order. Empty means `id` is a leaf.
    async fn fetch_location_children(&self, id: &LocationId) -> Result<Vec<Location>, FetchError>;
}

/// Asset registry service.
#[async_trait]
pub trait AssetRegistry: Send + Sync {
    /// Record `asset` as moved to `location`.
    async fn relocate_asset(
        &self,
        asset: &AssetId,
        location: &LocationId,
        justification: &str,
    ) -> Result<RelocationReceipt, FetchError>;
}
