//! External collaborators reachable from node bodies.
//!
//! Capabilities are injected per run through [`Capabilities`]. Nodes reach
//! them through the processing context, which fails with a
//! `MissingCapability` error when a capability was not configured.

use std::fmt;
use std::sync::Arc;

mod asset;
mod cache;
mod prediction;

pub use asset::{AssetKind, AssetRef, AssetStorage, InMemoryAssetStorage};
pub use cache::{CacheKey, InMemoryNodeCache, NodeCache};
pub use prediction::{PredictionClient, PredictionRequest, ProgressFn};

use crate::node::NodeError;

/// Tracing target for capability operations.
const TRACING_TARGET: &str = "weft_runtime::capability";

/// Set of external collaborators available to a run.
#[derive(Clone, Default)]
pub struct Capabilities {
    assets: Option<Arc<dyn AssetStorage>>,
    predictions: Option<Arc<dyn PredictionClient>>,
    cache: Option<Arc<dyn NodeCache>>,
}

impl Capabilities {
    /// Creates an empty capability set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a capability set with in-memory assets and cache.
    pub fn in_memory() -> Self {
        Self::new()
            .with_assets(InMemoryAssetStorage::new())
            .with_cache(InMemoryNodeCache::new())
    }

    /// Sets the asset storage.
    pub fn with_assets(self, assets: impl AssetStorage + 'static) -> Self {
        self.with_shared_assets(Arc::new(assets))
    }

    /// Sets a shared asset storage.
    pub fn with_shared_assets(mut self, assets: Arc<dyn AssetStorage>) -> Self {
        self.assets = Some(assets);
        self
    }

    /// Sets the prediction client.
    pub fn with_predictions(self, predictions: impl PredictionClient + 'static) -> Self {
        self.with_shared_predictions(Arc::new(predictions))
    }

    /// Sets a shared prediction client.
    pub fn with_shared_predictions(mut self, predictions: Arc<dyn PredictionClient>) -> Self {
        self.predictions = Some(predictions);
        self
    }

    /// Sets the node cache.
    pub fn with_cache(self, cache: impl NodeCache + 'static) -> Self {
        self.with_shared_cache(Arc::new(cache))
    }

    /// Sets a shared node cache.
    pub fn with_shared_cache(mut self, cache: Arc<dyn NodeCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Returns the asset storage, if configured.
    pub fn assets(&self) -> Option<&dyn AssetStorage> {
        self.assets.as_deref()
    }

    /// Returns the prediction client, if configured.
    pub fn predictions(&self) -> Option<&dyn PredictionClient> {
        self.predictions.as_deref()
    }

    /// Returns the node cache, if configured.
    pub fn cache(&self) -> Option<&dyn NodeCache> {
        self.cache.as_deref()
    }

    /// Releases collaborator resources at process teardown.
    pub async fn shutdown(&self) -> Result<(), NodeError> {
        if let Some(assets) = &self.assets {
            assets.close().await?;
        }
        tracing::debug!(target: TRACING_TARGET, "Capabilities shut down");
        Ok(())
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("assets", &self.assets.is_some())
            .field("predictions", &self.predictions.is_some())
            .field("cache", &self.cache.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory() {
        let capabilities = Capabilities::in_memory();
        assert!(capabilities.assets().is_some());
        assert!(capabilities.cache().is_some());
        assert!(capabilities.predictions().is_none());
        assert_eq!(
            format!("{capabilities:?}"),
            "Capabilities { assets: true, predictions: false, cache: true }"
        );
    }

    #[tokio::test]
    async fn test_shutdown_without_capabilities() {
        assert!(Capabilities::new().shutdown().await.is_ok());
    }
}
