//! Asset storage capability.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::TRACING_TARGET;
use crate::node::NodeError;

/// Kind of binary asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetKind {
    /// Raster image.
    Image,
    /// Audio clip.
    Audio,
    /// Video clip.
    Video,
    /// Any other binary file.
    File,
}

/// Reference to a stored asset, as carried in node results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    /// Asset kind.
    #[serde(rename = "type")]
    pub kind: AssetKind,
    /// Location of the asset in storage.
    pub uri: String,
    /// MIME type, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl AssetRef {
    /// Creates an image reference.
    pub fn image(uri: impl Into<String>) -> Self {
        Self {
            kind: AssetKind::Image,
            uri: uri.into(),
            content_type: None,
        }
    }

    /// Returns the reference as a JSON value.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!(self)
    }
}

/// Stores and retrieves binary assets.
#[async_trait]
pub trait AssetStorage: Send + Sync {
    /// Stores an asset and returns its reference.
    async fn put(
        &self,
        kind: AssetKind,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<AssetRef, NodeError>;

    /// Loads the content of a stored asset.
    async fn get(&self, asset: &AssetRef) -> Result<Bytes, NodeError>;

    /// Releases storage resources at process teardown.
    async fn close(&self) -> Result<(), NodeError> {
        Ok(())
    }
}

/// Process-local asset storage addressed by `memory://` URIs.
#[derive(Debug, Default)]
pub struct InMemoryAssetStorage {
    assets: RwLock<HashMap<String, Bytes>>,
}

impl InMemoryAssetStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored assets.
    pub async fn len(&self) -> usize {
        self.assets.read().await.len()
    }

    /// Returns whether no assets are stored.
    pub async fn is_empty(&self) -> bool {
        self.assets.read().await.is_empty()
    }
}

#[async_trait]
impl AssetStorage for InMemoryAssetStorage {
    async fn put(
        &self,
        kind: AssetKind,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<AssetRef, NodeError> {
        let uri = format!("memory://{}", Uuid::now_v7());
        tracing::trace!(target: TRACING_TARGET, %uri, %kind, size = data.len(), "Asset stored");
        self.assets.write().await.insert(uri.clone(), data);
        Ok(AssetRef {
            kind,
            uri,
            content_type: content_type.map(str::to_owned),
        })
    }

    async fn get(&self, asset: &AssetRef) -> Result<Bytes, NodeError> {
        self.assets
            .read()
            .await
            .get(&asset.uri)
            .cloned()
            .ok_or_else(|| {
                NodeError::external().with_message(format!("asset '{}' not found", asset.uri))
            })
    }

    async fn close(&self) -> Result<(), NodeError> {
        self.assets.write().await.clear();
        Ok(())
    }
}
