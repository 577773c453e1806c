//! Node output cache capability.

use std::collections::HashMap;

use async_trait::async_trait;
use derive_more::{Debug, Display};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::node::{NodeInputs, NodeOutputs};

/// Cache key derived from a node type and its resolved inputs.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Display)]
#[debug("{_0}")]
#[display("{_0}")]
pub struct CacheKey(String);

impl CacheKey {
    /// Computes the key as the SHA-256 of the type tag and the canonical inputs.
    pub fn new(node_type: &str, inputs: &NodeInputs) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(node_type.as_bytes());
        hasher.update([0]);
        hasher.update(serde_json::Value::Object(inputs.as_map().clone()).to_string());
        Self(hex::encode(hasher.finalize()))
    }

    /// Returns the key as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Stores node outputs for reuse across runs.
#[async_trait]
pub trait NodeCache: Send + Sync {
    /// Returns cached outputs for a key.
    async fn get(&self, key: &CacheKey) -> Option<NodeOutputs>;

    /// Stores outputs under a key.
    async fn put(&self, key: CacheKey, outputs: NodeOutputs);
}

/// Process-local node cache.
#[derive(Debug, Default)]
pub struct InMemoryNodeCache {
    entries: RwLock<HashMap<CacheKey, NodeOutputs>>,
}

impl InMemoryNodeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl NodeCache for InMemoryNodeCache {
    async fn get(&self, key: &CacheKey) -> Option<NodeOutputs> {
        self.entries.read().await.get(key).cloned()
    }

    async fn put(&self, key: CacheKey, outputs: NodeOutputs) {
        self.entries.write().await.insert(key, outputs);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn inputs(value: serde_json::Value) -> NodeInputs {
        NodeInputs::from(value.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn test_key_is_stable_and_type_scoped() {
        let a = CacheKey::new("math.Add", &inputs(json!({ "a": 1, "b": 2 })));
        let b = CacheKey::new("math.Add", &inputs(json!({ "b": 2, "a": 1 })));
        let c = CacheKey::new("math.Multiply", &inputs(json!({ "a": 1, "b": 2 })));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 64);
    }

    #[tokio::test]
    async fn test_get_and_put() {
        let cache = InMemoryNodeCache::new();
        let key = CacheKey::new("math.Add", &inputs(json!({ "a": 1 })));
        assert!(cache.get(&key).await.is_none());

        cache.put(key.clone(), NodeOutputs::output(1)).await;
        assert_eq!(cache.get(&key).await, Some(NodeOutputs::output(1)));
        assert_eq!(cache.len().await, 1);
    }
}
