//! Edge declaration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::NodeId;

/// A binding from an output slot of one node to an input property of another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Builder)]
#[builder(
    name = "EdgeDefBuilder",
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct EdgeDef {
    /// Edge identifier.
    #[serde(default)]
    #[builder(default)]
    pub id: String,
    /// Source node ID.
    pub source: NodeId,
    /// Output slot on the source node.
    #[serde(rename = "sourceHandle")]
    pub source_handle: String,
    /// Target node ID.
    pub target: NodeId,
    /// Input property on the target node.
    #[serde(rename = "targetHandle")]
    pub target_handle: String,
}

impl EdgeDefBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.source_handle.as_deref().is_some_and(str::is_empty) {
            return Err("source_handle must not be empty".into());
        }
        if self.target_handle.as_deref().is_some_and(str::is_empty) {
            return Err("target_handle must not be empty".into());
        }
        Ok(())
    }
}

impl EdgeDef {
    /// Creates an edge with an identifier derived from its endpoints.
    pub fn new(
        source: impl Into<NodeId>,
        source_handle: impl Into<String>,
        target: impl Into<NodeId>,
        target_handle: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let source_handle = source_handle.into();
        let target = target.into();
        let target_handle = target_handle.into();
        Self {
            id: format!("{source}:{source_handle}->{target}:{target_handle}"),
            source,
            source_handle,
            target,
            target_handle,
        }
    }

    /// Returns a builder for creating an edge.
    pub fn builder() -> EdgeDefBuilder {
        EdgeDefBuilder::default()
    }
}
