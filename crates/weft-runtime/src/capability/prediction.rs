//! Remote model prediction capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::node::NodeError;

/// A request to run a remote model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Model identifier understood by the provider.
    pub model: String,
    /// Model parameters.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl PredictionRequest {
    /// Creates a request without parameters.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            params: Map::new(),
        }
    }

    /// Adds a model parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// Callback receiving `(progress, total)` updates while a prediction runs.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// Runs predictions against an external model provider.
#[async_trait]
pub trait PredictionClient: Send + Sync {
    /// Runs a prediction and returns the provider's output.
    async fn predict(
        &self,
        request: PredictionRequest,
        progress: ProgressFn<'_>,
    ) -> Result<Value, NodeError>;
}
