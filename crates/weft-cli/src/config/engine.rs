//! Execution engine configuration.

use anyhow::{Context, Result as AnyhowResult};
use clap::Args;
use serde::{Deserialize, Serialize};
use weft_runtime::engine::RunnerConfig;

use crate::TRACING_TARGET_CONFIG;

/// Execution engine configuration.
///
/// # Environment Variables
///
/// - `WEFT_MAX_CONCURRENCY` - Maximum number of nodes running at once (default: unbounded)
/// - `WEFT_ABORT_ON_CANCEL` - Drop running nodes on cancellation (default: false)
/// - `WEFT_DEVICE` - Device for nodes that require a GPU (default: cpu)
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct EngineConfig {
    /// Maximum number of nodes running at once.
    #[arg(long, env = "WEFT_MAX_CONCURRENCY")]
    pub max_concurrency: Option<usize>,

    /// Drop running nodes on cancellation instead of waiting for them.
    #[arg(long, env = "WEFT_ABORT_ON_CANCEL")]
    #[serde(default)]
    pub abort_on_cancel: bool,

    /// Device passed to nodes that require a GPU, e.g. `cuda:0`.
    #[arg(long, env = "WEFT_DEVICE", default_value = "cpu")]
    pub device: String,
}

impl EngineConfig {
    /// Builds the runner configuration, validating every value.
    pub fn runner_config(&self) -> AnyhowResult<RunnerConfig> {
        let mut builder = RunnerConfig::builder()
            .with_abort_on_cancel(self.abort_on_cancel)
            .with_device(self.device.as_str());
        if let Some(max_concurrency) = self.max_concurrency {
            builder = builder.with_max_concurrency(max_concurrency);
        }
        builder.build().context("invalid engine configuration")
    }

    /// Logs the engine configuration.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            max_concurrency = ?self.max_concurrency,
            abort_on_cancel = self.abort_on_cancel,
            device = %self.device,
            "Engine configuration"
        );
    }
}
