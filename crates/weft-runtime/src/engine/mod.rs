//! Workflow execution engine.
//!
//! This module provides the runtime for executing workflows:
//! - [`WorkflowRunner`]: Validates a request and drives one job to a terminal status
//! - [`ProcessingContext`]: Results table, message channel and capabilities of a run
//! - [`RunnerConfig`]: Concurrency, cancellation and device options

mod config;
mod context;
mod executor;
mod runner;
#[cfg(test)]
pub(crate) mod testing;

pub use config::{RunnerConfig, RunnerConfigBuilder};
pub use context::ProcessingContext;
pub use runner::{RunOutcome, WorkflowRunner};

/// Tracing target for engine operations.
const TRACING_TARGET: &str = "weft_runtime::engine";
