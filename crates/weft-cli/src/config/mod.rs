//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── workflow: WorkflowConfig  # Graph file, job parameters
//! └── engine: EngineConfig      # Concurrency, cancellation, device
//! ```
//!
//! All configuration can be provided via CLI arguments or `WEFT_*`
//! environment variables. Use `--help` to see all available options.

mod engine;
mod workflow;

use std::process;

use clap::Parser;
pub use engine::EngineConfig;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
pub use workflow::WorkflowConfig;

use crate::TRACING_TARGET_STARTUP;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "weft")]
#[command(about = "Run a Weft workflow and stream its progress as NDJSON")]
#[command(version)]
pub struct Cli {
    /// Workflow source and job parameters.
    #[clap(flatten)]
    pub workflow: WorkflowConfig,

    /// Execution engine configuration.
    #[clap(flatten)]
    pub engine: EngineConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// Logs are written to stderr; stdout carries the message stream.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Logs configuration and build information.
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        self.workflow.log();
        self.engine.log();
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
