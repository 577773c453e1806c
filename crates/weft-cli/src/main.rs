#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod shutdown;
mod stream;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use weft_runtime::capability::Capabilities;
use weft_runtime::engine::{ProcessingContext, WorkflowRunner};
use weft_runtime::job::{JobId, JobStatus};

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "weft_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "weft_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "weft_cli::config";

#[tokio::main]
async fn main() {
    let status = match run().await {
        Ok(status) => status,
        Err(error) => {
            if tracing::enabled!(tracing::Level::ERROR) {
                tracing::error!(
                    target: TRACING_TARGET_SHUTDOWN,
                    error = %error,
                    "Workflow could not be run"
                );
            } else {
                eprintln!("Error: {error:#}");
            }
            process::exit(1);
        }
    };

    tracing::info!(
        target: TRACING_TARGET_SHUTDOWN,
        status = %status,
        "Job finished"
    );
    process::exit(if status.is_completed() { 0 } else { 1 });
}

/// Runs the configured workflow and returns the job's terminal status.
async fn run() -> anyhow::Result<JobStatus> {
    let cli = Cli::init();
    Cli::init_tracing();
    cli.log();

    let config = cli.engine.runner_config()?;
    let request = cli.workflow.load()?;
    let runner = WorkflowRunner::new(Arc::new(weft_nodes::builtin_registry())).with_config(config);
    let ctx = ProcessingContext::new(JobId::new()).with_capabilities(Capabilities::in_memory());

    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        job_id = %ctx.job_id(),
        nodes = request.graph.nodes.len(),
        edges = request.graph.edges.len(),
        "Starting job"
    );

    let signal = tokio::spawn(shutdown::cancel_on_signal(ctx.cancellation().clone()));

    let mut stdout = tokio::io::stdout();
    let outcome = stream::run_streaming(&runner, request, &ctx, &mut stdout).await;
    signal.abort();

    if let Err(error) = ctx.capabilities().shutdown().await {
        tracing::warn!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "Failed to release capabilities"
        );
    }

    let outcome = outcome.context("workflow rejected")?;
    Ok(outcome.status)
}
