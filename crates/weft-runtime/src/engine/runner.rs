//! Workflow runner.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::watch;

use super::executor::{Executor, ScopeFrame};
use super::{ProcessingContext, RunnerConfig, TRACING_TARGET};
use crate::error::{Error, Result};
use crate::graph::{Scope, Workflow, WorkflowGraph, binding_name};
use crate::job::{Job, JobId, JobStatus, JobStore, RunRequest};
use crate::message::Message;
use crate::node::{NodeKind, NodeRegistry};

/// Final state of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    /// Job ID.
    pub job_id: JobId,
    /// Terminal status.
    pub status: JobStatus,
    /// Values of the root output nodes of a completed job, keyed by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Map<String, Value>>,
    /// Failure message of a failed job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Executes one job.
///
/// A runner moves `Pending → Running → {Completed, Failed, Cancelled}` once;
/// any further [`run`](Self::run) is rejected.
pub struct WorkflowRunner {
    registry: Arc<NodeRegistry>,
    config: RunnerConfig,
    status: watch::Sender<JobStatus>,
    store: Option<Arc<dyn JobStore>>,
}

impl WorkflowRunner {
    /// Creates a pending runner with the default configuration.
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self {
            registry,
            config: RunnerConfig::default(),
            status: watch::Sender::new(JobStatus::Pending),
            store: None,
        }
    }

    /// Sets the runner configuration.
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Attaches a store that receives the job's status transitions.
    pub fn with_store(mut self, store: Arc<dyn JobStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Returns the runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Returns the current status.
    pub fn status(&self) -> JobStatus {
        *self.status.borrow()
    }

    /// Returns a receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<JobStatus> {
        self.status.subscribe()
    }

    /// Validates and runs a workflow to completion.
    ///
    /// Structural errors are returned before anything runs: the runner stays
    /// pending and no message is posted. Once running, node failures and
    /// cancellation are reported through the returned outcome and the final
    /// `job_update` message, which is always the last message of the run.
    pub async fn run(&self, request: RunRequest, ctx: &ProcessingContext) -> Result<RunOutcome> {
        let current = self.status();
        if !current.is_pending() {
            return Err(Error::AlreadyStarted(current));
        }

        let mut workflow = request.graph.clone();
        bind_params(&mut workflow, &request.params, &self.registry);
        let graph = WorkflowGraph::build(&workflow, &self.registry)?;

        let started = self.status.send_if_modified(|status| {
            let pending = status.is_pending();
            if pending {
                *status = JobStatus::Running;
            }
            pending
        });
        if !started {
            return Err(Error::AlreadyStarted(self.status()));
        }

        let job_id = ctx.job_id();
        let mut job = Job::new(job_id, &request);
        job.graph = workflow;
        job.transition(JobStatus::Running, None);
        if let Some(store) = &self.store
            && let Err(error) = store.create(&job).await
        {
            tracing::warn!(target: TRACING_TARGET, %job_id, %error, "Failed to persist job");
        }

        tracing::info!(
            target: TRACING_TARGET,
            %job_id,
            user_id = %request.user_id,
            workflow_id = %request.workflow_id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Workflow run started"
        );
        ctx.post_message(Message::job_update(job_id, JobStatus::Running));

        let started_at = Instant::now();
        let executor = Executor::new(&graph, &self.registry, &self.config);
        let outcome = executor
            .process_scope(ctx, &Scope::Root, &ScopeFrame::default())
            .await;

        let (status, error) = match outcome {
            Ok(()) => (JobStatus::Completed, None),
            Err(error) if error.is_cancelled() => (JobStatus::Cancelled, None),
            Err(error) => (JobStatus::Failed, Some(error.to_string())),
        };
        let result = status
            .is_completed()
            .then(|| collect_result(&graph, ctx));

        job.transition(status, error.clone());
        if let Some(store) = &self.store
            && let Err(error) = store.update(&job).await
        {
            tracing::warn!(target: TRACING_TARGET, %job_id, %error, "Failed to persist job");
        }
        self.status.send_replace(status);

        tracing::info!(
            target: TRACING_TARGET,
            %job_id,
            %status,
            elapsed = ?started_at.elapsed(),
            error = error.as_deref(),
            "Workflow run finished"
        );
        ctx.post_message(Message::JobUpdate {
            job_id,
            status,
            result: result.clone(),
            error: error.clone(),
        });

        Ok(RunOutcome {
            job_id,
            status,
            result,
            error,
        })
    }
}

/// Replaces the `value` of every input node whose `name` matches a parameter.
fn bind_params(workflow: &mut Workflow, params: &Map<String, Value>, registry: &NodeRegistry) {
    for (name, value) in params {
        let mut bound = false;
        for node in &mut workflow.nodes {
            let is_input = registry
                .schema(&node.node_type)
                .is_some_and(|schema| schema.kind == NodeKind::Input);
            if is_input && node.str_property("name") == Some(name.as_str()) {
                node.data.insert("value".to_owned(), value.clone());
                bound = true;
            }
        }
        if !bound {
            tracing::warn!(
                target: TRACING_TARGET,
                param = %name,
                "Parameter matches no input node"
            );
        }
    }
}

/// Collects the `output` slot of every root output node under its `name`.
fn collect_result(graph: &WorkflowGraph, ctx: &ProcessingContext) -> Map<String, Value> {
    graph
        .root_nodes()
        .into_iter()
        .filter_map(|node| {
            let schema = graph.schema(&node.id)?;
            (schema.kind == NodeKind::Output).then(|| {
                let value = ctx.get_result(&node.id, "output").unwrap_or(Value::Null);
                (binding_name(node, schema), value)
            })
        })
        .collect()
}
