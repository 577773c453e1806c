//! Layered scope execution.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, Semaphore};

use super::{ProcessingContext, RunnerConfig, TRACING_TARGET};
use crate::capability::CacheKey;
use crate::error::{ContextError, Error, Result};
use crate::graph::{NodeDef, NodeId, Scope, WorkflowGraph, binding_name};
use crate::message::Message;
use crate::node::{
    Node, NodeContext, NodeError, NodeInputs, NodeKind, NodeOutputs, NodeRegistry, NodeSchema,
};

/// Values injected into the `GroupInput` nodes of one scope execution.
#[derive(Debug, Default)]
pub(super) struct ScopeFrame {
    bindings: HashMap<NodeId, Value>,
}

impl ScopeFrame {
    fn binding(&self, node_id: &NodeId) -> Value {
        self.bindings.get(node_id).cloned().unwrap_or(Value::Null)
    }
}

/// Executes the scopes of one validated graph.
///
/// Only leaf nodes take a concurrency permit, so loops and groups waiting
/// on their bodies never starve them.
pub(super) struct Executor<'a> {
    graph: &'a WorkflowGraph,
    registry: &'a NodeRegistry,
    config: &'a RunnerConfig,
    permits: Option<Semaphore>,
    gpu: Mutex<()>,
}

impl<'a> Executor<'a> {
    pub(super) fn new(
        graph: &'a WorkflowGraph,
        registry: &'a NodeRegistry,
        config: &'a RunnerConfig,
    ) -> Self {
        Self {
            graph,
            registry,
            config,
            permits: config
                .max_concurrency
                .map(|n| Semaphore::new(n.min(Semaphore::MAX_PERMITS))),
            gpu: Mutex::new(()),
        }
    }

    /// Runs a scope layer by layer.
    ///
    /// Every node of a layer is dispatched before the layer is awaited as a
    /// whole; the first failure stops scheduling once in-flight siblings have
    /// finished.
    pub(super) fn process_scope<'s>(
        &'s self,
        ctx: &'s ProcessingContext,
        scope: &'s Scope,
        frame: &'s ScopeFrame,
    ) -> BoxFuture<'s, Result<()>> {
        async move {
            let layers = self.graph.topological_layers(scope);
            for (layer, node_ids) in layers.iter().enumerate() {
                if ctx.is_cancelled() {
                    tracing::debug!(target: TRACING_TARGET, %scope, layer, "Scope cancelled");
                    return Err(Error::Cancelled);
                }

                tracing::trace!(
                    target: TRACING_TARGET,
                    %scope,
                    layer,
                    nodes = node_ids.len(),
                    "Dispatching layer"
                );

                let results = join_all(
                    node_ids
                        .iter()
                        .map(|node_id| self.dispatch(ctx, node_id, frame)),
                )
                .await;

                if let Some(error) = results.into_iter().find_map(Result::err) {
                    return Err(error);
                }
            }
            Ok(())
        }
        .boxed()
    }

    /// Runs one node and records its outputs.
    async fn dispatch(
        &self,
        ctx: &ProcessingContext,
        node_id: &NodeId,
        frame: &ScopeFrame,
    ) -> Result<()> {
        let (node, schema) = self
            .graph
            .node(node_id)
            .zip(self.graph.schema(node_id))
            .ok_or_else(|| Error::Internal(format!("node '{node_id}' is not in the graph")))?;

        let inputs = self.resolve_inputs(ctx, node, schema)?;
        ctx.post_message(Message::node_starting(node_id.clone(), &node.node_type));

        let outcome = match schema.kind {
            NodeKind::Loop => self.run_loop(ctx, node, &inputs).await.map(|o| (o, false)),
            NodeKind::Group => self.run_group(ctx, node, &inputs).await.map(|o| (o, false)),
            NodeKind::GroupInput => Ok((NodeOutputs::output(frame.binding(node_id)), false)),
            _ => self.run_leaf(ctx, node, inputs).await,
        };

        match outcome {
            Ok((outputs, cached)) => {
                let mut result = Map::new();
                for slot in &schema.outputs {
                    let value = outputs.get(&slot.name).cloned().unwrap_or(Value::Null);
                    ctx.set_result(node_id.clone(), slot.name.clone(), value.clone())?;
                    result.insert(slot.name.clone(), value);
                }

                tracing::debug!(target: TRACING_TARGET, %node_id, cached, "Node completed");
                ctx.post_message(Message::node_completed(
                    node_id.clone(),
                    &node.node_type,
                    result,
                    cached,
                ));
                Ok(())
            }
            Err(error) => {
                let message = match &error {
                    Error::NodeFailed { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                tracing::warn!(target: TRACING_TARGET, %node_id, error = %message, "Node failed");
                ctx.post_message(Message::node_failed(node_id.clone(), &node.node_type, message));
                Err(error)
            }
        }
    }

    /// Resolves inputs from schema defaults, literals and upstream results.
    fn resolve_inputs(
        &self,
        ctx: &ProcessingContext,
        node: &NodeDef,
        schema: &NodeSchema,
    ) -> Result<NodeInputs, ContextError> {
        let mut values = schema.defaults();
        values.extend(node.data.clone());

        for edge in self.graph.incoming_edges(&node.id) {
            let value = ctx
                .get_result(&edge.source, &edge.source_handle)
                .ok_or_else(|| ContextError::MissingResult {
                    node_id: edge.source.clone(),
                    slot: edge.source_handle.clone(),
                })?;
            values.insert(edge.target_handle.clone(), value);
        }

        Ok(NodeInputs::from(values))
    }

    /// Runs a leaf node through its lifecycle, serving cacheable nodes from
    /// the cache when possible.
    async fn run_leaf(
        &self,
        ctx: &ProcessingContext,
        node: &NodeDef,
        inputs: NodeInputs,
    ) -> Result<(NodeOutputs, bool)> {
        let mut instance = self.registry.create(&node.node_type).ok_or_else(|| {
            Error::Internal(format!("node type '{}' has no factory", node.node_type))
        })?;
        let requires_gpu = instance.requires_gpu();

        let cache = instance
            .is_cacheable()
            .then(|| ctx.cache().ok())
            .flatten()
            .map(|cache| (cache, CacheKey::new(&node.node_type, &inputs)));
        if let Some((cache, key)) = &cache
            && let Some(outputs) = cache.get(key).await
        {
            tracing::debug!(target: TRACING_TARGET, node_id = %node.id, %key, "Cache hit");
            return Ok((outputs, true));
        }

        let _permit = match &self.permits {
            Some(permits) => Some(
                permits
                    .acquire()
                    .await
                    .map_err(|e| Error::Internal(format!("semaphore closed: {e}")))?,
            ),
            None => None,
        };
        let _gpu = if requires_gpu {
            Some(self.gpu.lock().await)
        } else {
            None
        };

        let node_ctx = NodeContext::new(&node.id, ctx);
        let lifecycle =
            AssertUnwindSafe(self.lifecycle(instance.as_mut(), &node_ctx, inputs, requires_gpu))
                .catch_unwind()
                .map(|caught| caught.unwrap_or_else(|payload| Err(panic_error(payload))));
        let outcome = if self.config.abort_on_cancel {
            tokio::select! {
                biased;
                _ = ctx.cancellation().cancelled() => {
                    tracing::debug!(target: TRACING_TARGET, node_id = %node.id, "Node aborted");
                    return Err(Error::Cancelled);
                }
                outcome = lifecycle => outcome,
            }
        } else {
            lifecycle.await
        };

        let outputs = outcome.map_err(|source| {
            if source.is_cancelled() && ctx.is_cancelled() {
                Error::Cancelled
            } else {
                Error::NodeFailed {
                    node_id: node.id.clone(),
                    source,
                }
            }
        })?;

        if let Some((cache, key)) = cache {
            cache.put(key, outputs.clone()).await;
        }
        Ok((outputs, false))
    }

    async fn lifecycle(
        &self,
        node: &mut dyn Node,
        ctx: &NodeContext<'_>,
        inputs: NodeInputs,
        requires_gpu: bool,
    ) -> Result<NodeOutputs, NodeError> {
        node.initialize(ctx).await?;
        if requires_gpu {
            node.move_to_device(&self.config.device).await?;
        }
        node.pre_process(ctx, &inputs).await?;
        node.process(ctx, inputs).await
    }

    /// Runs a loop body once per element of the `input` list.
    ///
    /// Iterations run concurrently, each in its own child context; collected
    /// outputs keep input order.
    async fn run_loop(
        &self,
        ctx: &ProcessingContext,
        node: &NodeDef,
        inputs: &NodeInputs,
    ) -> Result<NodeOutputs> {
        let items = match inputs.get("input") {
            None => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(_) => {
                return Err(Error::NodeFailed {
                    node_id: node.id.clone(),
                    source: NodeError::invalid_input().with_message("loop input is not a list"),
                });
            }
        };

        let scope = Scope::Node(node.id.clone());
        let entries = self.group_inputs(&node.id);
        let exits = self.group_outputs(&node.id);
        tracing::debug!(
            target: TRACING_TARGET,
            node_id = %node.id,
            iterations = items.len(),
            "Running loop"
        );

        let (scope, entries, exits) = (&scope, &entries, &exits);
        let iterations = items.into_iter().map(|item| {
            let frame = ScopeFrame {
                bindings: entries.iter().map(|(id, _)| (id.clone(), item.clone())).collect(),
            };
            async move {
                let child = ctx.child();
                self.process_scope(&child, scope, &frame).await?;
                Ok::<_, Error>(collect_iteration(&child, exits))
            }
        });

        let mut collected = Vec::new();
        for (index, result) in join_all(iterations).await.into_iter().enumerate() {
            match result {
                Ok(value) => collected.push(value),
                Err(error) => {
                    return Err(subgraph_failure(&node.id, format!("iteration {index}"), error));
                }
            }
        }

        Ok(NodeOutputs::output(Value::Array(collected)))
    }

    /// Runs a group body once in the enclosing context.
    async fn run_group(
        &self,
        ctx: &ProcessingContext,
        node: &NodeDef,
        inputs: &NodeInputs,
    ) -> Result<NodeOutputs> {
        let frame = ScopeFrame {
            bindings: self
                .group_inputs(&node.id)
                .into_iter()
                .map(|(id, name)| {
                    let value = inputs.get(&name).cloned().unwrap_or(Value::Null);
                    (id, value)
                })
                .collect(),
        };

        let scope = Scope::Node(node.id.clone());
        self.process_scope(ctx, &scope, &frame)
            .await
            .map_err(|error| subgraph_failure(&node.id, "body".to_owned(), error))?;

        let mut outputs = NodeOutputs::new();
        for (id, name) in self.group_outputs(&node.id) {
            outputs.insert(name, ctx.get_result(&id, "output").unwrap_or(Value::Null));
        }
        Ok(outputs)
    }

    fn group_inputs(&self, scope_id: &NodeId) -> Vec<(NodeId, String)> {
        self.scope_members(scope_id, NodeKind::GroupInput)
    }

    fn group_outputs(&self, scope_id: &NodeId) -> Vec<(NodeId, String)> {
        self.scope_members(scope_id, NodeKind::GroupOutput)
    }

    /// Returns the IDs and binding names of body members of one kind.
    fn scope_members(&self, scope_id: &NodeId, kind: NodeKind) -> Vec<(NodeId, String)> {
        self.graph
            .children_of(scope_id)
            .into_iter()
            .filter_map(|child| {
                let schema = self.graph.schema(&child.id)?;
                (schema.kind == kind).then(|| (child.id.clone(), binding_name(child, schema)))
            })
            .collect()
    }
}

/// Collects the exported value of one loop iteration.
///
/// A single `GroupOutput` yields its value, several yield an object keyed by
/// name, none yields `null`.
fn collect_iteration(ctx: &ProcessingContext, exits: &[(NodeId, String)]) -> Value {
    match exits {
        [] => Value::Null,
        [(id, _)] => ctx.get_result(id, "output").unwrap_or(Value::Null),
        _ => Value::Object(
            exits
                .iter()
                .map(|(id, name)| {
                    let value = ctx.get_result(id, "output").unwrap_or(Value::Null);
                    (name.clone(), value)
                })
                .collect(),
        ),
    }
}

/// Converts a panic raised inside a node body into an internal node error.
fn panic_error(payload: Box<dyn Any + Send>) -> NodeError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown payload".to_owned());
    NodeError::internal().with_message(format!("panicked: {detail}"))
}

/// Wraps a body failure as a failure of the owning scope node.
///
/// Cancellation and context errors keep their identity.
fn subgraph_failure(node_id: &NodeId, part: String, error: Error) -> Error {
    match error {
        Error::Cancelled | Error::Context(_) => error,
        error => Error::NodeFailed {
            node_id: node_id.clone(),
            source: NodeError::subgraph()
                .with_message(format!("{part} failed: {error}"))
                .with_source(error),
        },
    }
}
