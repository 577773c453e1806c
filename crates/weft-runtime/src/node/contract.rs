//! The node trait and the context handed to node bodies.

use async_trait::async_trait;
use tokio_util::sync::WaitForCancellationFuture;

use super::{NodeError, NodeInputs, NodeOutputs, NodeSchema};
use crate::capability::{AssetStorage, PredictionClient};
use crate::engine::ProcessingContext;
use crate::graph::NodeId;
use crate::job::JobId;
use crate::message::Message;

/// A unit of computation in a workflow.
///
/// The runner creates a fresh instance per dispatch and drives its lifecycle
/// in order: [`initialize`], [`move_to_device`] (only when [`requires_gpu`]),
/// [`pre_process`], [`process`]. Only [`process`] is required.
///
/// [`initialize`]: Node::initialize
/// [`move_to_device`]: Node::move_to_device
/// [`pre_process`]: Node::pre_process
/// [`process`]: Node::process
/// [`requires_gpu`]: Node::requires_gpu
#[async_trait]
pub trait Node: Send + Sync {
    /// Loads resources the node needs before processing.
    async fn initialize(&mut self, _ctx: &NodeContext<'_>) -> Result<(), NodeError> {
        Ok(())
    }

    /// Moves loaded resources to the configured device.
    async fn move_to_device(&mut self, _device: &str) -> Result<(), NodeError> {
        Ok(())
    }

    /// Inspects the resolved inputs before processing.
    async fn pre_process(
        &mut self,
        _ctx: &NodeContext<'_>,
        _inputs: &NodeInputs,
    ) -> Result<(), NodeError> {
        Ok(())
    }

    /// Computes the node outputs.
    async fn process(
        &self,
        ctx: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError>;

    /// Returns whether outputs may be reused for identical inputs.
    fn is_cacheable(&self) -> bool {
        true
    }

    /// Returns whether the node needs exclusive access to the GPU.
    fn requires_gpu(&self) -> bool {
        false
    }
}

/// A node implementation that can be registered by type tag.
pub trait NodeType: Node + Default + 'static {
    /// Namespaced type tag, e.g. `math.Add`.
    const NODE_TYPE: &'static str;

    /// Returns the static schema of the node type.
    fn schema() -> NodeSchema;
}

/// View of the processing context scoped to one node.
#[derive(Debug, Clone, Copy)]
pub struct NodeContext<'a> {
    node_id: &'a NodeId,
    ctx: &'a ProcessingContext,
}

impl<'a> NodeContext<'a> {
    pub(crate) fn new(node_id: &'a NodeId, ctx: &'a ProcessingContext) -> Self {
        Self { node_id, ctx }
    }

    /// Returns the ID of the running node.
    pub fn node_id(&self) -> &NodeId {
        self.node_id
    }

    /// Returns the ID of the job.
    pub fn job_id(&self) -> JobId {
        self.ctx.job_id()
    }

    /// Emits a progress message for the running node.
    pub fn report_progress(&self, progress: u64, total: u64) {
        self.ctx.post_message(Message::NodeProgress {
            node_id: self.node_id.clone(),
            progress,
            total,
        });
    }

    /// Returns the asset storage capability.
    pub fn assets(&self) -> Result<&'a dyn AssetStorage, NodeError> {
        Ok(self.ctx.assets()?)
    }

    /// Returns the prediction capability.
    pub fn predictions(&self) -> Result<&'a dyn PredictionClient, NodeError> {
        Ok(self.ctx.predictions()?)
    }

    /// Returns whether the run has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.ctx.cancellation().is_cancelled()
    }

    /// Completes when the run is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'a> {
        self.ctx.cancellation().cancelled()
    }
}
