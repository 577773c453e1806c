//! Scope node types executed by the runner itself.
//!
//! `Loop` and `Group` own a nested body; `GroupInput` and `GroupOutput` move
//! values across the body boundary.

use async_trait::async_trait;
use serde_json::Value;

use super::{
    Node, NodeContext, NodeError, NodeInputs, NodeKind, NodeOutputs, NodeSchema, NodeType,
    PropertySchema, PropertyType,
};

/// Body is executed by the runner, never through [`Node::process`].
async fn runner_only(ctx: &NodeContext<'_>) -> Result<NodeOutputs, NodeError> {
    Err(NodeError::internal().with_message(format!(
        "scope node '{}' cannot be processed directly",
        ctx.node_id()
    )))
}

/// Runs its body once per element of the `input` list.
#[derive(Debug, Default)]
pub struct LoopNode;

#[async_trait]
impl Node for LoopNode {
    async fn process(
        &self,
        ctx: &NodeContext<'_>,
        _inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        runner_only(ctx).await
    }
}

impl NodeType for LoopNode {
    const NODE_TYPE: &'static str = "workflow.Loop";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE)
            .with_kind(NodeKind::Loop)
            .with_property(
                PropertySchema::new("input", PropertyType::List)
                    .with_description("Elements to iterate over"),
            )
            .with_output("output", PropertyType::List)
    }
}

/// Runs its body once; inputs and outputs are named by its body.
#[derive(Debug, Default)]
pub struct GroupNode;

#[async_trait]
impl Node for GroupNode {
    async fn process(
        &self,
        ctx: &NodeContext<'_>,
        _inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        runner_only(ctx).await
    }
}

impl NodeType for GroupNode {
    const NODE_TYPE: &'static str = "workflow.Group";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE).with_kind(NodeKind::Group)
    }
}

/// Injects the loop element or the named group input into the body.
#[derive(Debug, Default)]
pub struct GroupInputNode;

#[async_trait]
impl Node for GroupInputNode {
    async fn process(
        &self,
        ctx: &NodeContext<'_>,
        _inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        runner_only(ctx).await
    }
}

impl NodeType for GroupInputNode {
    const NODE_TYPE: &'static str = "workflow.GroupInput";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE)
            .with_kind(NodeKind::GroupInput)
            .with_property(PropertySchema::new("name", PropertyType::String).with_default("input"))
            .with_output("output", PropertyType::Any)
    }
}

/// Exports its `input` out of the body under its `name`.
#[derive(Debug, Default)]
pub struct GroupOutputNode;

#[async_trait]
impl Node for GroupOutputNode {
    async fn process(
        &self,
        _ctx: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        let value = inputs.get("input").cloned().unwrap_or(Value::Null);
        Ok(NodeOutputs::output(value))
    }

    fn is_cacheable(&self) -> bool {
        false
    }
}

impl NodeType for GroupOutputNode {
    const NODE_TYPE: &'static str = "workflow.GroupOutput";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE)
            .with_kind(NodeKind::GroupOutput)
            .with_property(PropertySchema::new("name", PropertyType::String).with_default("output"))
            .with_property(PropertySchema::new("input", PropertyType::Any))
            .with_output("output", PropertyType::Any)
    }
}
