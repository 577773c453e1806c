//! Node types used by the runtime tests.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::ProcessingContext;
use crate::message::Message;
use crate::node::{
    Node, NodeContext, NodeError, NodeInputs, NodeKind, NodeOutputs, NodeRegistry, NodeSchema,
    NodeType, PropertySchema, PropertyType,
};

/// Returns a registry with the scope types and every test node type.
pub(crate) fn registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry
        .register::<ValueNode>()
        .register::<AddNode>()
        .register::<SquareNode>()
        .register::<TextNode>()
        .register::<FailNode>()
        .register::<PanicNode>()
        .register::<SinkNode>()
        .register::<SleepNode>()
        .register::<StubbornNode>()
        .register::<GpuNode>()
        .register::<ProgressNode>()
        .register::<LifecycleNode>();
    registry
}

/// Pops every message posted so far.
pub(crate) fn messages(ctx: &ProcessingContext) -> Vec<Message> {
    ctx.drain_messages()
}

fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

#[derive(Debug, Default)]
pub(crate) struct ValueNode;

#[async_trait]
impl Node for ValueNode {
    async fn process(
        &self,
        _: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        Ok(NodeOutputs::output(inputs.get("value").cloned().unwrap_or(Value::Null)))
    }
}

impl NodeType for ValueNode {
    const NODE_TYPE: &'static str = "test.Value";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE)
            .with_kind(NodeKind::Input)
            .with_property(PropertySchema::new("name", PropertyType::String).with_default(""))
            .with_property(PropertySchema::new("value", PropertyType::Any))
            .with_output("output", PropertyType::Any)
    }
}

#[derive(Debug, Default)]
pub(crate) struct AddNode;

#[async_trait]
impl Node for AddNode {
    async fn process(
        &self,
        _: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        Ok(NodeOutputs::output(number(inputs.f64("a")? + inputs.f64("b")?)))
    }
}

impl NodeType for AddNode {
    const NODE_TYPE: &'static str = "test.Add";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE)
            .with_property(PropertySchema::new("a", PropertyType::Float).with_default(0))
            .with_property(PropertySchema::new("b", PropertyType::Float).with_default(0))
            .with_output("output", PropertyType::Float)
    }
}

#[derive(Debug, Default)]
pub(crate) struct SquareNode;

#[async_trait]
impl Node for SquareNode {
    async fn process(
        &self,
        _: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        let value = inputs.f64("value")?;
        Ok(NodeOutputs::output(number(value * value)))
    }
}

impl NodeType for SquareNode {
    const NODE_TYPE: &'static str = "test.Square";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE)
            .with_property(PropertySchema::new("value", PropertyType::Float))
            .with_output("output", PropertyType::Float)
    }
}

#[derive(Debug, Default)]
pub(crate) struct TextNode;

#[async_trait]
impl Node for TextNode {
    async fn process(
        &self,
        _: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        Ok(NodeOutputs::output(inputs.str("text")?))
    }
}

impl NodeType for TextNode {
    const NODE_TYPE: &'static str = "test.Text";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE)
            .with_property(PropertySchema::new("text", PropertyType::String))
            .with_output("output", PropertyType::String)
    }
}

#[derive(Debug, Default)]
pub(crate) struct FailNode;

#[async_trait]
impl Node for FailNode {
    async fn process(
        &self,
        _: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        Err(NodeError::external().with_message(inputs.str("message")?))
    }
}

impl NodeType for FailNode {
    const NODE_TYPE: &'static str = "test.Fail";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE)
            .with_property(
                PropertySchema::new("message", PropertyType::String).with_default("boom"),
            )
            .with_output("output", PropertyType::Any)
    }
}

/// Panics while processing.
#[derive(Debug, Default)]
pub(crate) struct PanicNode;

#[async_trait]
impl Node for PanicNode {
    async fn process(&self, _: &NodeContext<'_>, _: NodeInputs) -> Result<NodeOutputs, NodeError> {
        panic!("shape mismatch")
    }
}

impl NodeType for PanicNode {
    const NODE_TYPE: &'static str = "test.Panic";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE).with_output("output", PropertyType::Any)
    }
}

#[derive(Debug, Default)]
pub(crate) struct SinkNode;

#[async_trait]
impl Node for SinkNode {
    async fn process(
        &self,
        _: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        Ok(NodeOutputs::output(inputs.get("value").cloned().unwrap_or(Value::Null)))
    }
}

impl NodeType for SinkNode {
    const NODE_TYPE: &'static str = "test.Sink";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE)
            .with_kind(NodeKind::Output)
            .with_property(PropertySchema::new("name", PropertyType::String).with_default("output"))
            .with_property(PropertySchema::new("value", PropertyType::Any))
            .with_output("output", PropertyType::Any)
    }
}

/// Sleeps for `ms` milliseconds, stopping early on cancellation.
#[derive(Debug, Default)]
pub(crate) struct SleepNode;

#[async_trait]
impl Node for SleepNode {
    async fn process(
        &self,
        ctx: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        let ms = inputs.i64("ms")?.max(0) as u64;
        tokio::select! {
            _ = ctx.cancelled() => Err(NodeError::cancelled()),
            _ = tokio::time::sleep(Duration::from_millis(ms)) => {
                Ok(NodeOutputs::output(inputs.get("value").cloned().unwrap_or(Value::Null)))
            }
        }
    }

    fn is_cacheable(&self) -> bool {
        false
    }
}

impl NodeType for SleepNode {
    const NODE_TYPE: &'static str = "test.Sleep";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE)
            .with_property(PropertySchema::new("ms", PropertyType::Int).with_default(0))
            .with_property(PropertySchema::new("value", PropertyType::Any))
            .with_output("output", PropertyType::Any)
    }
}

/// Sleeps for ten seconds without observing cancellation.
#[derive(Debug, Default)]
pub(crate) struct StubbornNode;

#[async_trait]
impl Node for StubbornNode {
    async fn process(&self, _: &NodeContext<'_>, _: NodeInputs) -> Result<NodeOutputs, NodeError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(NodeOutputs::output(Value::Null))
    }

    fn is_cacheable(&self) -> bool {
        false
    }
}

impl NodeType for StubbornNode {
    const NODE_TYPE: &'static str = "test.Stubborn";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE).with_output("output", PropertyType::Any)
    }
}

/// Holds the GPU for 100ms and outputs the device it was moved to.
#[derive(Debug, Default)]
pub(crate) struct GpuNode {
    device: Option<String>,
}

#[async_trait]
impl Node for GpuNode {
    async fn move_to_device(&mut self, device: &str) -> Result<(), NodeError> {
        self.device = Some(device.to_owned());
        Ok(())
    }

    async fn process(&self, _: &NodeContext<'_>, _: NodeInputs) -> Result<NodeOutputs, NodeError> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(NodeOutputs::output(self.device.clone()))
    }

    fn is_cacheable(&self) -> bool {
        false
    }

    fn requires_gpu(&self) -> bool {
        true
    }
}

impl NodeType for GpuNode {
    const NODE_TYPE: &'static str = "test.Gpu";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE).with_output("output", PropertyType::String)
    }
}

#[derive(Debug, Default)]
pub(crate) struct ProgressNode;

#[async_trait]
impl Node for ProgressNode {
    async fn process(
        &self,
        ctx: &NodeContext<'_>,
        _: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        ctx.report_progress(1, 2);
        ctx.report_progress(2, 2);
        Ok(NodeOutputs::output(Value::Null))
    }
}

impl NodeType for ProgressNode {
    const NODE_TYPE: &'static str = "test.Progress";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE).with_output("output", PropertyType::Any)
    }
}

/// Outputs the lifecycle hooks it went through, in order.
#[derive(Debug, Default)]
pub(crate) struct LifecycleNode {
    hooks: Vec<&'static str>,
}

#[async_trait]
impl Node for LifecycleNode {
    async fn initialize(&mut self, _: &NodeContext<'_>) -> Result<(), NodeError> {
        self.hooks.push("initialize");
        Ok(())
    }

    async fn move_to_device(&mut self, _: &str) -> Result<(), NodeError> {
        self.hooks.push("move_to_device");
        Ok(())
    }

    async fn pre_process(
        &mut self,
        _: &NodeContext<'_>,
        _: &NodeInputs,
    ) -> Result<(), NodeError> {
        self.hooks.push("pre_process");
        Ok(())
    }

    async fn process(&self, _: &NodeContext<'_>, _: NodeInputs) -> Result<NodeOutputs, NodeError> {
        let mut hooks = self.hooks.clone();
        hooks.push("process");
        Ok(NodeOutputs::output(hooks))
    }
}

impl NodeType for LifecycleNode {
    const NODE_TYPE: &'static str = "test.Lifecycle";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE).with_output("output", PropertyType::List)
    }
}
