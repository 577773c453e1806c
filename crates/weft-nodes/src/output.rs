//! Output nodes.
//!
//! The `output` slot of every root output node is reported in the job
//! result under the node's `name`.

use async_trait::async_trait;
use serde_json::Value;
use weft_runtime::node::{
    Node, NodeContext, NodeError, NodeInputs, NodeKind, NodeOutputs, NodeSchema, NodeType,
    PropertySchema, PropertyType,
};

fn output_schema(node_type: &str, title: &str, ty: PropertyType) -> NodeSchema {
    NodeSchema::new(node_type)
        .with_title(title)
        .with_kind(NodeKind::Output)
        .with_property(
            PropertySchema::new("name", PropertyType::String)
                .with_default("output")
                .with_description("Key of the value in the job result"),
        )
        .with_property(PropertySchema::new("value", ty))
        .with_output("output", ty)
}

/// Reports any value.
#[derive(Debug, Default)]
pub struct ValueOutput;

#[async_trait]
impl Node for ValueOutput {
    async fn process(
        &self,
        _ctx: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        Ok(NodeOutputs::output(inputs.get("value").cloned().unwrap_or(Value::Null)))
    }

    fn is_cacheable(&self) -> bool {
        false
    }
}

impl NodeType for ValueOutput {
    const NODE_TYPE: &'static str = "output.Value";

    fn schema() -> NodeSchema {
        output_schema(Self::NODE_TYPE, "Value Output", PropertyType::Any)
    }
}

/// Reports a stored image.
#[derive(Debug, Default)]
pub struct ImageOutput;

#[async_trait]
impl Node for ImageOutput {
    async fn process(
        &self,
        _ctx: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        let asset = inputs.asset("value")?;
        Ok(NodeOutputs::output(asset.to_value()))
    }

    fn is_cacheable(&self) -> bool {
        false
    }
}

impl NodeType for ImageOutput {
    const NODE_TYPE: &'static str = "output.Image";

    fn schema() -> NodeSchema {
        output_schema(Self::NODE_TYPE, "Image Output", PropertyType::Image)
    }
}
