//! List nodes.

use async_trait::async_trait;
use weft_runtime::node::{
    Node, NodeContext, NodeError, NodeInputs, NodeOutputs, NodeSchema, NodeType, PropertySchema,
    PropertyType,
};

/// Number of elements of a list.
#[derive(Debug, Default)]
pub struct Length;

#[async_trait]
impl Node for Length {
    async fn process(
        &self,
        _ctx: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        Ok(NodeOutputs::output(inputs.list("list")?.len()))
    }
}

impl NodeType for Length {
    const NODE_TYPE: &'static str = "list.Length";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE)
            .with_property(PropertySchema::new("list", PropertyType::List))
            .with_output("output", PropertyType::Int)
    }
}
