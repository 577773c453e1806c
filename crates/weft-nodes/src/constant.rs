//! Constant nodes.

use async_trait::async_trait;
use serde_json::Value;
use weft_runtime::node::{
    Node, NodeContext, NodeError, NodeInputs, NodeOutputs, NodeSchema, NodeType, PropertySchema,
    PropertyType,
};

/// A literal list.
#[derive(Debug, Default)]
pub struct ListConstant;

#[async_trait]
impl Node for ListConstant {
    async fn process(
        &self,
        _ctx: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        let items = match inputs.get("value") {
            Some(_) => inputs.list("value")?.to_vec(),
            None => Vec::new(),
        };
        Ok(NodeOutputs::output(items))
    }
}

impl NodeType for ListConstant {
    const NODE_TYPE: &'static str = "constant.List";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE)
            .with_title("List")
            .with_property(
                PropertySchema::new("value", PropertyType::List).with_default(Value::Array(vec![])),
            )
            .with_output("output", PropertyType::List)
    }
}
