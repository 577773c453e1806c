//! Utility nodes.

use async_trait::async_trait;
use jiff::Timestamp;
use weft_runtime::node::{
    Node, NodeContext, NodeError, NodeInputs, NodeOutputs, NodeSchema, NodeType, PropertyType,
};

/// Current time as an RFC 3339 timestamp.
///
/// Never served from the cache.
#[derive(Debug, Default)]
pub struct Now;

#[async_trait]
impl Node for Now {
    async fn process(
        &self,
        _ctx: &NodeContext<'_>,
        _inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        Ok(NodeOutputs::output(Timestamp::now().to_string()))
    }

    fn is_cacheable(&self) -> bool {
        false
    }
}

impl NodeType for Now {
    const NODE_TYPE: &'static str = "util.Now";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE)
            .with_title("Current Time")
            .with_output("output", PropertyType::String)
    }
}
