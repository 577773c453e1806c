//! Input nodes.
//!
//! An input node exposes its `value` property through its `output` slot.
//! Job parameters replace `value` on the input nodes whose `name` matches.

use async_trait::async_trait;
use serde_json::{Value, json};
use weft_runtime::node::{
    Node, NodeContext, NodeError, NodeInputs, NodeKind, NodeOutputs, NodeSchema, NodeType,
    PropertySchema, PropertyType,
};

fn input_schema(
    node_type: &str,
    title: &str,
    ty: PropertyType,
    default: Option<Value>,
) -> NodeSchema {
    let mut value = PropertySchema::new("value", ty).with_description("Value passed downstream");
    value.default = default;
    NodeSchema::new(node_type)
        .with_title(title)
        .with_kind(NodeKind::Input)
        .with_property(
            PropertySchema::new("name", PropertyType::String)
                .with_default("")
                .with_description("Name of the job parameter bound to this input"),
        )
        .with_property(value)
        .with_output("output", ty)
}

macro_rules! input_node {
    ($(#[$meta:meta])* $name:ident, $tag:literal, $title:literal, $ty:expr, $default:expr) => {
        $(#[$meta])*
        #[derive(Debug, Default)]
        pub struct $name;

        #[async_trait]
        impl Node for $name {
            async fn process(
                &self,
                _ctx: &NodeContext<'_>,
                inputs: NodeInputs,
            ) -> Result<NodeOutputs, NodeError> {
                Ok(NodeOutputs::output(inputs.get("value").cloned().unwrap_or(Value::Null)))
            }
        }

        impl NodeType for $name {
            const NODE_TYPE: &'static str = $tag;

            fn schema() -> NodeSchema {
                input_schema(Self::NODE_TYPE, $title, $ty, $default)
            }
        }
    };
}

input_node!(
    /// Integer input.
    IntegerInput, "input.Integer", "Integer", PropertyType::Int, Some(json!(0))
);
input_node!(
    /// Floating point input.
    FloatInput, "input.Float", "Float", PropertyType::Float, Some(json!(0.0))
);
input_node!(
    /// String input.
    StringInput, "input.String", "String", PropertyType::String, Some(json!(""))
);
input_node!(
    /// Boolean input.
    BooleanInput, "input.Boolean", "Boolean", PropertyType::Bool, Some(json!(false))
);
input_node!(
    /// List input.
    ListInput, "input.List", "List", PropertyType::List, Some(json!([]))
);

/// Image input; the value is a stored asset reference.
#[derive(Debug, Default)]
pub struct ImageInput;

#[async_trait]
impl Node for ImageInput {
    async fn process(
        &self,
        _ctx: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        let asset = inputs.asset("value")?;
        Ok(NodeOutputs::output(asset.to_value()))
    }
}

impl NodeType for ImageInput {
    const NODE_TYPE: &'static str = "input.Image";

    fn schema() -> NodeSchema {
        input_schema(Self::NODE_TYPE, "Image", PropertyType::Image, None)
    }
}
