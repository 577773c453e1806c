//! Arithmetic nodes.
//!
//! Two integers produce an integer when the exact result fits; any other
//! combination produces a float.

use async_trait::async_trait;
use serde_json::{Value, json};
use weft_runtime::node::{
    Node, NodeContext, NodeError, NodeInputs, NodeOutputs, NodeSchema, NodeType, PropertySchema,
    PropertyType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    fn apply(self, inputs: &NodeInputs) -> Result<Value, NodeError> {
        let (a, b) = (inputs.require("a")?, inputs.require("b")?);

        if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
            let exact = match self {
                Operator::Add => x.checked_add(y),
                Operator::Subtract => x.checked_sub(y),
                Operator::Multiply => x.checked_mul(y),
                Operator::Divide if y == 0 => return Err(division_by_zero()),
                Operator::Divide => x
                    .checked_rem(y)
                    .filter(|remainder| *remainder == 0)
                    .and_then(|_| x.checked_div(y)),
            };
            if let Some(value) = exact {
                return Ok(json!(value));
            }
        }

        let (x, y) = (inputs.f64("a")?, inputs.f64("b")?);
        let value = match self {
            Operator::Add => x + y,
            Operator::Subtract => x - y,
            Operator::Multiply => x * y,
            Operator::Divide if y == 0.0 => return Err(division_by_zero()),
            Operator::Divide => x / y,
        };
        Ok(json!(value))
    }
}

fn division_by_zero() -> NodeError {
    NodeError::invalid_input().with_message("division by zero")
}

fn binary_schema(node_type: &str) -> NodeSchema {
    NodeSchema::new(node_type)
        .with_property(PropertySchema::new("a", PropertyType::Float).with_default(0))
        .with_property(PropertySchema::new("b", PropertyType::Float).with_default(0))
        .with_output("output", PropertyType::Float)
}

macro_rules! binary_node {
    ($(#[$meta:meta])* $name:ident, $tag:literal, $operator:expr) => {
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
                Ok(NodeOutputs::output($operator.apply(&inputs)?))
            }
        }

        impl NodeType for $name {
            const NODE_TYPE: &'static str = $tag;

            fn schema() -> NodeSchema {
                binary_schema(Self::NODE_TYPE)
            }
        }
    };
}

binary_node!(
    /// `a + b`.
    Add, "math.Add", Operator::Add
);
binary_node!(
    /// `a - b`.
    Subtract, "math.Subtract", Operator::Subtract
);
binary_node!(
    /// `a * b`.
    Multiply, "math.Multiply", Operator::Multiply
);
binary_node!(
    /// `a / b`; fails on division by zero.
    Divide, "math.Divide", Operator::Divide
);
