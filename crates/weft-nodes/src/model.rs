//! Remote model nodes.

use async_trait::async_trait;
use serde_json::{Map, Value};
use weft_runtime::capability::PredictionRequest;
use weft_runtime::node::{
    Node, NodeContext, NodeError, NodeInputs, NodeOutputs, NodeSchema, NodeType, PropertySchema,
    PropertyType,
};

use crate::TRACING_TARGET;

/// Runs a model through the prediction capability.
///
/// `prompt`, when set, is sent as the `prompt` parameter alongside `params`.
/// Provider progress is forwarded as node progress.
#[derive(Debug, Default)]
pub struct Prediction;

#[async_trait]
impl Node for Prediction {
    async fn process(
        &self,
        ctx: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        let model = inputs.str("model")?;
        let mut params = match inputs.get("params") {
            Some(Value::Object(params)) => params.clone(),
            Some(_) => {
                return Err(
                    NodeError::invalid_input().with_message("input 'params' is not an object")
                );
            }
            None => Map::new(),
        };
        if let Some(prompt) = inputs.get("prompt").filter(|p| p.as_str() != Some("")) {
            params.insert("prompt".to_owned(), prompt.clone());
        }

        let request = PredictionRequest {
            model: model.to_owned(),
            params,
        };
        tracing::debug!(
            target: TRACING_TARGET,
            node_id = %ctx.node_id(),
            model = %request.model,
            "Running prediction"
        );

        let predictions = ctx.predictions()?;
        let progress = |done: u64, total: u64| ctx.report_progress(done, total);
        let output = predictions.predict(request, &progress).await?;
        Ok(NodeOutputs::output(output))
    }
}

impl NodeType for Prediction {
    const NODE_TYPE: &'static str = "model.Prediction";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE)
            .with_title("Model Prediction")
            .with_property(
                PropertySchema::new("model", PropertyType::String)
                    .with_description("Model identifier understood by the provider"),
            )
            .with_property(PropertySchema::new("prompt", PropertyType::String).with_default(""))
            .with_property(
                PropertySchema::new("params", PropertyType::Object)
                    .with_default(Value::Object(Map::new())),
            )
            .with_output("output", PropertyType::Any)
    }
}
