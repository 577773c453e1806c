//! Image nodes.

use async_trait::async_trait;
use bytes::Bytes;
use weft_runtime::capability::AssetKind;
use weft_runtime::node::{
    Node, NodeContext, NodeError, NodeInputs, NodeOutputs, NodeSchema, NodeType, PropertySchema,
    PropertyType,
};

use crate::TRACING_TARGET;

/// Blends two stored images of equal size: `(1 - alpha) * image1 + alpha * image2`.
#[derive(Debug, Default)]
pub struct Blend;

#[async_trait]
impl Node for Blend {
    async fn process(
        &self,
        ctx: &NodeContext<'_>,
        inputs: NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        let first = inputs.asset("image1")?;
        let second = inputs.asset("image2")?;
        let alpha = inputs.f64("alpha")?;

        let assets = ctx.assets()?;
        let first_data = assets.get(&first).await?;
        let second_data = assets.get(&second).await?;
        let blended = blend(&first_data, &second_data, alpha)?;

        tracing::debug!(
            target: TRACING_TARGET,
            node_id = %ctx.node_id(),
            size = blended.len(),
            alpha,
            "Images blended"
        );

        let stored = assets
            .put(
                AssetKind::Image,
                first.content_type.as_deref(),
                Bytes::from(blended),
            )
            .await?;
        Ok(NodeOutputs::output(stored.to_value()))
    }
}

impl NodeType for Blend {
    const NODE_TYPE: &'static str = "image.Blend";

    fn schema() -> NodeSchema {
        NodeSchema::new(Self::NODE_TYPE)
            .with_title("Blend Images")
            .with_property(PropertySchema::new("image1", PropertyType::Image))
            .with_property(PropertySchema::new("image2", PropertyType::Image))
            .with_property(
                PropertySchema::new("alpha", PropertyType::Float)
                    .with_default(0.5)
                    .with_description("Weight of the second image, between 0 and 1"),
            )
            .with_output("output", PropertyType::Image)
    }
}

/// Linearly interpolates two equally sized buffers byte by byte.
fn blend(first: &[u8], second: &[u8], alpha: f64) -> Result<Vec<u8>, NodeError> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(NodeError::invalid_input().with_message(format!(
            "alpha must be between 0 and 1, got {alpha}"
        )));
    }
    if first.len() != second.len() {
        return Err(NodeError::invalid_input().with_message(format!(
            "images differ in size: {} and {} bytes",
            first.len(),
            second.len()
        )));
    }

    Ok(first
        .iter()
        .zip(second)
        .map(|(&a, &b)| {
            let mixed = f64::from(a) * (1.0 - alpha) + f64::from(b) * alpha;
            mixed.round().clamp(0.0, 255.0) as u8
        })
        .collect())
}
