//! End-to-end runs of builtin workflows.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Value, json};
use weft_runtime::capability::{
    AssetKind, AssetRef, AssetStorage, Capabilities, InMemoryAssetStorage, InMemoryNodeCache,
    PredictionClient, PredictionRequest, ProgressFn,
};
use weft_runtime::engine::{ProcessingContext, RunOutcome, WorkflowRunner};
use weft_runtime::graph::{EdgeDef, NodeDef, NodeId, StructuralErrorKind, Workflow};
use weft_runtime::job::{JobId, JobStatus, RunRequest};
use weft_runtime::message::{Message, NodeStatus};
use weft_runtime::node::NodeError;
use weft_runtime::{Error, Result};

use crate::builtin_registry;

async fn run(workflow: Workflow, ctx: &ProcessingContext) -> Result<RunOutcome> {
    WorkflowRunner::new(Arc::new(builtin_registry()))
        .run(RunRequest::new(workflow), ctx)
        .await
}

fn completed_count(messages: &[Message], node: &str) -> usize {
    messages
        .iter()
        .filter(|message| {
            matches!(message, Message::NodeUpdate { node_id, status: NodeStatus::Completed, .. }
                if node_id.as_str() == node)
        })
        .count()
}

#[tokio::test]
async fn test_integer_addition() {
    let workflow = Workflow::new(
        vec![
            NodeDef::new("a", "input.Integer").with_property("value", 10),
            NodeDef::new("b", "input.Integer").with_property("value", 5),
            NodeDef::new("add", "math.Add"),
        ],
        vec![
            EdgeDef::new("a", "output", "add", "a"),
            EdgeDef::new("b", "output", "add", "b"),
        ],
    );
    let ctx = ProcessingContext::new(JobId::new());
    let outcome = run(workflow, &ctx).await.expect("run failed");

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(ctx.get_result(&NodeId::from("add"), "output"), Some(json!(15)));
}

#[tokio::test]
async fn test_float_addition() {
    let workflow = Workflow::new(
        vec![
            NodeDef::new("a", "input.Float").with_property("value", 1.0),
            NodeDef::new("b", "input.Float").with_property("value", 2.0),
            NodeDef::new("add", "math.Add"),
        ],
        vec![
            EdgeDef::new("a", "output", "add", "a"),
            EdgeDef::new("b", "output", "add", "b"),
        ],
    );
    let ctx = ProcessingContext::new(JobId::new());
    run(workflow, &ctx).await.expect("run failed");

    let sum = ctx.get_result(&NodeId::from("add"), "output");
    assert_eq!(sum.and_then(|v| v.as_f64()), Some(3.0));
}

#[tokio::test]
async fn test_image_blend() {
    let storage = Arc::new(InMemoryAssetStorage::new());
    let first = storage
        .put(AssetKind::Image, Some("image/raw"), Bytes::from_static(&[0, 100, 200]))
        .await
        .expect("put failed");
    let second = storage
        .put(AssetKind::Image, Some("image/raw"), Bytes::from_static(&[100, 200, 0]))
        .await
        .expect("put failed");

    let workflow = Workflow::new(
        vec![
            NodeDef::new("image1", "input.Image").with_property("value", first.to_value()),
            NodeDef::new("image2", "input.Image").with_property("value", second.to_value()),
            NodeDef::new("alpha", "input.Float").with_property("value", 0.5),
            NodeDef::new("blend", "image.Blend"),
            NodeDef::new("output", "output.Image").with_property("name", "output"),
        ],
        vec![
            EdgeDef::new("image1", "output", "blend", "image1"),
            EdgeDef::new("image2", "output", "blend", "image2"),
            EdgeDef::new("alpha", "output", "blend", "alpha"),
            EdgeDef::new("blend", "output", "output", "value"),
        ],
    );
    let ctx = ProcessingContext::new(JobId::new())
        .with_capabilities(Capabilities::new().with_shared_assets(storage.clone()));
    let outcome = run(workflow, &ctx).await.expect("run failed");
    assert_eq!(outcome.status, JobStatus::Completed);

    let messages = ctx.drain_messages();
    let terminal: Vec<_> = messages.iter().filter(|m| m.is_terminal()).collect();
    assert_eq!(terminal.len(), 1);
    assert!(messages.last().is_some_and(Message::is_terminal));
    for node in ["image1", "image2", "alpha", "blend", "output"] {
        assert_eq!(completed_count(&messages, node), 1, "node {node}");
    }

    let result = outcome.result.unwrap_or_default();
    let stored: AssetRef = serde_json::from_value(result["output"].clone()).expect("not an asset");
    let data = storage.get(&stored).await.expect("blend not stored");
    assert_eq!(data.as_ref(), &[50, 150, 100]);
}

#[tokio::test]
async fn test_loop_squares() {
    let workflow = Workflow::new(
        vec![
            NodeDef::new("list", "constant.List").with_property("value", json!([1, 2, 3])),
            NodeDef::new("loop", "workflow.Loop"),
            NodeDef::new("item", "workflow.GroupInput").with_parent("loop"),
            NodeDef::new("multiply", "math.Multiply").with_parent("loop"),
            NodeDef::new("square", "workflow.GroupOutput").with_parent("loop"),
            NodeDef::new("output", "output.Value").with_property("name", "squares"),
        ],
        vec![
            EdgeDef::new("list", "output", "loop", "input"),
            EdgeDef::new("item", "output", "multiply", "a"),
            EdgeDef::new("item", "output", "multiply", "b"),
            EdgeDef::new("multiply", "output", "square", "input"),
            EdgeDef::new("loop", "output", "output", "value"),
        ],
    );
    let ctx = ProcessingContext::new(JobId::new());
    let outcome = run(workflow, &ctx).await.expect("run failed");

    assert_eq!(outcome.result, json!({ "squares": [1, 4, 9] }).as_object().cloned());
    assert_eq!(
        ctx.get_result(&NodeId::from("loop"), "output"),
        Some(json!([1, 4, 9]))
    );
}

#[tokio::test]
async fn test_dangling_edge_is_rejected() {
    let workflow = Workflow::new(
        vec![NodeDef::new("a", "input.Integer").with_property("value", 1)],
        vec![EdgeDef::new("a", "output", "missing", "a")],
    );
    let ctx = ProcessingContext::new(JobId::new());
    let error = run(workflow, &ctx).await.expect_err("dangling edge accepted");

    assert!(matches!(
        error,
        Error::Structural(ref e) if e.kind == StructuralErrorKind::DanglingEdge
    ));
    assert!(!ctx.has_messages());
}

#[tokio::test]
async fn test_list_length_and_params() {
    let workflow = Workflow::new(
        vec![
            NodeDef::new("items", "input.List").with_property("name", "items"),
            NodeDef::new("length", "list.Length"),
            NodeDef::new("count", "output.Value").with_property("name", "count"),
        ],
        vec![
            EdgeDef::new("items", "output", "length", "list"),
            EdgeDef::new("length", "output", "count", "value"),
        ],
    );
    let ctx = ProcessingContext::new(JobId::new());
    let request = RunRequest::new(workflow).with_param("items", json!(["x", "y"]));
    let outcome = WorkflowRunner::new(Arc::new(builtin_registry()))
        .run(request, &ctx)
        .await
        .expect("run failed");

    assert_eq!(outcome.result, json!({ "count": 2 }).as_object().cloned());
}

#[tokio::test]
async fn test_now_is_never_cached() {
    let capabilities = Capabilities::new().with_cache(InMemoryNodeCache::new());
    let workflow = Workflow::new(vec![NodeDef::new("now", "util.Now")], vec![]);

    for _ in 0..2 {
        let ctx = ProcessingContext::new(JobId::new()).with_capabilities(capabilities.clone());
        run(workflow.clone(), &ctx).await.expect("run failed");
        let cached = ctx.drain_messages().into_iter().any(|message| {
            matches!(message, Message::NodeUpdate { cached: true, .. })
        });
        assert!(!cached);
    }
}

#[tokio::test]
async fn test_division_by_zero_fails_job() {
    let workflow = Workflow::new(
        vec![NodeDef::new("divide", "math.Divide")
            .with_property("a", 1)
            .with_property("b", 0)],
        vec![],
    );
    let ctx = ProcessingContext::new(JobId::new());
    let outcome = run(workflow, &ctx).await.expect("run failed");

    assert_eq!(outcome.status, JobStatus::Failed);
    assert_eq!(
        outcome.error.as_deref(),
        Some("node divide failed: invalid_input: division by zero")
    );
}

/// Echoes its request and reports two progress steps.
struct EchoPredictions;

#[async_trait]
impl PredictionClient for EchoPredictions {
    async fn predict(
        &self,
        request: PredictionRequest,
        progress: ProgressFn<'_>,
    ) -> Result<Value, NodeError> {
        progress(1, 2);
        progress(2, 2);
        Ok(json!({ "model": request.model, "params": request.params }))
    }
}

#[tokio::test]
async fn test_prediction_reports_progress() {
    let workflow = Workflow::new(
        vec![NodeDef::new("model", "model.Prediction")
            .with_property("model", "echo")
            .with_property("prompt", "a cat")],
        vec![],
    );
    let ctx = ProcessingContext::new(JobId::new())
        .with_capabilities(Capabilities::new().with_predictions(EchoPredictions));
    run(workflow, &ctx).await.expect("run failed");

    assert_eq!(
        ctx.get_result(&NodeId::from("model"), "output"),
        Some(json!({ "model": "echo", "params": { "prompt": "a cat" } }))
    );
    let progress = ctx
        .drain_messages()
        .into_iter()
        .filter(|message| matches!(message, Message::NodeProgress { .. }))
        .count();
    assert_eq!(progress, 2);
}

#[tokio::test]
async fn test_prediction_without_capability_fails() {
    let workflow = Workflow::new(
        vec![NodeDef::new("model", "model.Prediction").with_property("model", "echo")],
        vec![],
    );
    let ctx = ProcessingContext::new(JobId::new());
    let outcome = run(workflow, &ctx).await.expect("run failed");

    assert_eq!(outcome.status, JobStatus::Failed);
    assert!(
        outcome
            .error
            .unwrap_or_default()
            .contains("missing_capability")
    );
}

#[test]
fn test_builtin_registry() {
    let registry = builtin_registry();
    assert_eq!(registry.len(), 21);
    assert!(registry.contains("image.Blend"));
    assert!(registry.contains("workflow.Loop"));
}
