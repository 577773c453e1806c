//! Workflow graph structures.
//!
//! This module provides the graph representation for workflows:
//! - [`Workflow`]: Serializable workflow definition (JSON-friendly)
//! - [`NodeDef`] / [`EdgeDef`]: Node declarations and edge bindings
//! - [`WorkflowGraph`]: Validated, immutable graph with scope and layer queries
//! - [`Scope`]: The root scope or the body of a `Loop`/`Group` node
//! - [`StructuralError`]: Reasons a definition is rejected before execution

mod cycle;
mod definition;
mod error;
mod graph;
mod scope;

pub use definition::{
    EdgeDef, EdgeDefBuilder, NodeDef, NodeDefBuilder, NodeId, Position, Workflow,
    WorkflowMetadata,
};
pub use error::{StructuralError, StructuralErrorKind};
pub use graph::WorkflowGraph;
pub use scope::Scope;

/// Tracing target for graph operations.
const TRACING_TARGET: &str = "weft_runtime::graph";

pub(crate) use graph::binding_name;
