//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use weft_runtime::prelude::*;
//! ```

pub use crate::capability::{AssetKind, AssetRef, AssetStorage, Capabilities};
pub use crate::engine::{ProcessingContext, RunOutcome, RunnerConfig, WorkflowRunner};
pub use crate::error::{ContextError, Error, Result};
pub use crate::graph::{EdgeDef, NodeDef, NodeId, Scope, StructuralError, Workflow, WorkflowGraph};
pub use crate::job::{JobId, JobStatus, RunRequest};
pub use crate::message::{Message, NodeStatus};
pub use crate::node::{
    Node, NodeContext, NodeError, NodeInputs, NodeKind, NodeOutputs, NodeRegistry, NodeSchema,
    NodeType, PropertyType,
};
