//! Runtime error types.

use thiserror::Error;

use crate::graph::{NodeId, StructuralError};
use crate::job::{JobId, JobStatus};
use crate::node::NodeError;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for runtime operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while building or running a workflow.
#[derive(Debug, Error)]
pub enum Error {
    /// The workflow graph is malformed; nothing was executed.
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// A node body reported a failure.
    #[error("node {node_id} failed: {source}")]
    NodeFailed {
        /// ID of the failed node.
        node_id: NodeId,
        /// Error reported by the node.
        #[source]
        source: NodeError,
    },

    /// The processing context was used in a way that breaks a run invariant.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The job was cancelled.
    #[error("workflow execution cancelled")]
    Cancelled,

    /// The runner has already left the pending state.
    #[error("job is already {0}")]
    AlreadyStarted(JobStatus),

    /// The job could not be found in the job store.
    #[error("job {0} not found")]
    JobNotFound(JobId),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns whether this error terminates the job as cancelled rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Returns the ID of the node that failed, if the error originated in a node body.
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Error::NodeFailed { node_id, .. } => Some(node_id),
            _ => None,
        }
    }
}

/// Invariant violations on the processing context.
///
/// These are programming errors rather than node failures and are fatal to
/// the run that triggers them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// A node input is bound to a result that was never recorded.
    #[error("no result recorded for {node_id}.{slot}")]
    MissingResult {
        /// Source node of the binding.
        node_id: NodeId,
        /// Output slot on the source node.
        slot: String,
    },

    /// A result was written twice for the same key within one run.
    #[error("result for {node_id}.{slot} was already recorded")]
    DuplicateResult {
        /// Node that produced the result.
        node_id: NodeId,
        /// Output slot of the result.
        slot: String,
    },

    /// A capability was requested that the context was not built with.
    #[error("capability '{0}' is not configured")]
    MissingCapability(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::StructuralErrorKind;

    #[test]
    fn test_structural_error_is_transparent() {
        let error: Error =
            StructuralError::new(StructuralErrorKind::Cycle, "a -> b -> a").into();
        assert_eq!(error.to_string(), "cycle: a -> b -> a");
        assert!(!error.is_cancelled());
    }

    #[test]
    fn test_node_failed_reports_node() {
        let error = Error::NodeFailed {
            node_id: NodeId::from("add"),
            source: NodeError::invalid_input().with_message("a is not a number"),
        };
        assert_eq!(error.node_id(), Some(&NodeId::from("add")));
        assert_eq!(
            error.to_string(),
            "node add failed: invalid_input: a is not a number"
        );
    }

    #[test]
    fn test_context_error_messages() {
        let error = ContextError::DuplicateResult {
            node_id: NodeId::from("n1"),
            slot: "output".into(),
        };
        assert_eq!(error.to_string(), "result for n1.output was already recorded");
        assert_eq!(
            ContextError::MissingCapability("assets").to_string(),
            "capability 'assets' is not configured"
        );
    }
}
