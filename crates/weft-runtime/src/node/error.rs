//! Errors raised by node bodies.

use strum::{AsRefStr, Display, IntoStaticStr};
use thiserror::Error;

use crate::error::{BoxedError, ContextError};

/// Categories of node failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum NodeErrorKind {
    /// An input value is missing or malformed.
    InvalidInput,
    /// An external collaborator (model API, storage) failed.
    External,
    /// An external call timed out.
    Timeout,
    /// The node observed cancellation and stopped.
    Cancelled,
    /// A required capability is not configured.
    MissingCapability,
    /// A nested loop or group body failed.
    Subgraph,
    /// Internal node error.
    Internal,
}

/// A failure reported by a node body.
///
/// Recorded against the node and emitted as a `failed` node update; it never
/// escapes the per-node dispatch boundary on its own.
#[derive(Debug, Error)]
#[error("{kind}{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct NodeError {
    /// The kind of error that occurred.
    pub kind: NodeErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl NodeError {
    /// Creates a new error with the given kind.
    pub fn new(kind: NodeErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a new invalid input error.
    pub fn invalid_input() -> Self {
        Self::new(NodeErrorKind::InvalidInput)
    }

    /// Creates a new external error.
    pub fn external() -> Self {
        Self::new(NodeErrorKind::External)
    }

    /// Creates a new timeout error.
    pub fn timeout() -> Self {
        Self::new(NodeErrorKind::Timeout)
    }

    /// Creates a new cancellation error.
    pub fn cancelled() -> Self {
        Self::new(NodeErrorKind::Cancelled)
    }

    /// Creates a new missing capability error.
    pub fn missing_capability() -> Self {
        Self::new(NodeErrorKind::MissingCapability)
    }

    /// Creates a new subgraph error.
    pub fn subgraph() -> Self {
        Self::new(NodeErrorKind::Subgraph)
    }

    /// Creates a new internal error.
    pub fn internal() -> Self {
        Self::new(NodeErrorKind::Internal)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> NodeErrorKind {
        self.kind
    }

    /// Returns whether the node stopped because the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.kind == NodeErrorKind::Cancelled
    }
}

impl From<ContextError> for NodeError {
    fn from(error: ContextError) -> Self {
        let kind = match error {
            ContextError::MissingCapability(_) => NodeErrorKind::MissingCapability,
            _ => NodeErrorKind::Internal,
        };
        Self::new(kind).with_message(error.to_string())
    }
}

impl From<serde_json::Error> for NodeError {
    fn from(error: serde_json::Error) -> Self {
        Self::invalid_input()
            .with_message(error.to_string())
            .with_source(error)
    }
}
