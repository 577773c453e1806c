//! Structural validation errors.

use std::fmt;

use strum::{AsRefStr, Display, EnumString};

use super::NodeId;

/// Category of a structural defect in a workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum StructuralErrorKind {
    /// A node declares a type tag that is not registered.
    UnknownNodeType,
    /// Two nodes share the same ID.
    DuplicateNode,
    /// A literal or edge handle names a property or slot the schema lacks.
    UnknownProperty,
    /// An edge endpoint references a missing node.
    DanglingEdge,
    /// A parent reference or edge crosses scope boundaries.
    ScopeViolation,
    /// An input property is bound by more than one edge.
    DuplicateBinding,
    /// A value or edge does not fit the declared property type.
    TypeMismatch,
    /// A scope contains a dependency cycle.
    Cycle,
}

/// A workflow graph failed validation.
///
/// Raised before any node executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralError {
    /// Category of the defect.
    pub kind: StructuralErrorKind,
    /// Human-readable description.
    pub detail: String,
    /// Nodes involved, e.g. the members of a cycle.
    pub nodes: Vec<NodeId>,
}

impl StructuralError {
    /// Creates a new structural error.
    pub fn new(kind: StructuralErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            nodes: Vec::new(),
        }
    }

    /// Attaches the nodes involved in the defect.
    pub fn with_nodes(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    /// Attaches a single node involved in the defect.
    pub fn with_node(mut self, node: NodeId) -> Self {
        self.nodes.push(node);
        self
    }
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

impl std::error::Error for StructuralError {}
