//! Execution scopes.

use derive_more::Display;

use super::NodeId;

/// A set of nodes sharing the same `parent_id`.
///
/// Acyclicity and topological layering are computed per scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Display)]
pub enum Scope {
    /// Nodes without a parent.
    #[default]
    #[display("root")]
    Root,
    /// Body of a `Loop` or `Group` node.
    #[display("{_0}")]
    Node(NodeId),
}

impl Scope {
    /// Returns the scope a node with the given parent belongs to.
    pub fn of_parent(parent_id: Option<&NodeId>) -> Self {
        parent_id.map_or(Scope::Root, |id| Scope::Node(id.clone()))
    }

    /// Returns the scope-defining node, if this is not the root scope.
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Scope::Root => None,
            Scope::Node(id) => Some(id),
        }
    }

    /// Returns whether this is the root scope.
    pub const fn is_root(&self) -> bool {
        matches!(self, Scope::Root)
    }
}

impl From<NodeId> for Scope {
    fn from(id: NodeId) -> Self {
        Scope::Node(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_of_parent() {
        assert_eq!(Scope::of_parent(None), Scope::Root);
        let loop_id = NodeId::from("loop");
        assert_eq!(
            Scope::of_parent(Some(&loop_id)),
            Scope::Node(loop_id.clone())
        );
        assert_eq!(Scope::Node(loop_id.clone()).node_id(), Some(&loop_id));
        assert_eq!(Scope::Node(loop_id).to_string(), "loop");
        assert_eq!(Scope::Root.to_string(), "root");
    }
}
