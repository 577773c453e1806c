//! Workflow definition types.
//!
//! These are the serializable, frontend-friendly types a caller submits. A
//! definition is validated and turned into a [`WorkflowGraph`] before it runs.
//!
//! [`WorkflowGraph`]: super::WorkflowGraph

use serde::{Deserialize, Serialize};

mod edge;
mod metadata;
mod node;

pub use edge::{EdgeDef, EdgeDefBuilder};
pub use metadata::WorkflowMetadata;
pub use node::{NodeDef, NodeDefBuilder, NodeId, Position};

/// Serializable workflow definition.
///
/// Nodes are kept in declaration order, which is the tie-break order for
/// dispatching nodes of the same topological layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Node declarations in declaration order.
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    /// Edges binding outputs to inputs.
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
    /// Workflow metadata.
    #[serde(default)]
    pub metadata: WorkflowMetadata,
}

impl Workflow {
    /// Creates a workflow from nodes and edges.
    pub fn new(nodes: Vec<NodeDef>, edges: Vec<EdgeDef>) -> Self {
        Self {
            nodes,
            edges,
            metadata: WorkflowMetadata::default(),
        }
    }

    /// Returns a node declaration by ID.
    pub fn node(&self, id: &NodeId) -> Option<&NodeDef> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    /// Returns a mutable node declaration by ID.
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut NodeDef> {
        self.nodes.iter_mut().find(|node| &node.id == id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_workflow_from_json() {
        let workflow: Workflow = serde_json::from_value(json!({
            "nodes": [
                { "id": "a", "type": "input.Integer", "data": { "value": 10 } },
                { "id": "add", "type": "math.Add" }
            ],
            "edges": [
                {
                    "id": "e1",
                    "source": "a",
                    "sourceHandle": "output",
                    "target": "add",
                    "targetHandle": "a"
                }
            ]
        }))
        .expect("deserialization failed");

        assert_eq!(workflow.nodes.len(), 2);
        assert_eq!(workflow.edges[0].target_handle, "a");
        assert!(workflow.node(&NodeId::from("add")).is_some());
        assert!(workflow.metadata.name.is_none());
    }

    #[test]
    fn test_workflow_node_mut() {
        let mut workflow = Workflow::new(vec![NodeDef::new("a", "input.Integer")], vec![]);
        if let Some(node) = workflow.node_mut(&NodeId::from("a")) {
            node.data.insert("value".into(), json!(3));
        }
        assert_eq!(workflow.nodes[0].property("value"), Some(&json!(3)));
    }
}
