//! Node declaration types.

use derive_builder::Builder;
use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a node, unique within a workflow.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node ID from any string-like value.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Position of a node in the visual editor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

/// A node declaration.
///
/// Declarations are inert: `node_type` names the registered implementation
/// and `data` holds literal property values. Properties bound by an edge take
/// the upstream result instead of the literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(
    name = "NodeDefBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with")
)]
pub struct NodeDef {
    /// Unique node identifier.
    pub id: NodeId,
    /// Namespaced type tag, e.g. `math.Add`.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Enclosing `Loop` or `Group` node, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub parent_id: Option<NodeId>,
    /// Literal property values.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    #[builder(default)]
    pub data: Map<String, Value>,
    /// Position in the visual editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub position: Option<Position>,
}

impl NodeDef {
    /// Creates a node declaration without properties.
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            parent_id: None,
            data: Map::new(),
            position: None,
        }
    }

    /// Returns a builder for creating a node declaration.
    pub fn builder() -> NodeDefBuilder {
        NodeDefBuilder::default()
    }

    /// Sets a literal property value.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    /// Places the node inside the body of a `Loop` or `Group` node.
    pub fn with_parent(mut self, parent_id: impl Into<NodeId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Returns a literal property value.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Returns a literal string property.
    pub fn str_property(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_node_def_serialization() {
        let node = NodeDef::new("a", "input.Integer")
            .with_property("name", "a")
            .with_property("value", 10);

        let json = serde_json::to_value(&node).expect("serialization failed");
        assert_eq!(
            json,
            json!({ "id": "a", "type": "input.Integer", "data": { "name": "a", "value": 10 } })
        );
    }

    #[test]
    fn test_node_def_deserialization_defaults() {
        let node: NodeDef = serde_json::from_value(json!({
            "id": "m",
            "type": "math.Multiply",
            "parent_id": "loop"
        }))
        .expect("deserialization failed");
        assert_eq!(node.parent_id, Some(NodeId::from("loop")));
        assert!(node.data.is_empty());
        assert!(node.position.is_none());
    }

    #[test]
    fn test_node_def_builder() {
        let node = NodeDef::builder()
            .with_id("out")
            .with_node_type("output.Value")
            .with_parent_id("group")
            .build()
            .expect("builder failed");
        assert_eq!(node.id.as_str(), "out");
        assert_eq!(node.parent_id, Some(NodeId::from("group")));
    }
}
