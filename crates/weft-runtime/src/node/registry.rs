//! Registry of node types.

use std::collections::HashMap;

use super::scope::{GroupInputNode, GroupNode, GroupOutputNode, LoopNode};
use super::{Node, NodeSchema, NodeType};

/// Creates a fresh node instance.
pub type NodeFactory = fn() -> Box<dyn Node>;

#[derive(Debug, Clone)]
struct NodeDescriptor {
    schema: NodeSchema,
    factory: NodeFactory,
}

/// Maps type tags to node schemas and factories.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    types: HashMap<String, NodeDescriptor>,
}

impl NodeRegistry {
    /// Creates a registry holding the engine scope types.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry
            .register::<LoopNode>()
            .register::<GroupNode>()
            .register::<GroupInputNode>()
            .register::<GroupOutputNode>();
        registry
    }

    /// Creates a registry without any node types.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Registers a node type, replacing any previous registration of its tag.
    pub fn register<T: NodeType>(&mut self) -> &mut Self {
        let schema = T::schema();
        debug_assert_eq!(schema.node_type, T::NODE_TYPE);
        self.types.insert(
            T::NODE_TYPE.to_owned(),
            NodeDescriptor {
                schema,
                factory: create::<T>,
            },
        );
        self
    }

    /// Returns whether a type tag is registered.
    pub fn contains(&self, node_type: &str) -> bool {
        self.types.contains_key(node_type)
    }

    /// Returns the schema of a node type.
    pub fn schema(&self, node_type: &str) -> Option<&NodeSchema> {
        self.types.get(node_type).map(|d| &d.schema)
    }

    /// Creates a fresh instance of a node type.
    pub fn create(&self, node_type: &str) -> Option<Box<dyn Node>> {
        self.types.get(node_type).map(|d| (d.factory)())
    }

    /// Returns all registered schemas sorted by type tag.
    pub fn schemas(&self) -> Vec<&NodeSchema> {
        let mut schemas: Vec<_> = self.types.values().map(|d| &d.schema).collect();
        schemas.sort_by(|a, b| a.node_type.cmp(&b.node_type));
        schemas
    }

    /// Returns the number of registered node types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns whether no node types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn create<T: NodeType>() -> Box<dyn Node> {
    Box::new(T::default())
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
