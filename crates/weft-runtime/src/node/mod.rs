//! Node contract, schemas and registry.
//!
//! A node type is a [`Node`] implementation plus a static [`NodeSchema`],
//! registered by type tag in a [`NodeRegistry`]. The runner instantiates a
//! fresh node for every dispatch and hands it a [`NodeContext`] and resolved
//! [`NodeInputs`].

mod contract;
mod error;
mod io;
mod registry;
mod schema;
mod scope;

pub use contract::{Node, NodeContext, NodeType};
pub use error::{NodeError, NodeErrorKind};
pub use io::{NodeInputs, NodeOutputs};
pub use registry::{NodeFactory, NodeRegistry};
pub use schema::{NodeKind, NodeSchema, OutputSlot, PropertySchema, PropertyType};
pub use scope::{GroupInputNode, GroupNode, GroupOutputNode, LoopNode};
