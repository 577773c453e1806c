//! Validated workflow graph.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use super::cycle::find_cycle;
use super::{
    EdgeDef, NodeDef, NodeId, Scope, StructuralError, StructuralErrorKind, TRACING_TARGET,
    Workflow, WorkflowMetadata,
};
use crate::node::{NodeKind, NodeRegistry, NodeSchema, OutputSlot, PropertySchema, PropertyType};

/// An immutable, validated workflow graph.
///
/// Nodes live in one flat arena in declaration order; scope membership is
/// the node's parent pointer. Edges only connect nodes of the same scope, so
/// each scope is an independent DAG over the shared arena.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    /// Dependency graph; edge weights index into `edges`.
    graph: DiGraph<NodeId, usize>,
    /// Node declarations, indexed like the graph nodes.
    nodes: Vec<NodeDef>,
    /// Effective node schemas, indexed like the graph nodes.
    schemas: Vec<NodeSchema>,
    /// Longest path from a source of the node's scope.
    levels: Vec<usize>,
    /// Mapping from node ID to arena index.
    indices: HashMap<NodeId, NodeIndex>,
    /// Members of each scope in declaration order.
    scopes: HashMap<Scope, Vec<NodeIndex>>,
    /// Edge declarations.
    edges: Vec<EdgeDef>,
    /// Workflow metadata.
    metadata: WorkflowMetadata,
}

impl WorkflowGraph {
    /// Validates a workflow definition against the registry and builds the graph.
    pub fn build(workflow: &Workflow, registry: &NodeRegistry) -> Result<Self, StructuralError> {
        let mut graph = DiGraph::with_capacity(workflow.nodes.len(), workflow.edges.len());
        let mut indices = HashMap::with_capacity(workflow.nodes.len());
        let mut schemas = Vec::with_capacity(workflow.nodes.len());

        for node in &workflow.nodes {
            if indices.contains_key(&node.id) {
                return Err(StructuralError::new(
                    StructuralErrorKind::DuplicateNode,
                    format!("node '{}' is declared more than once", node.id),
                )
                .with_node(node.id.clone()));
            }

            let schema = registry.schema(&node.node_type).ok_or_else(|| {
                StructuralError::new(
                    StructuralErrorKind::UnknownNodeType,
                    format!("node '{}' has unknown type '{}'", node.id, node.node_type),
                )
                .with_node(node.id.clone())
            })?;

            let index = graph.add_node(node.id.clone());
            indices.insert(node.id.clone(), index);
            schemas.push(schema.clone());
        }

        let mut this = Self {
            graph,
            nodes: workflow.nodes.clone(),
            schemas,
            levels: Vec::new(),
            indices,
            scopes: HashMap::new(),
            edges: Vec::with_capacity(workflow.edges.len()),
            metadata: workflow.metadata.clone(),
        };

        this.validate_scopes()?;
        this.resolve_group_schemas()?;
        this.validate_literals()?;
        for edge in &workflow.edges {
            this.add_edge(edge.clone())?;
        }
        this.validate_acyclic()?;
        this.compute_levels()?;

        tracing::debug!(
            target: TRACING_TARGET,
            nodes = this.nodes.len(),
            edges = this.edges.len(),
            scopes = this.scopes.len(),
            "Workflow graph built"
        );

        Ok(this)
    }

    /// Checks parent references and partitions nodes into scopes.
    fn validate_scopes(&mut self) -> Result<(), StructuralError> {
        for (position, node) in self.nodes.iter().enumerate() {
            let kind = self.schemas[position].kind;

            if let Some(parent_id) = &node.parent_id {
                let parent = self.indices.get(parent_id).ok_or_else(|| {
                    StructuralError::new(
                        StructuralErrorKind::ScopeViolation,
                        format!("node '{}' has unknown parent '{parent_id}'", node.id),
                    )
                    .with_node(node.id.clone())
                })?;

                if !self.schemas[parent.index()].kind.is_scope() {
                    return Err(StructuralError::new(
                        StructuralErrorKind::ScopeViolation,
                        format!(
                            "parent '{parent_id}' of node '{}' is not a loop or group",
                            node.id
                        ),
                    )
                    .with_nodes([node.id.clone(), parent_id.clone()]));
                }
            } else if matches!(kind, NodeKind::GroupInput | NodeKind::GroupOutput) {
                return Err(StructuralError::new(
                    StructuralErrorKind::ScopeViolation,
                    format!("node '{}' must be placed inside a loop or group", node.id),
                )
                .with_node(node.id.clone()));
            }

            let scope = Scope::of_parent(node.parent_id.as_ref());
            self.scopes
                .entry(scope)
                .or_default()
                .push(NodeIndex::new(position));
        }

        // Scope nesting must terminate at the root.
        for node in &self.nodes {
            let mut seen = HashSet::new();
            let mut current = node.parent_id.as_ref();
            while let Some(parent_id) = current {
                if !seen.insert(parent_id) {
                    return Err(StructuralError::new(
                        StructuralErrorKind::ScopeViolation,
                        format!("scope nesting of node '{}' is circular", node.id),
                    )
                    .with_nodes(seen.into_iter().cloned()));
                }
                current = self
                    .indices
                    .get(parent_id)
                    .and_then(|index| self.nodes[index.index()].parent_id.as_ref());
            }
        }

        Ok(())
    }

    /// Derives the properties and outputs of group nodes from their bodies.
    ///
    /// Each `GroupInput` child named `n` adds property `n` to its group, each
    /// `GroupOutput` child named `m` adds output slot `m`.
    fn resolve_group_schemas(&mut self) -> Result<(), StructuralError> {
        for position in 0..self.nodes.len() {
            if self.schemas[position].kind != NodeKind::Group {
                continue;
            }

            let group_id = self.nodes[position].id.clone();
            let Some(children) = self.scopes.get(&Scope::Node(group_id.clone())) else {
                continue;
            };

            let mut properties = Vec::new();
            let mut outputs: Vec<OutputSlot> = Vec::new();
            for child in children {
                let child = child.index();
                let schema = &self.schemas[child];
                let name = binding_name(&self.nodes[child], schema);
                match schema.kind {
                    NodeKind::GroupInput => {
                        if !properties.iter().any(|p: &PropertySchema| p.name == name) {
                            properties.push(PropertySchema::new(name, PropertyType::Any));
                        }
                    }
                    NodeKind::GroupOutput => {
                        if outputs.iter().any(|slot| slot.name == name) {
                            return Err(StructuralError::new(
                                StructuralErrorKind::DuplicateBinding,
                                format!("group '{group_id}' declares output '{name}' twice"),
                            )
                            .with_node(group_id));
                        }
                        outputs.push(OutputSlot::new(name, PropertyType::Any));
                    }
                    _ => {}
                }
            }

            let schema = &mut self.schemas[position];
            schema.properties.extend(properties);
            schema.outputs.extend(outputs);
        }

        Ok(())
    }

    /// Checks that every literal names a declared property of a fitting type.
    fn validate_literals(&self) -> Result<(), StructuralError> {
        for (node, schema) in self.nodes.iter().zip(&self.schemas) {
            for (name, value) in &node.data {
                let property = schema.property(name).ok_or_else(|| {
                    StructuralError::new(
                        StructuralErrorKind::UnknownProperty,
                        format!(
                            "node '{}' ({}) has no property '{name}'",
                            node.id, node.node_type
                        ),
                    )
                    .with_node(node.id.clone())
                })?;

                if !property.ty.accepts(value) {
                    return Err(StructuralError::new(
                        StructuralErrorKind::TypeMismatch,
                        format!(
                            "property '{name}' of node '{}' expects {}, got {value}",
                            node.id, property.ty
                        ),
                    )
                    .with_node(node.id.clone()));
                }
            }
        }

        Ok(())
    }

    /// Validates an edge and adds it to the dependency graph.
    fn add_edge(&mut self, edge: EdgeDef) -> Result<(), StructuralError> {
        let endpoint = |id: &NodeId| {
            self.indices.get(id).copied().ok_or_else(|| {
                StructuralError::new(
                    StructuralErrorKind::DanglingEdge,
                    format!("edge '{}' references missing node '{id}'", edge.id),
                )
                .with_node(id.clone())
            })
        };
        let source = endpoint(&edge.source)?;
        let target = endpoint(&edge.target)?;

        let source_def = &self.nodes[source.index()];
        let target_def = &self.nodes[target.index()];
        if source_def.parent_id != target_def.parent_id {
            return Err(StructuralError::new(
                StructuralErrorKind::ScopeViolation,
                format!(
                    "edge '{}' connects '{}' in scope {} to '{}' in scope {}",
                    edge.id,
                    edge.source,
                    Scope::of_parent(source_def.parent_id.as_ref()),
                    edge.target,
                    Scope::of_parent(target_def.parent_id.as_ref()),
                ),
            )
            .with_nodes([edge.source.clone(), edge.target.clone()]));
        }

        let slot = self.schemas[source.index()]
            .output(&edge.source_handle)
            .ok_or_else(|| {
                StructuralError::new(
                    StructuralErrorKind::UnknownProperty,
                    format!(
                        "node '{}' has no output '{}'",
                        edge.source, edge.source_handle
                    ),
                )
                .with_node(edge.source.clone())
            })?;
        let property = self.schemas[target.index()]
            .property(&edge.target_handle)
            .ok_or_else(|| {
                StructuralError::new(
                    StructuralErrorKind::UnknownProperty,
                    format!(
                        "node '{}' has no property '{}'",
                        edge.target, edge.target_handle
                    ),
                )
                .with_node(edge.target.clone())
            })?;

        if !slot.ty.is_assignable_to(property.ty) {
            return Err(StructuralError::new(
                StructuralErrorKind::TypeMismatch,
                format!(
                    "edge '{}' feeds {} output '{}.{}' into {} property '{}.{}'",
                    edge.id,
                    slot.ty,
                    edge.source,
                    edge.source_handle,
                    property.ty,
                    edge.target,
                    edge.target_handle
                ),
            )
            .with_nodes([edge.source.clone(), edge.target.clone()]));
        }

        let already_bound = self
            .graph
            .edges_directed(target, Direction::Incoming)
            .any(|existing| self.edges[*existing.weight()].target_handle == edge.target_handle);
        if already_bound {
            return Err(StructuralError::new(
                StructuralErrorKind::DuplicateBinding,
                format!(
                    "property '{}' of node '{}' is bound by more than one edge",
                    edge.target_handle, edge.target
                ),
            )
            .with_node(edge.target.clone()));
        }

        self.graph.add_edge(source, target, self.edges.len());
        self.edges.push(edge);
        Ok(())
    }

    fn validate_acyclic(&self) -> Result<(), StructuralError> {
        let Some(cycle) = find_cycle(&self.graph) else {
            return Ok(());
        };

        let members: Vec<NodeId> = cycle
            .iter()
            .map(|index| self.graph[*index].clone())
            .collect();
        let mut path: Vec<&str> = members.iter().map(NodeId::as_str).collect();
        if let Some(first) = path.first().copied() {
            path.push(first);
        }

        Err(StructuralError::new(
            StructuralErrorKind::Cycle,
            format!("dependency cycle {}", path.join(" -> ")),
        )
        .with_nodes(members))
    }

    fn compute_levels(&mut self) -> Result<(), StructuralError> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            let node = self.graph[cycle.node_id()].clone();
            StructuralError::new(
                StructuralErrorKind::Cycle,
                format!("dependency cycle through '{node}'"),
            )
            .with_node(node)
        })?;

        let mut levels = vec![0; self.nodes.len()];
        for index in order {
            let level = self
                .graph
                .neighbors_directed(index, Direction::Incoming)
                .map(|source| levels[source.index()] + 1)
                .max()
                .unwrap_or(0);
            levels[index.index()] = level;
        }

        self.levels = levels;
        Ok(())
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the workflow metadata.
    pub fn metadata(&self) -> &WorkflowMetadata {
        &self.metadata
    }

    /// Returns whether a node exists.
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.indices.contains_key(id)
    }

    /// Returns a node declaration by ID.
    pub fn node(&self, id: &NodeId) -> Option<&NodeDef> {
        let index = self.indices.get(id)?;
        self.nodes.get(index.index())
    }

    /// Returns the effective schema of a node.
    ///
    /// For groups this includes the properties and outputs derived from the
    /// group body.
    pub fn schema(&self, id: &NodeId) -> Option<&NodeSchema> {
        let index = self.indices.get(id)?;
        self.schemas.get(index.index())
    }

    /// Returns the scope a node belongs to.
    pub fn scope_of(&self, id: &NodeId) -> Option<Scope> {
        self.node(id)
            .map(|node| Scope::of_parent(node.parent_id.as_ref()))
    }

    /// Returns an iterator over all node declarations in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeDef> {
        self.nodes.iter()
    }

    /// Returns the members of a scope in declaration order.
    pub fn scope_nodes(&self, scope: &Scope) -> Vec<&NodeDef> {
        self.scopes
            .get(scope)
            .map(|members| {
                members
                    .iter()
                    .map(|index| &self.nodes[index.index()])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the body of a loop or group node in declaration order.
    pub fn children_of(&self, id: &NodeId) -> Vec<&NodeDef> {
        self.scope_nodes(&Scope::Node(id.clone()))
    }

    /// Returns the nodes of the root scope in declaration order.
    pub fn root_nodes(&self) -> Vec<&NodeDef> {
        self.scope_nodes(&Scope::Root)
    }

    /// Returns the sources of a node's incoming edges.
    pub fn dependencies_of(&self, id: &NodeId) -> HashSet<NodeId> {
        let Some(index) = self.indices.get(id) else {
            return HashSet::new();
        };
        self.graph
            .neighbors_directed(*index, Direction::Incoming)
            .map(|source| self.graph[source].clone())
            .collect()
    }

    /// Returns the edges targeting a node.
    pub fn incoming_edges(&self, id: &NodeId) -> impl Iterator<Item = &EdgeDef> + '_ {
        self.edges_directed(id, Direction::Incoming)
    }

    /// Returns the edges originating from a node.
    pub fn outgoing_edges(&self, id: &NodeId) -> impl Iterator<Item = &EdgeDef> + '_ {
        self.edges_directed(id, Direction::Outgoing)
    }

    fn edges_directed(
        &self,
        id: &NodeId,
        direction: Direction,
    ) -> impl Iterator<Item = &EdgeDef> + '_ {
        let index = self.indices.get(id).copied();
        index
            .into_iter()
            .flat_map(move |index| self.graph.edges_directed(index, direction))
            .map(move |edge| &self.edges[*edge.weight()])
    }

    /// Partitions a scope into dispatch layers.
    ///
    /// Every node in layer `k` depends only on nodes in layers below `k`.
    /// Within a layer nodes keep declaration order.
    pub fn topological_layers(&self, scope: &Scope) -> Vec<Vec<NodeId>> {
        let mut layers: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
        for index in self.scopes.get(scope).into_iter().flatten() {
            layers
                .entry(self.levels[index.index()])
                .or_default()
                .push(self.nodes[index.index()].id.clone());
        }
        layers.into_values().collect()
    }

    /// Converts the graph back into a serializable definition.
    pub fn to_definition(&self) -> Workflow {
        Workflow {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Returns the `name` property of a `GroupInput`/`GroupOutput` node.
pub(crate) fn binding_name(node: &NodeDef, schema: &NodeSchema) -> String {
    node.str_property("name")
        .map(str::to_owned)
        .or_else(|| {
            schema
                .property("name")
                .and_then(|p| p.default.as_ref())
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_default()
}
