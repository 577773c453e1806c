//! Cycle detection over the dependency graph.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Control, DfsEvent, depth_first_search};

/// Returns the members of the first dependency cycle found, in path order.
///
/// Runs a colored depth-first search over every node. A back edge to a node
/// still on the stack closes a cycle; the stack slice from that node to the
/// current one is the cycle.
pub(super) fn find_cycle<N, E>(graph: &DiGraph<N, E>) -> Option<Vec<NodeIndex>> {
    let mut path: Vec<NodeIndex> = Vec::new();

    let control = depth_first_search(graph, graph.node_indices(), |event| match event {
        DfsEvent::Discover(node, _) => {
            path.push(node);
            Control::Continue
        }
        DfsEvent::Finish(_, _) => {
            path.pop();
            Control::Continue
        }
        DfsEvent::BackEdge(_, target) => {
            let start = path.iter().position(|node| *node == target).unwrap_or(0);
            Control::Break(path[start..].to_vec())
        }
        _ => Control::Continue,
    });

    control.break_value()
}
