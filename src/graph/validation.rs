//! Invariant checks and structural cloning for [`Graph`] values.

use std::collections::HashSet;

use super::error::InvalidGraph;
use super::models::{Graph, Node};

/// Check every structural invariant of a graph.
///
/// Checks run in a fixed order (nodes, then edges, then metadata counts) and
/// the first violation found is returned, so the reported reason is stable
/// for a given input.
pub fn validate(graph: &Graph) -> Result<(), InvalidGraph> {
    let mut node_ids: HashSet<&str> = HashSet::with_capacity(graph.nodes.len());
    let expected_dim = graph.confidence_dimension();

    for node in &graph.nodes {
        if !node_ids.insert(node.id.as_str()) {
            return Err(InvalidGraph::DuplicateNodeId(node.id.clone()));
        }
        validate_confidence_vector(node, expected_dim)?;
    }

    let mut edge_ids: HashSet<&str> = HashSet::with_capacity(graph.edges.len());
    for edge in &graph.edges {
        if !edge_ids.insert(edge.id.as_str()) {
            return Err(InvalidGraph::DuplicateEdgeId(edge.id.clone()));
        }
        if !in_unit_interval(edge.confidence) {
            return Err(InvalidGraph::ConfidenceOutOfRange {
                owner: edge.id.clone(),
                value: edge.confidence,
            });
        }
        for endpoint in [&edge.source, &edge.target] {
            if !node_ids.contains(endpoint.as_str()) {
                return Err(InvalidGraph::DanglingEdge {
                    edge: edge.id.clone(),
                    node: endpoint.clone(),
                });
            }
        }
    }

    if graph.metadata.total_nodes != graph.nodes.len() {
        return Err(InvalidGraph::CountMismatch {
            what: "nodes",
            reported: graph.metadata.total_nodes,
            actual: graph.nodes.len(),
        });
    }
    if graph.metadata.total_edges != graph.edges.len() {
        return Err(InvalidGraph::CountMismatch {
            what: "edges",
            reported: graph.metadata.total_edges,
            actual: graph.edges.len(),
        });
    }

    Ok(())
}

/// Check a single node's confidence vector: non-empty, in range, and of the
/// expected dimensionality when one is given.
pub fn validate_confidence_vector(
    node: &Node,
    expected_dim: Option<usize>,
) -> Result<(), InvalidGraph> {
    if node.confidence.is_empty() {
        return Err(InvalidGraph::EmptyConfidence(node.id.clone()));
    }
    if let Some(expected) = expected_dim {
        if node.confidence.len() != expected {
            return Err(InvalidGraph::DimensionMismatch {
                id: node.id.clone(),
                expected,
                found: node.confidence.len(),
            });
        }
    }
    if let Some(&value) = node.confidence.iter().find(|&&c| !in_unit_interval(c)) {
        return Err(InvalidGraph::ConfidenceOutOfRange {
            owner: node.id.clone(),
            value,
        });
    }
    Ok(())
}

/// Deep structural clone. The result shares no mutable state with `graph`.
pub fn clone_graph(graph: &Graph) -> Graph {
    Graph {
        nodes: graph.nodes.to_vec(),
        edges: graph.edges.to_vec(),
        metadata: graph.metadata.clone(),
    }
}

fn in_unit_interval(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}
