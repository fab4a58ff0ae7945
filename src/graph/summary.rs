//! Structural summary refreshed into `metadata.graph_metrics` after every
//! transition.

use petgraph::graph::DiGraph;

use super::information::graph_entropy;
use super::matrix::{adjacency, undirected_neighbors, NodeIndex, SquareMatrix};
use super::models::{Graph, StructuralSummary};
use super::spectral::component_count;

/// Compute the structural summary of a graph.
pub fn summarize(graph: &Graph) -> StructuralSummary {
    let index = NodeIndex::new(graph);
    let adj = adjacency(graph, &index);
    let n = index.len();
    if n == 0 {
        return StructuralSummary::default();
    }

    let neighbors = undirected_neighbors(&adj);
    let clustering = clustering_coefficients(&adj, &neighbors);

    let ordered_pairs = n * (n - 1);
    let density = if ordered_pairs > 0 {
        graph.edges.len() as f64 / ordered_pairs as f64
    } else {
        0.0
    };

    StructuralSummary {
        density,
        average_degree: neighbors.iter().map(Vec::len).sum::<usize>() as f64 / n as f64,
        average_clustering: clustering.iter().sum::<f64>() / n as f64,
        weak_components: component_count(&adj),
        strong_components: strong_component_count(&adj),
        mean_confidence: graph.nodes.iter().map(|node| node.mean_confidence()).sum::<f64>()
            / n as f64,
        confidence_entropy: graph_entropy(graph),
    }
}

/// Local clustering coefficient of every node, on the undirected view.
///
/// coefficient = linked neighbour pairs / (k (k - 1) / 2), 0 when k < 2.
pub fn clustering_coefficients(adj: &SquareMatrix, neighbors: &[Vec<usize>]) -> Vec<f64> {
    neighbors
        .iter()
        .map(|around| {
            let k = around.len();
            if k < 2 {
                return 0.0;
            }
            let mut triangles = 0usize;
            for i in 0..k {
                for j in (i + 1)..k {
                    let (a, b) = (around[i], around[j]);
                    if adj[(a, b)] > 0.0 || adj[(b, a)] > 0.0 {
                        triangles += 1;
                    }
                }
            }
            triangles as f64 / (k * (k - 1) / 2) as f64
        })
        .collect()
}

/// Number of strongly connected components (Tarjan).
fn strong_component_count(adj: &SquareMatrix) -> usize {
    let n = adj.size();
    let mut g: DiGraph<(), ()> = DiGraph::with_capacity(n, 0);
    let handles: Vec<_> = (0..n).map(|_| g.add_node(())).collect();
    for i in 0..n {
        for j in adj.successors(i) {
            g.add_edge(handles[i], handles[j], ());
        }
    }
    petgraph::algo::tarjan_scc(&g).len()
}
