//! Dense matrix views of a [`Graph`].
//!
//! Every analyzer works on an `n × n` matrix indexed through a [`NodeIndex`]
//! built once per call, so all results of one invocation agree on which row
//! belongs to which node.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use super::models::Graph;

// ============================================================================
// NodeIndex: stable id ↔ row mapping
// ============================================================================

/// Mapping between node ids and matrix indices, in graph node order.
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    ids: Vec<String>,
    positions: HashMap<String, usize>,
}

impl NodeIndex {
    /// Build the mapping for a graph. Index `i` is `graph.nodes[i]`.
    pub fn new(graph: &Graph) -> Self {
        let ids: Vec<String> = graph.nodes.iter().map(|n| n.id.clone()).collect();
        let positions = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        Self { ids, positions }
    }

    /// Matrix index of a node id.
    pub fn get(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Node id at a matrix index.
    pub fn id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    /// All ids, in index order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Turn a per-index score vector into a map keyed by node id.
    pub fn keyed(&self, scores: &[f64]) -> HashMap<String, f64> {
        self.ids
            .iter()
            .zip(scores.iter())
            .map(|(id, score)| (id.clone(), *score))
            .collect()
    }
}

// ============================================================================
// SquareMatrix
// ============================================================================

/// Row-major dense square matrix of `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquareMatrix {
    size: usize,
    data: Vec<f64>,
}

impl SquareMatrix {
    /// All-zero `size × size` matrix.
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            data: vec![0.0; size * size],
        }
    }

    /// Identity matrix.
    pub fn identity(size: usize) -> Self {
        let mut m = Self::zeros(size);
        for i in 0..size {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Build from nested rows. Rows must all have `rows.len()` entries.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let size = rows.len();
        let mut m = Self::zeros(size);
        for (i, row) in rows.iter().enumerate() {
            debug_assert_eq!(row.len(), size, "row {} is not square", i);
            for (j, value) in row.iter().enumerate().take(size) {
                m[(i, j)] = *value;
            }
        }
        m
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.size..(i + 1) * self.size]
    }

    /// Sum of row `i` (weighted out-degree for an adjacency matrix).
    pub fn row_sum(&self, i: usize) -> f64 {
        self.row(i).iter().sum()
    }

    /// Nested-row copy, convenient for serialization consumers and tests.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.size).map(|i| self.row(i).to_vec()).collect()
    }

    /// Whether `m[i][j] == m[j][i]` for every pair, within `tolerance`.
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        (0..self.size).all(|i| {
            (i + 1..self.size).all(|j| (self[(i, j)] - self[(j, i)]).abs() <= tolerance)
        })
    }

    /// Indices `j` with a positive entry in row `i`.
    pub fn successors(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.row(i)
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > 0.0)
            .map(|(j, _)| j)
    }
}

impl Index<(usize, usize)> for SquareMatrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.size + j]
    }
}

impl IndexMut<(usize, usize)> for SquareMatrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.size + j]
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Weighted adjacency matrix: `m[i][j] = edge.confidence` for an edge `i → j`.
///
/// The entry is mirrored into `m[j][i]` only for bidirectional edges.
/// Parallel edges between the same pair overwrite each other in edge order
/// (last wins). Edges with an unknown endpoint are skipped.
pub fn adjacency(graph: &Graph, index: &NodeIndex) -> SquareMatrix {
    let mut m = SquareMatrix::zeros(index.len());
    for edge in &graph.edges {
        let (Some(i), Some(j)) = (index.get(&edge.source), index.get(&edge.target)) else {
            continue;
        };
        m[(i, j)] = edge.confidence;
        if edge.bidirectional {
            m[(j, i)] = edge.confidence;
        }
    }
    m
}

/// Laplacian `D - A` of an arbitrary square matrix, with `D` the row sums.
pub fn laplacian_of(adj: &SquareMatrix) -> SquareMatrix {
    let n = adj.size();
    let mut lap = SquareMatrix::zeros(n);
    for i in 0..n {
        for j in 0..n {
            lap[(i, j)] = -adj[(i, j)];
        }
        lap[(i, i)] += adj.row_sum(i);
    }
    lap
}

/// Laplacian `D - A` of the graph's (directed) adjacency matrix.
pub fn laplacian(graph: &Graph, index: &NodeIndex) -> SquareMatrix {
    laplacian_of(&adjacency(graph, index))
}

/// Undirected view: `s[i][j] = max(a[i][j], a[j][i])`, diagonal cleared.
pub fn symmetrize(adj: &SquareMatrix) -> SquareMatrix {
    let n = adj.size();
    let mut sym = SquareMatrix::zeros(n);
    for i in 0..n {
        for j in (i + 1)..n {
            let w = adj[(i, j)].max(adj[(j, i)]);
            sym[(i, j)] = w;
            sym[(j, i)] = w;
        }
    }
    sym
}

/// Distinct neighbours of every node in the undirected view, self excluded.
pub fn undirected_neighbors(adj: &SquareMatrix) -> Vec<Vec<usize>> {
    let n = adj.size();
    (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| j != i && (adj[(i, j)] > 0.0 || adj[(j, i)] > 0.0))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::models::{Edge, EdgeType, Node, NodeType};

    fn three_nodes(edges: Vec<Edge>) -> Graph {
        Graph::from_parts(
            vec![
                Node::new("a", "a", NodeType::Root, vec![0.8]),
                Node::new("b", "b", NodeType::Dimension, vec![0.8]),
                Node::new("c", "c", NodeType::Hypothesis, vec![0.8]),
            ],
            edges,
        )
    }

    #[test]
    fn test_node_index_follows_graph_order() {
        let g = three_nodes(vec![]);
        let index = NodeIndex::new(&g);
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("b"), Some(1));
        assert_eq!(index.id(2), "c");
        assert_eq!(index.get("zzz"), None);

        let keyed = index.keyed(&[0.1, 0.2, 0.3]);
        assert!((keyed["c"] - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_adjacency_directed_unless_bidirectional() {
        let g = three_nodes(vec![
            Edge::new("e1", "a", "b", EdgeType::Causal, 0.7),
            Edge::new("e2", "b", "c", EdgeType::Correlative, 0.4).bidirectional(),
        ]);
        let index = NodeIndex::new(&g);
        let adj = adjacency(&g, &index);

        assert!((adj[(0, 1)] - 0.7).abs() < f64::EPSILON);
        assert_eq!(adj[(1, 0)], 0.0);
        assert!((adj[(1, 2)] - 0.4).abs() < f64::EPSILON);
        assert!((adj[(2, 1)] - 0.4).abs() < f64::EPSILON);
        assert!(!adj.is_symmetric(1e-12));
    }

    #[test]
    fn test_adjacency_parallel_edges_last_wins() {
        let g = three_nodes(vec![
            Edge::new("e1", "a", "b", EdgeType::Causal, 0.7),
            Edge::new("e2", "a", "b", EdgeType::Supportive, 0.2),
        ]);
        let adj = adjacency(&g, &NodeIndex::new(&g));
        assert!((adj[(0, 1)] - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_laplacian_rows_sum_to_zero() {
        let g = three_nodes(vec![
            Edge::new("e1", "a", "b", EdgeType::Causal, 0.7),
            Edge::new("e2", "a", "c", EdgeType::Causal, 0.5),
            Edge::new("e3", "c", "b", EdgeType::Causal, 0.3).bidirectional(),
        ]);
        let lap = laplacian(&g, &NodeIndex::new(&g));
        assert!((lap[(0, 0)] - 1.2).abs() < 1e-12);
        assert!((lap[(0, 1)] + 0.7).abs() < 1e-12);
        for i in 0..3 {
            assert!(lap.row_sum(i).abs() < 1e-12);
        }
    }

    #[test]
    fn test_symmetrize_and_neighbors() {
        let g = three_nodes(vec![
            Edge::new("e1", "a", "b", EdgeType::Causal, 0.7),
            Edge::new("e2", "b", "a", EdgeType::Causal, 0.9),
            Edge::new("loop", "c", "c", EdgeType::Temporal, 0.5),
        ]);
        let adj = adjacency(&g, &NodeIndex::new(&g));
        let sym = symmetrize(&adj);
        assert!(sym.is_symmetric(0.0));
        assert!((sym[(0, 1)] - 0.9).abs() < f64::EPSILON);
        assert_eq!(sym[(2, 2)], 0.0);

        let neighbors = undirected_neighbors(&adj);
        assert_eq!(neighbors[0], vec![1]);
        assert!(neighbors[2].is_empty());
    }

    #[test]
    fn test_empty_graph_matrices() {
        let g = Graph::new();
        let index = NodeIndex::new(&g);
        assert!(index.is_empty());
        assert_eq!(adjacency(&g, &index).size(), 0);
        assert_eq!(laplacian(&g, &index).size(), 0);
    }

    #[test]
    fn test_from_rows_roundtrip() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let m = SquareMatrix::from_rows(&rows);
        assert_eq!(m.to_rows(), rows);
        assert_eq!(SquareMatrix::identity(2).to_rows(), vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(m.successors(0).collect::<Vec<_>>(), vec![0, 1]);
    }
}
