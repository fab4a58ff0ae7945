//! Shortest-path primitives over adjacency matrices.
//!
//! Entries `> 0` are edges; `0` means "no edge". BFS ignores the weights,
//! Dijkstra uses them as distances.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use super::matrix::SquareMatrix;

// ============================================================================
// Unweighted: BFS with predecessor lists
// ============================================================================

/// BFS tree from one source, keeping every shortest-path predecessor.
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    source: usize,
    /// Hop distance from the source (`None` = unreachable)
    distance: Vec<Option<usize>>,
    /// All predecessors of each node on some shortest path
    predecessors: Vec<Vec<usize>>,
    /// Number of distinct shortest paths from the source to each node
    path_counts: Vec<f64>,
}

impl ShortestPathTree {
    /// Breadth-first search from `source`.
    pub fn new(adj: &SquareMatrix, source: usize) -> Self {
        let n = adj.size();
        let mut distance = vec![None; n];
        let mut predecessors = vec![Vec::new(); n];
        let mut path_counts = vec![0.0; n];
        if source >= n {
            return Self {
                source,
                distance,
                predecessors,
                path_counts,
            };
        }

        distance[source] = Some(0);
        path_counts[source] = 1.0;
        let mut queue = VecDeque::new();
        queue.push_back(source);

        // Nodes leave the queue in distance order, so a node's count is
        // final before any of its successors read it
        while let Some(current) = queue.pop_front() {
            let next_hop = distance[current].map_or(0, |d| d + 1);
            let through = path_counts[current];
            for neighbor in adj.successors(current) {
                match distance[neighbor] {
                    None => {
                        distance[neighbor] = Some(next_hop);
                        predecessors[neighbor].push(current);
                        path_counts[neighbor] += through;
                        queue.push_back(neighbor);
                    }
                    Some(d) if d == next_hop => {
                        predecessors[neighbor].push(current);
                        path_counts[neighbor] += through;
                    }
                    Some(_) => {}
                }
            }
        }

        Self {
            source,
            distance,
            predecessors,
            path_counts,
        }
    }

    /// Hop distance to `target`, if reachable.
    pub fn distance(&self, target: usize) -> Option<usize> {
        self.distance.get(target).copied().flatten()
    }

    /// Number of minimum-length paths from the source to `target` (0 when
    /// unreachable).
    ///
    /// Counted on the BFS DAG without enumerating the paths.
    pub fn path_count(&self, target: usize) -> f64 {
        self.path_counts.get(target).copied().unwrap_or(0.0)
    }

    /// Every minimum-length path from the source to `target`, source first.
    ///
    /// Paths are produced in a deterministic order (predecessors are visited
    /// in index order). Empty when `target` is unreachable.
    pub fn paths_to(&self, target: usize) -> Vec<Vec<usize>> {
        if self.distance(target).is_none() {
            return Vec::new();
        }
        let mut paths = Vec::new();
        let mut suffix = vec![target];
        self.collect_paths(target, &mut suffix, &mut paths);
        paths
    }

    fn collect_paths(&self, node: usize, suffix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if node == self.source {
            out.push(suffix.iter().rev().copied().collect());
            return;
        }
        for &pred in &self.predecessors[node] {
            suffix.push(pred);
            self.collect_paths(pred, suffix, out);
            suffix.pop();
        }
    }
}

/// All minimum-length paths from `source` to `target` (unweighted BFS).
pub fn all_shortest_paths(adj: &SquareMatrix, source: usize, target: usize) -> Vec<Vec<usize>> {
    ShortestPathTree::new(adj, source).paths_to(target)
}

// ============================================================================
// Weighted: Dijkstra
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct Frontier {
    cost: f64,
    node: usize,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on cost, ties broken by lower index first
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra distances from `source` using matrix entries as edge lengths.
///
/// Unreachable nodes get `f64::INFINITY`; the source gets 0.
pub fn single_source_shortest_distances(adj: &SquareMatrix, source: usize) -> Vec<f64> {
    let n = adj.size();
    let mut dist = vec![f64::INFINITY; n];
    if source >= n {
        return dist;
    }

    dist[source] = 0.0;
    let mut heap = BinaryHeap::new();
    heap.push(Frontier {
        cost: 0.0,
        node: source,
    });

    while let Some(Frontier { cost, node }) = heap.pop() {
        if cost > dist[node] {
            continue;
        }
        for next in adj.successors(node) {
            let candidate = cost + adj[(node, next)];
            if candidate < dist[next] {
                dist[next] = candidate;
                heap.push(Frontier {
                    cost: candidate,
                    node: next,
                });
            }
        }
    }
    dist
}
