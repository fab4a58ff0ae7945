//! Centrality measures.
//!
//! - **Degree**: distinct neighbours / (n - 1)
//! - **Betweenness**: all-pairs shortest-path counting
//! - **Closeness**: reachable nodes / sum of Dijkstra distances
//! - **PageRank**: power iteration, no dangling-mass redistribution
//! - **Eigenvector**: power iteration on in-links, L2-normalised
//!
//! Every function takes the adjacency matrix of one invocation and returns
//! one score per matrix index; [`compute_centrality`] keys them by node id.

use rayon::prelude::*;

use super::matrix::{adjacency, undirected_neighbors, NodeIndex, SquareMatrix};
use super::models::{CentralityMeasures, EngineConfig, Graph};
use super::paths::{single_source_shortest_distances, ShortestPathTree};

/// Scores produced by a capped power iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerIteration {
    pub scores: Vec<f64>,
    /// Rounds actually performed
    pub iterations: usize,
    /// Whether the change dropped below epsilon before the cap
    pub converged: bool,
}

impl PowerIteration {
    fn empty() -> Self {
        Self {
            scores: Vec::new(),
            iterations: 0,
            converged: true,
        }
    }
}

// ============================================================================
// Degree
// ============================================================================

/// Degree centrality: distinct neighbours (either direction) / (n - 1).
///
/// Parallel edges collapse in the matrix, so the result stays within [0, 1].
pub fn degree_centrality(adj: &SquareMatrix) -> Vec<f64> {
    let n = adj.size();
    if n <= 1 {
        return vec![0.0; n];
    }
    undirected_neighbors(adj)
        .iter()
        .map(|neighbors| neighbors.len() as f64 / (n - 1) as f64)
        .collect()
}

// ============================================================================
// Betweenness
// ============================================================================

/// Betweenness centrality over all unordered pairs.
///
/// For each unordered pair `{s, t}` the minimum-length paths of both
/// directions are pooled; every internal node of every pooled path accrues
/// `1 / #paths`. Scores are normalised by `(n - 1)(n - 2) / 2`.
///
/// Paths are never materialised: a node `v` receives
/// `#paths through v / #paths`, where the paths through `v` are
/// `σ(s, v) · σ(v, t)` whenever `d(s, v) + d(v, t) = d(s, t)`.
///
/// Pairs are processed in parallel per source node, but partial sums are
/// reduced in source order so the result does not depend on scheduling.
pub fn betweenness_centrality(adj: &SquareMatrix) -> Vec<f64> {
    let n = adj.size();
    if n < 3 {
        return vec![0.0; n];
    }

    let trees: Vec<ShortestPathTree> = (0..n)
        .into_par_iter()
        .map(|source| ShortestPathTree::new(adj, source))
        .collect();

    let partials: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|s| {
            let mut acc = vec![0.0; n];
            for t in (s + 1)..n {
                accumulate_pair(&trees, s, t, &mut acc);
            }
            acc
        })
        .collect();

    let mut scores = vec![0.0; n];
    for partial in &partials {
        for (score, contribution) in scores.iter_mut().zip(partial.iter()) {
            *score += contribution;
        }
    }

    let normalizer = ((n - 1) * (n - 2)) as f64 / 2.0;
    for score in scores.iter_mut() {
        *score /= normalizer;
    }
    scores
}

fn accumulate_pair(trees: &[ShortestPathTree], s: usize, t: usize, acc: &mut [f64]) {
    let forward = trees[s].distance(t);
    let backward = trees[t].distance(s);
    let shortest = match (forward, backward) {
        (None, None) => return,
        (Some(f), None) => f,
        (None, Some(b)) => b,
        (Some(f), Some(b)) => f.min(b),
    };
    let use_forward = forward == Some(shortest);
    let use_backward = backward == Some(shortest);

    let mut total = 0.0;
    if use_forward {
        total += trees[s].path_count(t);
    }
    if use_backward {
        total += trees[t].path_count(s);
    }
    if total <= 0.0 || shortest < 2 {
        return;
    }

    for (v, score) in acc.iter_mut().enumerate() {
        if v == s || v == t {
            continue;
        }
        let mut through = 0.0;
        if use_forward {
            through += paths_through(trees, s, v, t, shortest);
        }
        if use_backward {
            through += paths_through(trees, t, v, s, shortest);
        }
        if through > 0.0 {
            *score += through / total;
        }
    }
}

/// Number of `length`-hop paths `from → via → to`, i.e. shortest paths
/// `from → to` that pass through `via`.
fn paths_through(
    trees: &[ShortestPathTree],
    from: usize,
    via: usize,
    to: usize,
    length: usize,
) -> f64 {
    match (trees[from].distance(via), trees[via].distance(to)) {
        (Some(head), Some(tail)) if head + tail == length => {
            trees[from].path_count(via) * trees[via].path_count(to)
        }
        _ => 0.0,
    }
}

// ============================================================================
// Closeness
// ============================================================================

/// Closeness centrality: reachable nodes / sum of finite Dijkstra distances.
///
/// A node that reaches nobody scores 0.
pub fn closeness_centrality(adj: &SquareMatrix) -> Vec<f64> {
    let n = adj.size();
    (0..n)
        .map(|v| {
            let dist = single_source_shortest_distances(adj, v);
            let (reachable, total) = dist
                .iter()
                .enumerate()
                .filter(|(u, d)| *u != v && d.is_finite())
                .fold((0usize, 0.0f64), |(count, sum), (_, d)| (count + 1, sum + d));
            if reachable == 0 || total <= 0.0 {
                0.0
            } else {
                reachable as f64 / total
            }
        })
        .collect()
}

// ============================================================================
// PageRank (power iteration)
// ============================================================================

/// PageRank by power iteration.
///
/// `pr[i] = (1 - d)/n + d * Σ pr[j] / out_degree[j]` over edges `j → i`,
/// starting from `1/n`. Nodes without out-links contribute nothing; their
/// mass is not redistributed. The final vector is rescaled to sum to 1.
pub fn pagerank(
    adj: &SquareMatrix,
    damping: f64,
    max_iterations: usize,
    epsilon: f64,
) -> PowerIteration {
    let n = adj.size();
    if n == 0 {
        return PowerIteration::empty();
    }

    let teleport = (1.0 - damping) / n as f64;
    let mut scores: Vec<f64> = vec![1.0 / n as f64; n];
    let mut new_scores: Vec<f64> = vec![0.0; n];

    // Precompute out-degrees for each node
    let out_degrees: Vec<usize> = (0..n).map(|j| adj.successors(j).count()).collect();

    let mut iterations = 0;
    let mut converged = false;
    for _ in 0..max_iterations {
        iterations += 1;
        new_scores.fill(teleport);

        for j in 0..n {
            if out_degrees[j] == 0 {
                continue;
            }
            let contribution = damping * scores[j] / out_degrees[j] as f64;
            for i in adj.successors(j) {
                new_scores[i] += contribution;
            }
        }

        let diff: f64 = scores
            .iter()
            .zip(new_scores.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();

        std::mem::swap(&mut scores, &mut new_scores);

        if diff < epsilon {
            converged = true;
            break;
        }
    }

    // Normalize to sum = 1.0
    let total: f64 = scores.iter().sum();
    if total > 0.0 {
        for s in scores.iter_mut() {
            *s /= total;
        }
    }

    PowerIteration {
        scores,
        iterations,
        converged,
    }
}

// ============================================================================
// Eigenvector centrality (power iteration)
// ============================================================================

/// Eigenvector centrality: dominant eigenvector of `Aᵀ` by power iteration.
///
/// Each round computes `x'[i] = Σ_j a[j][i] x[j]` and L2-normalises it. If
/// the iterate collapses to zero (e.g. an acyclic graph) the result is all
/// zeros. Returned scores are absolute values.
pub fn eigenvector_centrality(
    adj: &SquareMatrix,
    max_iterations: usize,
    epsilon: f64,
) -> PowerIteration {
    let n = adj.size();
    if n == 0 {
        return PowerIteration::empty();
    }

    let mut scores = vec![1.0 / (n as f64).sqrt(); n];
    let mut new_scores = vec![0.0; n];
    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..max_iterations {
        iterations += 1;
        new_scores.fill(0.0);
        for j in 0..n {
            for i in adj.successors(j) {
                new_scores[i] += adj[(j, i)] * scores[j];
            }
        }

        let norm = new_scores.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm <= f64::MIN_POSITIVE {
            scores.fill(0.0);
            converged = true;
            break;
        }
        for x in new_scores.iter_mut() {
            *x /= norm;
        }

        let diff: f64 = scores
            .iter()
            .zip(new_scores.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();

        std::mem::swap(&mut scores, &mut new_scores);

        if diff < epsilon {
            converged = true;
            break;
        }
    }

    for x in scores.iter_mut() {
        *x = x.abs();
    }

    PowerIteration {
        scores,
        iterations,
        converged,
    }
}

// ============================================================================
// All measures
// ============================================================================

/// Compute every centrality measure over one shared adjacency matrix.
pub fn centrality_with(
    index: &NodeIndex,
    adj: &SquareMatrix,
    config: &EngineConfig,
) -> CentralityMeasures {
    let pr = pagerank(
        adj,
        config.pagerank_damping,
        config.max_iterations,
        config.convergence_epsilon,
    );
    if !pr.converged {
        tracing::warn!(
            iterations = pr.iterations,
            "PageRank hit the iteration cap without converging"
        );
    }

    let ev = eigenvector_centrality(adj, config.max_iterations, config.convergence_epsilon);
    if !ev.converged {
        tracing::warn!(
            iterations = ev.iterations,
            "Eigenvector centrality hit the iteration cap without converging"
        );
    }

    CentralityMeasures {
        degree: index.keyed(&degree_centrality(adj)),
        betweenness: index.keyed(&betweenness_centrality(adj)),
        closeness: index.keyed(&closeness_centrality(adj)),
        pagerank: index.keyed(&pr.scores),
        eigenvector: index.keyed(&ev.scores),
        pagerank_converged: pr.converged,
        pagerank_iterations: pr.iterations,
        eigenvector_converged: ev.converged,
        eigenvector_iterations: ev.iterations,
    }
}

/// Compute every centrality measure for a graph.
pub fn compute_centrality(graph: &Graph, config: &EngineConfig) -> CentralityMeasures {
    let index = NodeIndex::new(graph);
    let adj = adjacency(graph, &index);
    centrality_with(&index, &adj, config)
}

// ============================================================================
// Tests
// ============================================================================
