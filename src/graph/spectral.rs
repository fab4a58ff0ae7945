//! Spectral analysis of the graph Laplacian.
//!
//! The Laplacian of a directed graph is not symmetric, so the decomposition
//! runs on the Laplacian of the undirected view (`max(A, Aᵀ)`). For graphs
//! whose edges are all bidirectional the two coincide.

use petgraph::graph::UnGraph;

use super::matrix::{adjacency, laplacian_of, symmetrize, NodeIndex, SquareMatrix};
use super::models::{EngineConfig, Graph, SpectralAnalysis};

/// Eigen-decomposition of a symmetric matrix.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Eigenvalues, ascending
    pub values: Vec<f64>,
    /// `vectors[k]` is the unit eigenvector of `values[k]`
    pub vectors: Vec<Vec<f64>>,
    pub sweeps: usize,
    pub converged: bool,
}

/// Cyclic Jacobi eigensolver for symmetric matrices.
///
/// Each sweep applies one rotation per upper-triangle pair `(p, q)`. Stops
/// once the off-diagonal Frobenius norm drops below `tolerance` or after
/// `max_sweeps` sweeps.
pub fn jacobi_eigen(matrix: &SquareMatrix, max_sweeps: usize, tolerance: f64) -> SymmetricEigen {
    let n = matrix.size();
    let mut a = matrix.clone();
    let mut v = SquareMatrix::identity(n);

    let mut sweeps = 0;
    let mut converged = off_diagonal_norm(&a) < tolerance;
    while !converged && sweeps < max_sweeps {
        sweeps += 1;
        for p in 0..n {
            for q in (p + 1)..n {
                rotate(&mut a, &mut v, p, q);
            }
        }
        converged = off_diagonal_norm(&a) < tolerance;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[(i, i)].total_cmp(&a[(j, j)]).then(i.cmp(&j)));

    SymmetricEigen {
        values: order.iter().map(|&k| a[(k, k)]).collect(),
        vectors: order
            .iter()
            .map(|&k| (0..n).map(|row| v[(row, k)]).collect())
            .collect(),
        sweeps,
        converged,
    }
}

/// Zero `a[p][q]` with one Jacobi rotation, accumulating it into `v`.
fn rotate(a: &mut SquareMatrix, v: &mut SquareMatrix, p: usize, q: usize) {
    let apq = a[(p, q)];
    if apq == 0.0 {
        return;
    }
    let n = a.size();

    let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * apq);
    let t = if theta.abs() > 1e150 {
        0.5 / theta
    } else {
        theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt())
    };
    let c = 1.0 / (t * t + 1.0).sqrt();
    let s = t * c;

    // A ← A·J (columns p, q)
    for k in 0..n {
        let akp = a[(k, p)];
        let akq = a[(k, q)];
        a[(k, p)] = c * akp - s * akq;
        a[(k, q)] = s * akp + c * akq;
    }
    // A ← Jᵀ·A (rows p, q)
    for k in 0..n {
        let apk = a[(p, k)];
        let aqk = a[(q, k)];
        a[(p, k)] = c * apk - s * aqk;
        a[(q, k)] = s * apk + c * aqk;
    }
    // Rounding leaves a residue; the rotation defines it as exactly zero
    a[(p, q)] = 0.0;
    a[(q, p)] = 0.0;

    for k in 0..n {
        let vkp = v[(k, p)];
        let vkq = v[(k, q)];
        v[(k, p)] = c * vkp - s * vkq;
        v[(k, q)] = s * vkp + c * vkq;
    }
}

fn off_diagonal_norm(a: &SquareMatrix) -> f64 {
    let n = a.size();
    let mut sum = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                sum += a[(i, j)] * a[(i, j)];
            }
        }
    }
    sum.sqrt()
}

/// Number of connected components of the undirected view of `adj`.
pub fn component_count(adj: &SquareMatrix) -> usize {
    let n = adj.size();
    let mut g: UnGraph<(), ()> = UnGraph::with_capacity(n, 0);
    let handles: Vec<_> = (0..n).map(|_| g.add_node(())).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if adj[(i, j)] > 0.0 || adj[(j, i)] > 0.0 {
                g.add_edge(handles[i], handles[j], ());
            }
        }
    }
    petgraph::algo::connected_components(&g)
}

/// Spectral analysis of a graph.
pub fn spectral(graph: &Graph, config: &EngineConfig) -> SpectralAnalysis {
    let index = NodeIndex::new(graph);
    let adj = adjacency(graph, &index);
    spectral_with(graph, &adj, config)
}

/// Spectral analysis using a precomputed adjacency matrix.
pub fn spectral_with(graph: &Graph, adj: &SquareMatrix, config: &EngineConfig) -> SpectralAnalysis {
    let n = adj.size();
    let lap = laplacian_of(&symmetrize(adj));
    let eigen = jacobi_eigen(&lap, config.jacobi_max_sweeps, config.jacobi_tolerance);
    if !eigen.converged {
        tracing::warn!(
            sweeps = eigen.sweeps,
            "Jacobi eigensolver hit the sweep cap without converging"
        );
    }

    let pairs = n * n.saturating_sub(1) / 2;
    let connectivity = if pairs > 0 {
        graph.edges.len() as f64 / pairs as f64
    } else {
        0.0
    };
    let algebraic_connectivity = eigen.values.get(1).map_or(0.0, |l| l.max(0.0));

    SpectralAnalysis {
        eigenvalues: eigen.values,
        eigenvectors: eigen.vectors,
        laplacian: lap,
        connectivity,
        algebraic_connectivity,
        components: component_count(adj),
        converged: eigen.converged,
        sweeps: eigen.sweeps,
    }
}
