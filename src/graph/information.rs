//! Information-theoretic utilities over confidence distributions.
//!
//! All quantities are in bits. A confidence vector is treated as a mass
//! vector: it is normalised to sum to 1 before entropy is taken, so scaling
//! every confidence by the same factor leaves the entropy unchanged.

use super::models::Graph;

/// Smoothing term that keeps logarithms finite for zero-probability bins.
const SMOOTHING: f64 = 1e-12;

/// Shannon entropy (bits) of a non-negative mass vector.
///
/// Returns 0.0 for an empty vector or one with no positive mass.
/// Negative and non-finite entries are ignored.
pub fn shannon_entropy(masses: &[f64]) -> f64 {
    let total: f64 = masses.iter().copied().filter(|m| valid_mass(*m)).sum();
    if total <= 0.0 {
        return 0.0;
    }
    masses
        .iter()
        .copied()
        .filter(|&m| valid_mass(m) && m > 0.0)
        .map(|m| {
            let p = m / total;
            -p * p.log2()
        })
        .sum()
}

/// Entropy of all node confidence values of a graph, pooled into one distribution.
pub fn graph_entropy(graph: &Graph) -> f64 {
    let pooled: Vec<f64> = graph
        .nodes
        .iter()
        .flat_map(|n| n.confidence.iter().copied())
        .collect();
    shannon_entropy(&pooled)
}

/// `graph_entropy(new) - graph_entropy(old)`.
pub fn information_gain(old: &Graph, new: &Graph) -> f64 {
    graph_entropy(new) - graph_entropy(old)
}

/// Kullback-Leibler divergence D(p || q) in bits.
///
/// Both inputs are normalised first; `q` is smoothed so that the divergence
/// stays finite where `q` has no mass. Vectors of different length are
/// compared over their common prefix.
pub fn kl_divergence(p: &[f64], q: &[f64]) -> f64 {
    let len = p.len().min(q.len());
    let p_total: f64 = p[..len].iter().copied().filter(|m| valid_mass(*m)).sum();
    let q_total: f64 = q[..len].iter().copied().filter(|m| valid_mass(*m)).sum();
    if p_total <= 0.0 || q_total <= 0.0 {
        return 0.0;
    }

    let mut divergence = 0.0;
    for i in 0..len {
        if !valid_mass(p[i]) || p[i] <= 0.0 {
            continue;
        }
        let pi = p[i] / p_total;
        let qi = if valid_mass(q[i]) { q[i] / q_total } else { 0.0 };
        divergence += pi * (pi / (qi + SMOOTHING)).log2();
    }
    divergence.max(0.0)
}

/// Histogram estimate of the mutual information I(X; Y) in bits.
///
/// Values are expected in [0, 1] and are clamped into `bins` equal-width
/// bins. Pairs beyond the shorter input are ignored.
pub fn mutual_information(xs: &[f64], ys: &[f64], bins: usize) -> f64 {
    let len = xs.len().min(ys.len());
    if len == 0 || bins == 0 {
        return 0.0;
    }

    let mut joint = vec![0.0; bins * bins];
    let mut px = vec![0.0; bins];
    let mut py = vec![0.0; bins];
    for i in 0..len {
        let bx = bin_of(xs[i], bins);
        let by = bin_of(ys[i], bins);
        joint[bx * bins + by] += 1.0;
        px[bx] += 1.0;
        py[by] += 1.0;
    }

    let n = len as f64;
    let mut mi = 0.0;
    for bx in 0..bins {
        for by in 0..bins {
            let count = joint[bx * bins + by];
            if count == 0.0 {
                continue;
            }
            let pxy = count / n;
            mi += pxy * (pxy / ((px[bx] / n) * (py[by] / n))).log2();
        }
    }
    mi.max(0.0)
}

/// Mutual information between two confidence dimensions across all nodes.
///
/// Returns 0.0 when either dimension is out of range for the graph.
pub fn confidence_mutual_information(graph: &Graph, dim_a: usize, dim_b: usize, bins: usize) -> f64 {
    let (xs, ys): (Vec<f64>, Vec<f64>) = graph
        .nodes
        .iter()
        .filter_map(|n| Some((*n.confidence.get(dim_a)?, *n.confidence.get(dim_b)?)))
        .unzip();
    mutual_information(&xs, &ys, bins)
}

fn valid_mass(m: f64) -> bool {
    m.is_finite() && m >= 0.0
}

fn bin_of(value: f64, bins: usize) -> usize {
    let clamped = if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    };
    ((clamped * bins as f64) as usize).min(bins - 1)
}
