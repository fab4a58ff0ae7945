//! Community detection: single-level Louvain.
//!
//! Works on the undirected view of the adjacency matrix
//! (`w_ij = max(a_ij, a_ji)`). Each node starts in its own community; nodes
//! are then moved greedily to the neighbouring community with the best
//! positive modularity gain until a full pass moves nothing or the pass cap
//! is reached. No coarsening phase is run.

use std::collections::{BTreeMap, HashMap};

use super::matrix::{adjacency, symmetrize, NodeIndex, SquareMatrix};
use super::models::{Community, CommunityDetection, EngineConfig, Graph, Node};

/// Detect communities in a graph.
pub fn detect_communities(graph: &Graph, config: &EngineConfig) -> CommunityDetection {
    let index = NodeIndex::new(graph);
    let adj = adjacency(graph, &index);
    detect_communities_with(graph, &index, &adj, config)
}

/// Detect communities using a precomputed index and adjacency matrix.
pub fn detect_communities_with(
    graph: &Graph,
    index: &NodeIndex,
    adj: &SquareMatrix,
    config: &EngineConfig,
) -> CommunityDetection {
    let n = index.len();
    if n == 0 {
        return CommunityDetection {
            communities: vec![],
            modularity: 0.0,
            passes: 0,
            converged: true,
        };
    }

    let weights = symmetrize(adj);

    // Undirected adjacency lists, in index order
    let mut neighbors: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    let mut node_strengths: Vec<f64> = vec![0.0; n];
    for i in 0..n {
        for j in 0..n {
            let w = weights[(i, j)];
            if w > 0.0 {
                neighbors[i].push((j, w));
                node_strengths[i] += w;
            }
        }
    }

    let total_weight: f64 = node_strengths.iter().sum::<f64>() / 2.0;
    let mut community: Vec<usize> = (0..n).collect();
    let mut passes = 0;
    let mut converged = true;

    if total_weight > 0.0 {
        let outcome = local_moves(
            &neighbors,
            &node_strengths,
            total_weight,
            config.louvain_resolution,
            config.max_iterations,
            &mut community,
        );
        passes = outcome.0;
        converged = outcome.1;
        if !converged {
            tracing::warn!(passes, "Louvain hit the pass cap while nodes were still moving");
        }
    }

    let community = renumber(&community);
    let modularity = compute_modularity(&community, &neighbors, &node_strengths, total_weight);
    let communities = summarize(graph, index, &weights, &community, &node_strengths, total_weight);

    tracing::debug!(
        communities = communities.len(),
        modularity,
        passes,
        "Community detection finished"
    );

    CommunityDetection {
        communities,
        modularity,
        passes,
        converged,
    }
}

/// Greedy local-move phase. Returns `(passes, converged)`.
fn local_moves(
    neighbors: &[Vec<(usize, f64)>],
    node_strengths: &[f64],
    total_weight: f64,
    resolution: f64,
    max_passes: usize,
    community: &mut [usize],
) -> (usize, bool) {
    let n = community.len();
    let m2 = 2.0 * total_weight;

    // Maintain community total strength incrementally
    let mut comm_total_strength: Vec<f64> = node_strengths.to_vec();

    let mut passes = 0;
    while passes < max_passes {
        passes += 1;
        let mut improved = false;

        for node_idx in 0..n {
            let current_comm = community[node_idx];

            // Weight from this node into each neighbouring community.
            // BTreeMap keeps the scan order (and therefore tie-breaking) stable.
            let mut comm_weights: BTreeMap<usize, f64> = BTreeMap::new();
            for &(neighbor, w) in &neighbors[node_idx] {
                *comm_weights.entry(community[neighbor]).or_default() += w;
            }

            let w_in_current = comm_weights.get(&current_comm).copied().unwrap_or(0.0);
            let ki = node_strengths[node_idx];

            // Cost of taking the node out of its current community
            let sigma_tot_current = comm_total_strength[current_comm];
            let remove_cost =
                w_in_current / m2 - resolution * ki * (sigma_tot_current - ki) / (m2 * m2);

            let mut best_comm = current_comm;
            let mut best_gain = 0.0;
            for (&target_comm, &w_to_target) in &comm_weights {
                if target_comm == current_comm {
                    continue;
                }
                let sigma_tot_target = comm_total_strength[target_comm];
                let insert_gain = w_to_target / m2 - resolution * ki * sigma_tot_target / (m2 * m2);
                let gain = insert_gain - remove_cost;
                if gain > best_gain {
                    best_gain = gain;
                    best_comm = target_comm;
                }
            }

            if best_comm != current_comm {
                comm_total_strength[current_comm] -= ki;
                comm_total_strength[best_comm] += ki;
                community[node_idx] = best_comm;
                improved = true;
            }
        }

        if !improved {
            return (passes, true);
        }
    }
    (passes, false)
}

/// Renumber communities to be contiguous (0, 1, 2, ...) by first appearance.
fn renumber(community: &[usize]) -> Vec<usize> {
    let mut remap: HashMap<usize, usize> = HashMap::new();
    community
        .iter()
        .map(|c| {
            let next = remap.len();
            *remap.entry(*c).or_insert(next)
        })
        .collect()
}

/// Newman's modularity Q for a community assignment.
fn compute_modularity(
    community: &[usize],
    neighbors: &[Vec<(usize, f64)>],
    node_strengths: &[f64],
    total_weight: f64,
) -> f64 {
    if total_weight == 0.0 {
        return 0.0;
    }
    let m2 = 2.0 * total_weight;
    let mut q = 0.0;

    for (i, adj) in neighbors.iter().enumerate() {
        for &(j, w) in adj {
            if community[i] == community[j] {
                q += w;
            }
        }
    }
    // Expected term over all same-community ordered pairs, including i == j
    let mut strength_per_comm: BTreeMap<usize, f64> = BTreeMap::new();
    for (i, &c) in community.iter().enumerate() {
        *strength_per_comm.entry(c).or_default() += node_strengths[i];
    }
    let expected: f64 = strength_per_comm.values().map(|s| s * s / m2).sum();

    (q - expected) / m2
}

fn summarize(
    graph: &Graph,
    index: &NodeIndex,
    weights: &SquareMatrix,
    community: &[usize],
    node_strengths: &[f64],
    total_weight: f64,
) -> Vec<Community> {
    let n = community.len();
    let count = community.iter().copied().max().map_or(0, |c| c + 1);
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (i, &c) in community.iter().enumerate() {
        members[c].push(i);
    }

    let mut communities: Vec<Community> = members
        .into_iter()
        .enumerate()
        .map(|(id, nodes)| {
            let mut internal_links = 0usize;
            let mut crossing_links = 0usize;
            let mut internal_weight = 0.0;
            let mut strength = 0.0;
            for &i in &nodes {
                strength += node_strengths[i];
                for j in 0..n {
                    if j == i || weights[(i, j)] <= 0.0 {
                        continue;
                    }
                    if community[j] == id {
                        if j > i {
                            internal_links += 1;
                            internal_weight += weights[(i, j)];
                        }
                    } else {
                        crossing_links += 1;
                    }
                }
            }

            let size = nodes.len();
            let possible = size * size.saturating_sub(1) / 2;
            let internal_density = if possible > 0 {
                internal_links as f64 / possible as f64
            } else {
                0.0
            };
            let modularity = if total_weight > 0.0 {
                internal_weight / total_weight - (strength / (2.0 * total_weight)).powi(2)
            } else {
                0.0
            };

            let member_nodes: Vec<&Node> = nodes.iter().map(|&i| &graph.nodes[i]).collect();
            Community {
                id: id as u32,
                nodes: nodes.iter().map(|&i| index.id(i).to_string()).collect(),
                modularity,
                internal_density,
                external_connectivity: crossing_links as f64 / size as f64,
                label: generate_community_label(id, &member_nodes),
            }
        })
        .collect();

    communities.sort_by_key(|c| std::cmp::Reverse(c.nodes.len()));
    communities
}

/// Generate a human-readable label for a community from its members.
///
/// Strategy: most frequent disciplinary tag, then most frequent node type,
/// ties broken alphabetically.
fn generate_community_label(id: usize, members: &[&Node]) -> String {
    let mut tag_counts: BTreeMap<String, usize> = BTreeMap::new();
    for node in members {
        for tag in node.disciplinary_tags() {
            *tag_counts.entry(tag).or_default() += 1;
        }
    }
    if let Some(tag) = most_frequent(&tag_counts) {
        return tag;
    }

    let mut type_counts: BTreeMap<String, usize> = BTreeMap::new();
    for node in members {
        *type_counts.entry(node.node_type.to_string()).or_default() += 1;
    }
    most_frequent(&type_counts).unwrap_or_else(|| format!("community_{}", id))
}

fn most_frequent(counts: &BTreeMap<String, usize>) -> Option<String> {
    // max_by_key returns the last maximum; iterate in reverse so ties go to
    // the alphabetically first key
    counts
        .iter()
        .rev()
        .max_by_key(|(_, count)| **count)
        .map(|(key, _)| key.clone())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::models::{Edge, EdgeType, NodeType};
    use std::collections::HashSet;

    fn node(id: &str) -> Node {
        Node::new(id, id, NodeType::Hypothesis, vec![0.8])
    }

    /// Two cliques of `size` nodes joined by a single bridge edge.
    fn make_two_cliques(size: usize) -> Graph {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        for prefix in ["a", "b"] {
            let names: Vec<String> = (0..size).map(|i| format!("{}_{}", prefix, i)).collect();
            for name in &names {
                nodes.push(node(name).with_tags([format!("field_{}", prefix)]));
            }
            for i in 0..size {
                for j in (i + 1)..size {
                    edges.push(
                        Edge::new(
                            format!("{}-{}", names[i], names[j]),
                            names[i].clone(),
                            names[j].clone(),
                            EdgeType::Correlative,
                            1.0,
                        )
                        .bidirectional(),
                    );
                }
            }
        }
        edges.push(Edge::new("bridge", "a_0", "b_0", EdgeType::Supportive, 1.0));
        Graph::from_parts(nodes, edges)
    }

    fn make_complete_graph(n: usize) -> Graph {
        let names: Vec<String> = (0..n).map(|i| format!("node_{}", i)).collect();
        let nodes = names.iter().map(|id| node(id)).collect();
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push(Edge::new(
                    format!("e{}_{}", i, j),
                    names[i].clone(),
                    names[j].clone(),
                    EdgeType::Correlative,
                    0.9,
                ));
            }
        }
        Graph::from_parts(nodes, edges)
    }

    fn assert_partition(graph: &Graph, detection: &CommunityDetection) {
        let mut seen = HashSet::new();
        for c in &detection.communities {
            for id in &c.nodes {
                assert!(seen.insert(id.clone()), "{} appears twice", id);
            }
        }
        let all: HashSet<String> = graph.nodes.iter().map(|n| n.id.clone()).collect();
        assert_eq!(seen, all);
    }

    #[test]
    fn test_louvain_two_cliques_detects_2_communities() {
        let g = make_two_cliques(4);
        let detection = detect_communities(&g, &EngineConfig::default());

        assert_partition(&g, &detection);
        assert_eq!(detection.communities.len(), 2, "{:?}", detection.communities);
        assert!(detection.modularity > 0.0);
        assert!(detection.converged);

        let membership = detection.membership();
        for i in 1..4 {
            assert_eq!(membership[&format!("a_{}", i)], membership["a_0"]);
            assert_eq!(membership[&format!("b_{}", i)], membership["b_0"]);
        }
        assert_ne!(membership["a_0"], membership["b_0"]);

        for c in &detection.communities {
            assert!((c.internal_density - 1.0).abs() < 1e-12);
            assert!((c.external_connectivity - 0.25).abs() < 1e-12);
            assert!(c.label.starts_with("field_"));
        }

        let sum: f64 = detection.communities.iter().map(|c| c.modularity).sum();
        assert!((sum - detection.modularity).abs() < 1e-9);
    }

    #[test]
    fn test_louvain_complete_graph_single_community() {
        let g = make_complete_graph(5);
        let detection = detect_communities(&g, &EngineConfig::default());
        assert_eq!(detection.communities.len(), 1);
        assert_eq!(detection.communities[0].nodes.len(), 5);
        assert_eq!(detection.communities[0].label, "hypothesis");
    }

    #[test]
    fn test_no_edges_each_node_alone() {
        let g = Graph::from_parts(vec![node("x"), node("y"), node("z")], vec![]);
        let detection = detect_communities(&g, &EngineConfig::default());
        assert_partition(&g, &detection);
        assert_eq!(detection.communities.len(), 3);
        assert_eq!(detection.modularity, 0.0);
        for c in &detection.communities {
            assert_eq!(c.internal_density, 0.0);
            assert_eq!(c.external_connectivity, 0.0);
        }
    }

    #[test]
    fn test_empty_graph() {
        let detection = detect_communities(&Graph::new(), &EngineConfig::default());
        assert!(detection.communities.is_empty());
        assert_eq!(detection.passes, 0);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let g = make_two_cliques(5);
        let config = EngineConfig::default();
        let first = detect_communities(&g, &config);
        let second = detect_communities(&g, &config);
        assert_eq!(first.membership(), second.membership());
        assert_eq!(first.modularity, second.modularity);
    }

    #[test]
    fn test_pass_cap_respected() {
        let g = make_two_cliques(4);
        let config = EngineConfig {
            max_iterations: 1,
            ..EngineConfig::default()
        };
        let detection = detect_communities(&g, &config);
        assert_eq!(detection.passes, 1);
        assert_partition(&g, &detection);
    }

    #[test]
    fn test_community_label_falls_back_to_type() {
        let nodes = [
            Node::new("g1", "g1", NodeType::Gap, vec![0.5]),
            Node::new("g2", "g2", NodeType::Gap, vec![0.5]),
            Node::new("b1", "b1", NodeType::Bridge, vec![0.5]),
        ];
        let refs: Vec<&Node> = nodes.iter().collect();
        assert_eq!(generate_community_label(0, &refs), "gap");
        assert_eq!(generate_community_label(7, &[]), "community_7");
    }

    #[test]
    fn test_community_label_tie_is_alphabetical() {
        let nodes = [
            node("n1").with_tags(["zoology"]),
            node("n2").with_tags(["astronomy"]),
        ];
        let refs: Vec<&Node> = nodes.iter().collect();
        assert_eq!(generate_community_label(0, &refs), "astronomy");
    }
}
