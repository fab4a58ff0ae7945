//! Graph state transitions.
//!
//! Every transition is a pure function from an input graph (plus evidence
//! nodes for integration) to a brand-new graph. [`apply`] wraps them with
//! input validation, bookkeeping, output validation and change metrics.

use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};
use uuid::Uuid;

use super::centrality::{betweenness_centrality, pagerank};
use super::error::EngineError;
use super::information::information_gain;
use super::matrix::{adjacency, NodeIndex};
use super::models::{
    Edge, EdgeType, EngineConfig, Graph, Node, Position, TransitionKind, TransitionMetrics,
    TransitionOutcome, EDGE_BOOST, POSITION_STEP, SAME_TYPE_BONUS,
};
use super::summary::summarize;
use super::validation::{clone_graph, validate, validate_confidence_vector};

/// Namespace for the UUIDv5 ids of generated edges.
const EDGE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6b67_7400_7472_616e_7369_7469_6f6e_0001);

// ============================================================================
// Entry point
// ============================================================================

/// Apply one transition to `graph`.
///
/// `evidence` is only read by [`TransitionKind::EvidenceIntegration`]. The
/// input graph is never modified.
pub fn apply(
    graph: &Graph,
    evidence: &[Node],
    kind: TransitionKind,
    config: &EngineConfig,
) -> Result<TransitionOutcome, EngineError> {
    validate(graph)?;

    let mut next = match kind {
        TransitionKind::EvidenceIntegration => integrate_evidence(graph, evidence, config)?,
        TransitionKind::Pruning => prune(graph, config),
        TransitionKind::Merging => merge(graph, config),
        TransitionKind::Refinement => refine(graph, config),
    };
    finalize(&mut next);

    validate(&next).map_err(|source| EngineError::CorruptedOutput { kind, source })?;

    let metrics = transition_metrics(graph, &next);
    let confidence = transition_confidence(&metrics);

    tracing::debug!(
        %kind,
        nodes_added = metrics.nodes_added,
        nodes_removed = metrics.nodes_removed,
        edges_added = metrics.edges_added,
        edges_removed = metrics.edges_removed,
        topology_change = metrics.topology_change,
        information_gain = metrics.information_gain,
        confidence,
        "Transition applied"
    );

    Ok(TransitionOutcome {
        graph: next,
        metrics,
        confidence,
    })
}

/// Stamp bookkeeping on a freshly produced graph.
fn finalize(graph: &mut Graph) {
    graph.refresh_counts();
    graph.metadata.last_updated = Utc::now();
    graph.metadata.graph_metrics = summarize(graph);
}

// ============================================================================
// Metrics
// ============================================================================

/// Change metrics between two graphs.
pub fn transition_metrics(old: &Graph, new: &Graph) -> TransitionMetrics {
    let old_nodes: HashSet<&str> = old.nodes.iter().map(|n| n.id.as_str()).collect();
    let new_nodes: HashSet<&str> = new.nodes.iter().map(|n| n.id.as_str()).collect();
    let old_edges: HashSet<&str> = old.edges.iter().map(|e| e.id.as_str()).collect();
    let new_edges: HashSet<&str> = new.edges.iter().map(|e| e.id.as_str()).collect();

    let nodes_added = new_nodes.difference(&old_nodes).count();
    let nodes_removed = old_nodes.difference(&new_nodes).count();

    let edge_delta = old.edges.len().abs_diff(new.edges.len());
    let baseline = (old.nodes.len() + old.edges.len()).max(1);

    TransitionMetrics {
        nodes_added,
        nodes_removed,
        edges_added: new_edges.difference(&old_edges).count(),
        edges_removed: old_edges.difference(&new_edges).count(),
        topology_change: (nodes_added + nodes_removed + edge_delta) as f64 / baseline as f64,
        information_gain: information_gain(old, new),
    }
}

/// `clamp(0.5 + max(0, 0.2 - topology_change) + clamp(information_gain, 0, 0.3), 0, 1)`.
pub fn transition_confidence(metrics: &TransitionMetrics) -> f64 {
    let stability = (0.2 - metrics.topology_change).max(0.0);
    let gain = metrics.information_gain.clamp(0.0, 0.3);
    (0.5 + stability + gain).clamp(0.0, 1.0)
}

// ============================================================================
// Similarity
// ============================================================================

/// Semantic similarity of two nodes in [0, 1].
///
/// Jaccard overlap of their disciplinary tags (0 when both have none), plus
/// a bonus when both nodes have the same type, capped at 1.
pub fn similarity(a: &Node, b: &Node) -> f64 {
    let tags_a = a.disciplinary_tags();
    let tags_b = b.disciplinary_tags();
    let union = tags_a.union(&tags_b).count();
    let jaccard = if union > 0 {
        tags_a.intersection(&tags_b).count() as f64 / union as f64
    } else {
        0.0
    };
    let bonus = if a.node_type == b.node_type {
        SAME_TYPE_BONUS
    } else {
        0.0
    };
    (jaccard + bonus).min(1.0)
}

// ============================================================================
// Evidence integration
// ============================================================================

/// Append evidence nodes and link each to its most similar existing nodes.
///
/// Every evidence node is checked before anything is appended, so a bad
/// node rejects the whole batch. Evidence whose id is already in the graph
/// (or earlier in the batch) is skipped.
pub fn integrate_evidence(
    graph: &Graph,
    evidence: &[Node],
    config: &EngineConfig,
) -> Result<Graph, EngineError> {
    let dimension = graph
        .confidence_dimension()
        .or_else(|| evidence.first().map(|n| n.confidence.len()));
    for node in evidence {
        validate_confidence_vector(node, dimension).map_err(|err| {
            EngineError::InvalidEvidence {
                id: node.id.clone(),
                reason: err.to_string(),
            }
        })?;
    }

    let mut next = clone_graph(graph);
    let mut node_ids: HashSet<String> = next.nodes.iter().map(|n| n.id.clone()).collect();
    let mut edge_ids: HashSet<String> = next.edges.iter().map(|e| e.id.clone()).collect();

    for node in evidence {
        if node_ids.contains(&node.id) {
            tracing::warn!(id = %node.id, "Evidence node already present, skipping");
            continue;
        }

        let mut candidates: Vec<(usize, f64)> = next
            .nodes
            .iter()
            .enumerate()
            .map(|(i, existing)| (i, similarity(node, existing)))
            .filter(|(_, score)| *score > config.evidence_link_threshold)
            .collect();
        // Stable sort keeps graph order among equal scores
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        candidates.truncate(config.max_evidence_links);

        for (i, score) in candidates {
            let target = next.nodes[i].id.clone();
            let id = allocate_edge_id(
                TransitionKind::EvidenceIntegration,
                &node.id,
                &target,
                &edge_ids,
            );
            let mut edge = Edge::new(id.clone(), node.id.clone(), target, EdgeType::Supportive, score);
            edge.metadata.insert(
                "generated_by".to_string(),
                Value::String(TransitionKind::EvidenceIntegration.to_string()),
            );
            edge_ids.insert(id);
            next.edges.push(edge);
        }

        node_ids.insert(node.id.clone());
        next.nodes.push(node.clone());
    }

    Ok(next)
}

/// Deterministic id for a generated edge, unique within `taken`.
fn allocate_edge_id(
    kind: TransitionKind,
    source: &str,
    target: &str,
    taken: &HashSet<String>,
) -> String {
    let name = format!("{}:{}->{}", kind, source, target);
    let base = Uuid::new_v5(&EDGE_ID_NAMESPACE, name.as_bytes()).to_string();
    unique_id(base, |candidate| taken.contains(candidate))
}

/// `base`, or `base-1`, `base-2`, ... until `is_taken` says no.
fn unique_id(base: String, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(&base) {
        return base;
    }
    let mut suffix = 1;
    loop {
        let candidate = format!("{}-{}", base, suffix);
        if !is_taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

// ============================================================================
// Pruning
// ============================================================================

/// Drop weak nodes, then weak edges and edges that lost an endpoint.
pub fn prune(graph: &Graph, config: &EngineConfig) -> Graph {
    let threshold = config.prune_threshold;
    let nodes: Vec<Node> = graph
        .nodes
        .iter()
        .filter(|n| n.mean_confidence() >= threshold)
        .cloned()
        .collect();
    let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

    let edges: Vec<Edge> = graph
        .edges
        .iter()
        .filter(|e| {
            e.confidence >= threshold
                && kept.contains(e.source.as_str())
                && kept.contains(e.target.as_str())
        })
        .cloned()
        .collect();

    tracing::debug!(
        nodes_dropped = graph.nodes.len() - nodes.len(),
        edges_dropped = graph.edges.len() - edges.len(),
        threshold,
        "Pruned graph"
    );

    Graph {
        nodes,
        edges,
        metadata: graph.metadata.clone(),
    }
}

// ============================================================================
// Merging
// ============================================================================

/// Group nodes whose pairwise similarity is at least the merge threshold.
///
/// Complete linkage: a node joins a cluster only if it is similar enough to
/// every member already in it. Clusters are seeded in graph order, members
/// are listed in graph order.
pub fn merge_clusters(graph: &Graph, threshold: f64) -> Vec<Vec<usize>> {
    let n = graph.nodes.len();
    let mut assigned = vec![false; n];
    let mut clusters = Vec::new();

    for seed in 0..n {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;
        let mut cluster = vec![seed];
        for candidate in (seed + 1)..n {
            if assigned[candidate] {
                continue;
            }
            let fits = cluster
                .iter()
                .all(|&m| similarity(&graph.nodes[m], &graph.nodes[candidate]) >= threshold);
            if fits {
                assigned[candidate] = true;
                cluster.push(candidate);
            }
        }
        clusters.push(cluster);
    }
    clusters
}

/// Collapse each multi-node cluster into one synthetic node and rewire edges.
///
/// The merged node takes the place of the cluster's first member. Self-loops
/// produced by the rewiring are dropped unless `keep_merge_self_loops` is set.
pub fn merge(graph: &Graph, config: &EngineConfig) -> Graph {
    let clusters: Vec<Vec<usize>> = merge_clusters(graph, config.merge_threshold)
        .into_iter()
        .filter(|c| c.len() > 1)
        .collect();
    if clusters.is_empty() {
        return clone_graph(graph);
    }

    let mut taken: HashSet<String> = graph.nodes.iter().map(|n| n.id.clone()).collect();
    let mut replacement: HashMap<usize, Node> = HashMap::new();
    let mut absorbed: HashSet<usize> = HashSet::new();
    let mut renamed: HashMap<&str, String> = HashMap::new();

    for cluster in &clusters {
        let members: Vec<&Node> = cluster.iter().map(|&i| &graph.nodes[i]).collect();
        let merged = merged_node(&members, &taken);
        taken.insert(merged.id.clone());
        for member in &members {
            renamed.insert(member.id.as_str(), merged.id.clone());
        }
        absorbed.extend(cluster.iter().skip(1).copied());
        replacement.insert(cluster[0], merged);
    }

    let nodes: Vec<Node> = graph
        .nodes
        .iter()
        .enumerate()
        .filter(|(i, _)| !absorbed.contains(i))
        .map(|(i, node)| replacement.remove(&i).unwrap_or_else(|| node.clone()))
        .collect();

    let mut dropped_loops = 0;
    let mut edges = Vec::with_capacity(graph.edges.len());
    for edge in &graph.edges {
        let mut rewired = edge.clone();
        if let Some(id) = renamed.get(edge.source.as_str()) {
            rewired.source = id.clone();
        }
        if let Some(id) = renamed.get(edge.target.as_str()) {
            rewired.target = id.clone();
        }
        let new_loop = rewired.source == rewired.target && edge.source != edge.target;
        if new_loop && !config.keep_merge_self_loops {
            dropped_loops += 1;
            continue;
        }
        edges.push(rewired);
    }

    tracing::debug!(
        clusters = clusters.len(),
        nodes_absorbed = graph.nodes.len() - nodes.len(),
        dropped_loops,
        "Merged similar nodes"
    );

    Graph {
        nodes,
        edges,
        metadata: graph.metadata.clone(),
    }
}

/// Build the synthetic node that replaces a cluster.
fn merged_node(members: &[&Node], taken: &HashSet<String>) -> Node {
    let ids: Vec<&str> = members.iter().map(|n| n.id.as_str()).collect();
    let id = unique_id(ids.join("+"), |candidate| taken.contains(candidate));
    let label = members
        .iter()
        .map(|n| n.label.as_str())
        .collect::<Vec<_>>()
        .join(" + ");

    let dims = members[0].confidence.len();
    let confidence: Vec<f64> = (0..dims)
        .map(|d| {
            members.iter().map(|n| n.confidence[d]).sum::<f64>() / members.len() as f64
        })
        .collect();

    let tags: BTreeSet<String> = members
        .iter()
        .flat_map(|n| n.disciplinary_tags())
        .collect();

    let placed: Vec<Position> = members.iter().filter_map(|n| n.position).collect();
    let position = if placed.is_empty() {
        None
    } else {
        let count = placed.len() as f64;
        Some(Position {
            x: placed.iter().map(|p| p.x).sum::<f64>() / count,
            y: placed.iter().map(|p| p.y).sum::<f64>() / count,
        })
    };

    let mut node = Node {
        id,
        label,
        node_type: members[0].node_type,
        confidence,
        metadata: members[0].metadata.clone(),
        position,
    }
    .with_tags(tags);
    node.metadata.insert(
        "merged_node_ids".to_string(),
        Value::Array(absorbed_ids(members).into_iter().map(Value::String).collect()),
    );
    node
}

/// Original ids behind a cluster, in member order without duplicates.
///
/// A member that is itself a merge contributes its own absorbed ids.
fn absorbed_ids(members: &[&Node]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut absorbed = Vec::new();
    for member in members {
        let previous = member.merged_node_ids();
        let ids = if previous.is_empty() {
            vec![member.id.clone()]
        } else {
            previous
        };
        for id in ids {
            if seen.insert(id.clone()) {
                absorbed.push(id);
            }
        }
    }
    absorbed
}

// ============================================================================
// Refinement
// ============================================================================

/// Nudge positions toward the canvas center by PageRank, boost edges by
/// endpoint betweenness.
pub fn refine(graph: &Graph, config: &EngineConfig) -> Graph {
    let index = NodeIndex::new(graph);
    let adj = adjacency(graph, &index);
    let pr = pagerank(
        &adj,
        config.pagerank_damping,
        config.max_iterations,
        config.convergence_epsilon,
    );
    if !pr.converged {
        tracing::warn!(
            iterations = pr.iterations,
            "PageRank did not converge during refinement"
        );
    }
    let betweenness = betweenness_centrality(&adj);
    let center = config.canvas_center;

    let mut next = clone_graph(graph);
    for (i, node) in next.nodes.iter_mut().enumerate() {
        if let Some(pos) = node.position.as_mut() {
            let step = POSITION_STEP * pr.scores[i];
            pos.x += (center.x - pos.x) * step;
            pos.y += (center.y - pos.y) * step;
        }
    }
    for edge in &mut next.edges {
        let (Some(s), Some(t)) = (index.get(&edge.source), index.get(&edge.target)) else {
            continue;
        };
        let boost = EDGE_BOOST * (betweenness[s] + betweenness[t]) / 2.0;
        edge.confidence = (edge.confidence + boost).min(1.0);
    }
    next
}

// ============================================================================
// Tests
// ============================================================================
