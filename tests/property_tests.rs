//! Property-based tests for the transition engine.
//!
//! These tests verify invariants that should hold for any valid graph:
//! - Every transition returns a valid graph
//! - Pruning never grows a graph, merging never adds nodes
//! - Centrality scores stay normalised
//! - Communities partition the node set

use proptest::prelude::*;
use std::collections::HashSet;

use knowledge_transition::graph::centrality::compute_centrality;
use knowledge_transition::graph::community::detect_communities;
use knowledge_transition::graph::spectral::spectral;
use knowledge_transition::graph::transition::{apply, transition_metrics};
use knowledge_transition::graph::{
    validate, Edge, EdgeType, EngineConfig, Graph, Node, NodeType, TransitionKind,
};

const TYPES: [NodeType; 3] = [NodeType::Hypothesis, NodeType::Evidence, NodeType::Gap];
const TAGS: [&str; 4] = ["biology", "chemistry", "physics", "geology"];

type NodeSpec = (Vec<f64>, usize, Vec<usize>);
type EdgeSpec = (usize, usize, f64, bool);

fn build_graph(nodes: Vec<NodeSpec>, edges: Vec<EdgeSpec>) -> Graph {
    let n = nodes.len();
    let nodes = nodes
        .into_iter()
        .enumerate()
        .map(|(i, (confidence, ty, tags))| {
            Node::new(format!("n{}", i), format!("node {}", i), TYPES[ty], confidence)
                .with_tags(tags.into_iter().map(|t| TAGS[t]))
                .with_position(i as f64 * 50.0, 600.0 - i as f64 * 30.0)
        })
        .collect();
    let edges = if n == 0 {
        Vec::new()
    } else {
        edges
            .into_iter()
            .enumerate()
            .map(|(k, (s, t, confidence, bidirectional))| {
                let mut e = Edge::new(
                    format!("e{}", k),
                    format!("n{}", s % n),
                    format!("n{}", t % n),
                    EdgeType::Correlative,
                    confidence,
                );
                e.bidirectional = bidirectional;
                e
            })
            .collect()
    };
    Graph::from_parts(nodes, edges)
}

/// Generate arbitrary valid graphs with up to 8 nodes and 2-dimensional confidence
fn arb_graph() -> impl Strategy<Value = Graph> {
    let node = (
        prop::collection::vec(0.0f64..=1.0, 2),
        0usize..TYPES.len(),
        prop::collection::vec(0usize..TAGS.len(), 0..3),
    );
    let edge = (0usize..8, 0usize..8, 0.0f64..=1.0, any::<bool>());
    (
        prop::collection::vec(node, 0..8),
        prop::collection::vec(edge, 0..16),
    )
        .prop_map(|(nodes, edges)| build_graph(nodes, edges))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_transition_output_is_valid(g in arb_graph()) {
        let config = EngineConfig::default();
        let evidence = vec![
            Node::new("fresh", "fresh", NodeType::Evidence, vec![0.7, 0.7]).with_tags(["biology"]),
        ];
        for kind in TransitionKind::ALL {
            let outcome = apply(&g, &evidence, kind, &config);
            prop_assert!(outcome.is_ok(), "{} failed: {:?}", kind, outcome.err());
            let outcome = outcome.unwrap();
            prop_assert!(validate(&outcome.graph).is_ok());
            prop_assert!((0.0..=1.0).contains(&outcome.confidence));
        }
    }

    #[test]
    fn pruning_is_monotone(g in arb_graph()) {
        let outcome = apply(&g, &[], TransitionKind::Pruning, &EngineConfig::default()).unwrap();
        prop_assert!(outcome.graph.nodes.len() <= g.nodes.len());
        prop_assert!(outcome.graph.edges.len() <= g.edges.len());
        prop_assert!(outcome.graph.nodes.iter().all(|n| n.mean_confidence() >= 0.3));
    }

    #[test]
    fn merging_never_adds_nodes(g in arb_graph()) {
        let outcome = apply(&g, &[], TransitionKind::Merging, &EngineConfig::default()).unwrap();
        prop_assert!(outcome.graph.nodes.len() <= g.nodes.len());
        prop_assert!(outcome.graph.edges.len() <= g.edges.len());
    }

    #[test]
    fn centrality_scores_are_normalised(g in arb_graph()) {
        let measures = compute_centrality(&g, &EngineConfig::default());
        if !g.nodes.is_empty() {
            let mass: f64 = measures.pagerank.values().sum();
            prop_assert!((mass - 1.0).abs() < 1e-3, "pagerank mass {}", mass);
        }
        for v in measures.degree.values() {
            prop_assert!((0.0..=1.0).contains(v));
        }
        for v in measures.betweenness.values() {
            prop_assert!(*v >= 0.0 && *v <= 1.0 + 1e-9);
        }
        for v in measures.eigenvector.values() {
            prop_assert!(*v >= 0.0);
        }
    }

    #[test]
    fn communities_partition_nodes(g in arb_graph()) {
        let detection = detect_communities(&g, &EngineConfig::default());
        let mut seen = HashSet::new();
        for community in &detection.communities {
            for id in &community.nodes {
                prop_assert!(seen.insert(id.clone()), "{} in two communities", id);
            }
        }
        let all: HashSet<String> = g.nodes.iter().map(|n| n.id.clone()).collect();
        prop_assert_eq!(seen, all);
    }

    #[test]
    fn laplacian_spectrum_is_non_negative(g in arb_graph()) {
        let analysis = spectral(&g, &EngineConfig::default());
        prop_assert_eq!(analysis.eigenvalues.len(), g.nodes.len());
        for lambda in &analysis.eigenvalues {
            prop_assert!(*lambda > -1e-9, "negative eigenvalue {}", lambda);
        }
        prop_assert!(analysis.algebraic_connectivity >= 0.0);
    }

    #[test]
    fn identity_transition_metrics_are_zero(g in arb_graph()) {
        let metrics = transition_metrics(&g, &g);
        prop_assert_eq!(metrics.topology_change, 0.0);
        prop_assert_eq!(metrics.information_gain, 0.0);
    }
}
