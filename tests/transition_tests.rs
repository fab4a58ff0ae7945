//! End-to-end tests of the transition engine through its public API.

use knowledge_transition::graph::centrality::compute_centrality;
use knowledge_transition::graph::community::detect_communities;
use knowledge_transition::graph::information::graph_entropy;
use knowledge_transition::graph::spectral::spectral;
use knowledge_transition::graph::transition::transition_metrics;
use knowledge_transition::graph::{
    Edge, EdgeType, EngineConfig, Graph, GraphTransitionEngine, Node, NodeType, TransitionEngine,
    TransitionKind,
};

fn node(id: &str, confidence: Vec<f64>) -> Node {
    Node::new(id, id.to_uppercase(), NodeType::Hypothesis, confidence)
}

fn edge(source: &str, target: &str, confidence: f64) -> Edge {
    Edge::new(
        format!("{}->{}", source, target),
        source,
        target,
        EdgeType::Causal,
        confidence,
    )
}

/// A small research graph: a root, two dimensions, three hypotheses.
fn research_graph() -> Graph {
    let nodes = vec![
        Node::new("root", "Question", NodeType::Root, vec![0.9, 0.9]).with_position(400.0, 50.0),
        Node::new("dim_bio", "Biology", NodeType::Dimension, vec![0.7, 0.8])
            .with_tags(["biology"])
            .with_position(200.0, 150.0),
        Node::new("dim_chem", "Chemistry", NodeType::Dimension, vec![0.6, 0.7])
            .with_tags(["chemistry"])
            .with_position(600.0, 150.0),
        Node::new("h1", "Enzyme pathway", NodeType::Hypothesis, vec![0.5, 0.6])
            .with_tags(["biology", "chemistry"])
            .with_position(150.0, 400.0),
        Node::new("h2", "Enzyme kinetics", NodeType::Hypothesis, vec![0.7, 0.4])
            .with_tags(["biology", "chemistry"])
            .with_position(300.0, 450.0),
        Node::new("h3", "Dead end", NodeType::Hypothesis, vec![0.1, 0.2])
            .with_tags(["geology"])
            .with_position(700.0, 500.0),
    ];
    let edges = vec![
        edge("root", "dim_bio", 0.9),
        edge("root", "dim_chem", 0.9),
        edge("dim_bio", "h1", 0.7),
        edge("dim_chem", "h2", 0.6),
        edge("h1", "h2", 0.5).bidirectional(),
        edge("dim_chem", "h3", 0.4),
        edge("h2", "h3", 0.2),
    ];
    Graph::from_parts(nodes, edges).with_stage("hypothesis_generation")
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_scenario_path_betweenness() {
    let g = Graph::from_parts(
        vec![
            node("a", vec![0.8]),
            node("b", vec![0.8]),
            node("c", vec![0.8]),
            node("d", vec![0.8]),
        ],
        vec![edge("a", "b", 0.8), edge("b", "c", 0.8), edge("c", "d", 0.8)],
    );
    let measures = compute_centrality(&g, &EngineConfig::default());
    let b = &measures.betweenness;

    assert_eq!(b["a"], 0.0);
    assert_eq!(b["d"], 0.0);
    assert!(b["b"] > b["a"] && b["b"] > b["d"]);
    assert!(b["c"] > b["a"] && b["c"] > b["d"]);
    assert!((b["b"] - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_scenario_pruning_removes_exactly_the_weak_node() {
    let g = Graph::from_parts(
        vec![
            node("keep1", vec![0.5, 0.5]),
            node("weak", vec![0.1, 0.1]),
            node("keep2", vec![0.6, 0.9]),
            node("keep3", vec![0.8, 0.7]),
        ],
        vec![
            edge("keep1", "weak", 0.9),
            edge("weak", "keep2", 0.9),
            edge("keep1", "keep2", 0.9),
            edge("keep2", "keep3", 0.8),
        ],
    );
    let engine = GraphTransitionEngine::default();
    let outcome = engine.apply(&g, &[], TransitionKind::Pruning).unwrap();

    assert!(outcome.graph.node("weak").is_none());
    assert_eq!(outcome.graph.nodes.len(), 3);
    assert_eq!(outcome.graph.edges.len(), 2);
    assert!(outcome.graph.edges.iter().all(|e| !e.touches("weak")));
    assert_eq!(outcome.metrics.nodes_removed, 1);
    assert_eq!(outcome.metrics.edges_removed, 2);
}

#[test]
fn test_scenario_merging_identical_tags_and_type() {
    let g = Graph::from_parts(
        vec![
            node("x", vec![0.2, 0.4, 1.0]).with_tags(["ecology", "genetics"]),
            node("y", vec![0.6, 0.8, 0.0]).with_tags(["genetics", "ecology"]),
        ],
        vec![],
    );
    let engine = GraphTransitionEngine::default();
    let outcome = engine.apply(&g, &[], TransitionKind::Merging).unwrap();

    assert_eq!(outcome.graph.nodes.len(), 1);
    let merged = &outcome.graph.nodes[0];
    let expected = [0.4, 0.6, 0.5];
    for (got, want) in merged.confidence.iter().zip(expected) {
        assert!((got - want).abs() < 1e-12);
    }
    assert_eq!(merged.merged_node_ids(), vec!["x", "y"]);
}

#[test]
fn test_scenario_empty_graph_everywhere() {
    let g = Graph::new();
    let config = EngineConfig::default();

    let centrality = compute_centrality(&g, &config);
    assert!(centrality.degree.is_empty());
    assert!(centrality.betweenness.is_empty());
    assert!(centrality.closeness.is_empty());
    assert!(centrality.pagerank.is_empty());
    assert!(centrality.eigenvector.is_empty());

    assert!(detect_communities(&g, &config).communities.is_empty());

    let analysis = spectral(&g, &config);
    assert!(analysis.eigenvalues.is_empty());
    assert_eq!(analysis.algebraic_connectivity, 0.0);

    let engine = GraphTransitionEngine::new(config);
    for kind in TransitionKind::ALL {
        let outcome = engine.apply(&g, &[], kind).unwrap();
        assert!(outcome.graph.nodes.is_empty());
        assert!(outcome.graph.edges.is_empty());
    }
}

#[test]
fn test_identity_has_zero_change() {
    let g = research_graph();
    let metrics = transition_metrics(&g, &g);
    assert_eq!(metrics.topology_change, 0.0);
    assert_eq!(metrics.information_gain, 0.0);
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn test_full_pipeline() {
    let engine = GraphTransitionEngine::default();
    let g = research_graph();

    let evidence = vec![
        Node::new("ev1", "Assay result", NodeType::Evidence, vec![0.8, 0.9])
            .with_tags(["biology", "chemistry"]),
        Node::new("ev2", "Unrelated", NodeType::Evidence, vec![0.6, 0.5]).with_tags(["music"]),
    ];
    let integrated = engine
        .apply(&g, &evidence, TransitionKind::EvidenceIntegration)
        .unwrap();
    // ev1 links to h1 and h2 (identical tags); ev2 links to nothing
    assert_eq!(integrated.graph.nodes.len(), 8);
    assert_eq!(integrated.metrics.edges_added, 2);
    assert!(integrated.graph.edges.iter().filter(|e| e.source == "ev1").count() == 2);

    let pruned = engine
        .apply(&integrated.graph, &[], TransitionKind::Pruning)
        .unwrap();
    assert!(pruned.graph.node("h3").is_none());
    assert!(pruned.graph.edges.iter().all(|e| e.confidence >= 0.3));

    let merged = engine
        .apply(&pruned.graph, &[], TransitionKind::Merging)
        .unwrap();
    // h1, h2 and ev1 share identical tags
    let combined = merged.graph.node("h1+h2+ev1").unwrap();
    assert_eq!(combined.merged_node_ids(), vec!["h1", "h2", "ev1"]);
    assert!(merged.graph.nodes.len() < pruned.graph.nodes.len());

    let refined = engine
        .apply(&merged.graph, &[], TransitionKind::Refinement)
        .unwrap();
    assert_eq!(refined.graph.nodes.len(), merged.graph.nodes.len());
    for (before, after) in merged.graph.nodes.iter().zip(&refined.graph.nodes) {
        let (Some(p0), Some(p1)) = (before.position, after.position) else {
            continue;
        };
        let d0 = ((p0.x - 400.0).powi(2) + (p0.y - 300.0).powi(2)).sqrt();
        let d1 = ((p1.x - 400.0).powi(2) + (p1.y - 300.0).powi(2)).sqrt();
        assert!(d1 <= d0 + 1e-9);
    }

    // Every stage carries fresh bookkeeping and an in-range confidence
    for outcome in [&integrated, &pruned, &merged, &refined] {
        assert_eq!(outcome.graph.metadata.total_nodes, outcome.graph.nodes.len());
        assert_eq!(outcome.graph.metadata.total_edges, outcome.graph.edges.len());
        assert_eq!(outcome.graph.metadata.stage, "hypothesis_generation");
        assert!((0.0..=1.0).contains(&outcome.confidence));
        assert!(
            (outcome.graph.metadata.graph_metrics.confidence_entropy
                - graph_entropy(&outcome.graph))
            .abs()
                < 1e-12
        );
    }
}

#[test]
fn test_graph_json_roundtrip_through_engine() {
    let json = serde_json::json!({
        "nodes": [
            {"id": "a", "label": "A", "type": "root", "confidence": [0.9]},
            {"id": "b", "label": "B", "type": "evidence", "confidence": [0.4],
             "metadata": {"disciplinary_tags": ["physics"], "impact_score": 0.3}},
        ],
        "edges": [
            {"id": "e1", "source": "a", "target": "b", "type": "supportive", "confidence": 0.7},
        ],
        "metadata": {
            "version": "1.0.0",
            "created": "2024-01-01T00:00:00Z",
            "last_updated": "2024-01-01T00:00:00Z",
            "total_nodes": 2,
            "total_edges": 1
        }
    });
    let g: Graph = serde_json::from_value(json).unwrap();
    assert_eq!(g.nodes[1].impact_score(), Some(0.3));

    let engine = GraphTransitionEngine::default();
    let analytics = engine.analyze(&g).unwrap();
    assert_eq!(analytics.node_count, 2);

    let outcome = engine.apply(&g, &[], TransitionKind::Refinement).unwrap();
    let back = serde_json::to_value(&outcome).unwrap();
    assert_eq!(back["graph"]["nodes"][0]["type"], "root");
    assert_eq!(back["graph"]["metadata"]["total_edges"], 1);
}

#[test]
fn test_count_mismatch_is_rejected() {
    let mut g = research_graph();
    g.metadata.total_nodes += 1;
    let engine = GraphTransitionEngine::default();
    assert!(engine.apply(&g, &[], TransitionKind::Refinement).is_err());
    assert!(engine.analyze(&g).is_err());
}
