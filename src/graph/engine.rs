//! Transition engine: the single entry point for graph consumers.
//!
//! The `TransitionEngine` trait bundles the state transition with the three
//! read-only queries (centrality, communities, spectral) so that callers can
//! hold an `Arc<dyn TransitionEngine>` and swap in a different engine in
//! tests. Every entry point validates its input graph first.

use std::time::Instant;

use super::centrality::centrality_with;
use super::community::detect_communities_with;
use super::error::EngineError;
use super::matrix::{adjacency, NodeIndex};
use super::models::{
    CentralityMeasures, CommunityDetection, EngineConfig, Graph, GraphAnalytics, Node,
    SpectralAnalysis, TransitionKind, TransitionOutcome,
};
use super::spectral::spectral_with;
use super::summary::summarize;
use super::transition;
use super::validation::validate;

// ============================================================================
// Trait
// ============================================================================

/// Transition engine trait.
///
/// Implementations must not mutate the graphs they are given.
pub trait TransitionEngine: Send + Sync {
    /// Apply one transition and return the new graph with its change metrics.
    fn apply(
        &self,
        graph: &Graph,
        evidence: &[Node],
        kind: TransitionKind,
    ) -> Result<TransitionOutcome, EngineError>;

    /// All centrality measures, keyed by node id.
    fn centrality(&self, graph: &Graph) -> Result<CentralityMeasures, EngineError>;

    /// Louvain community partition.
    fn communities(&self, graph: &Graph) -> Result<CommunityDetection, EngineError>;

    /// Laplacian spectrum and connectivity.
    fn spectral(&self, graph: &Graph) -> Result<SpectralAnalysis, EngineError>;

    /// All three queries plus the structural summary, over one shared matrix.
    fn analyze(&self, graph: &Graph) -> Result<GraphAnalytics, EngineError>;
}

// ============================================================================
// Concrete implementation
// ============================================================================

/// Engine running the in-process algorithms with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct GraphTransitionEngine {
    config: EngineConfig,
}

impl GraphTransitionEngine {
    /// Create a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl TransitionEngine for GraphTransitionEngine {
    fn apply(
        &self,
        graph: &Graph,
        evidence: &[Node],
        kind: TransitionKind,
    ) -> Result<TransitionOutcome, EngineError> {
        let outcome = transition::apply(graph, evidence, kind, &self.config)?;
        tracing::info!(
            %kind,
            nodes = outcome.graph.nodes.len(),
            edges = outcome.graph.edges.len(),
            confidence = outcome.confidence,
            "Transition complete"
        );
        Ok(outcome)
    }

    fn centrality(&self, graph: &Graph) -> Result<CentralityMeasures, EngineError> {
        validate(graph)?;
        let index = NodeIndex::new(graph);
        let adj = adjacency(graph, &index);
        Ok(centrality_with(&index, &adj, &self.config))
    }

    fn communities(&self, graph: &Graph) -> Result<CommunityDetection, EngineError> {
        validate(graph)?;
        let index = NodeIndex::new(graph);
        let adj = adjacency(graph, &index);
        Ok(detect_communities_with(graph, &index, &adj, &self.config))
    }

    fn spectral(&self, graph: &Graph) -> Result<SpectralAnalysis, EngineError> {
        validate(graph)?;
        let index = NodeIndex::new(graph);
        let adj = adjacency(graph, &index);
        Ok(spectral_with(graph, &adj, &self.config))
    }

    fn analyze(&self, graph: &Graph) -> Result<GraphAnalytics, EngineError> {
        validate(graph)?;
        let start = Instant::now();

        let index = NodeIndex::new(graph);
        let adj = adjacency(graph, &index);
        let centrality = centrality_with(&index, &adj, &self.config);
        let communities = detect_communities_with(graph, &index, &adj, &self.config);
        let spectral = spectral_with(graph, &adj, &self.config);
        let summary = summarize(graph);

        let elapsed = start.elapsed();
        tracing::info!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            communities = communities.communities.len(),
            modularity = communities.modularity,
            algebraic_connectivity = spectral.algebraic_connectivity,
            elapsed_ms = elapsed.as_millis() as u64,
            "Graph analytics computed"
        );

        Ok(GraphAnalytics {
            centrality,
            communities,
            spectral,
            summary,
            node_count: graph.nodes.len(),
            edge_count: graph.edges.len(),
            computation_ms: elapsed.as_millis() as u64,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
