//! Knowledge-graph data models.
//!
//! Defines the complete type system for the transition engine:
//!
//! ## Graph values
//! - [`NodeType`] / [`Node`]: typed knowledge nodes with a multi-dimensional belief vector
//! - [`EdgeType`] / [`Edge`]: typed, weighted relationships between nodes
//! - [`Graph`] / [`GraphMetadata`]: the ordered node/edge collections plus bookkeeping
//!
//! ## Analytics results
//! - [`CentralityMeasures`]: per-node centrality scores keyed by node id
//! - [`Community`] / [`CommunityDetection`]: modularity-based partition
//! - [`SpectralAnalysis`]: Laplacian spectrum and connectivity indicators
//! - [`StructuralSummary`]: cheap structural indicators stored in `metadata.graph_metrics`
//!
//! ## Transitions
//! - [`TransitionKind`], [`TransitionMetrics`], [`TransitionOutcome`]
//!
//! ## Configuration
//! - [`EngineConfig`]: tuning parameters, defaulting to the named constants below

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

use super::matrix::SquareMatrix;

/// Opaque key/value metadata attached to nodes and edges.
pub type Metadata = Map<String, Value>;

// ============================================================================
// Named constants
// ============================================================================

/// PageRank damping factor.
pub const PAGERANK_DAMPING: f64 = 0.85;
/// Hard iteration cap shared by every iterative routine.
pub const MAX_ITERATIONS: usize = 100;
/// Convergence epsilon for PageRank and eigenvector power iteration.
pub const CONVERGENCE_EPSILON: f64 = 1e-6;
/// Off-diagonal norm below which the Jacobi eigensolver stops.
pub const JACOBI_TOLERANCE: f64 = 1e-10;
/// Nodes whose mean confidence falls below this are pruned, as are weaker edges.
pub const PRUNE_THRESHOLD: f64 = 0.3;
/// Minimum pairwise similarity for two nodes to be merged.
pub const MERGE_THRESHOLD: f64 = 0.8;
/// Similarity an existing node must exceed to be linked to new evidence.
pub const EVIDENCE_LINK_THRESHOLD: f64 = 0.6;
/// Maximum number of supportive links created per evidence node.
pub const MAX_EVIDENCE_LINKS: usize = 3;
/// Similarity bonus for two nodes of the same type.
pub const SAME_TYPE_BONUS: f64 = 0.2;
/// Fraction of the way a node moves toward the canvas center during refinement.
pub const POSITION_STEP: f64 = 0.1;
/// Fraction of mean endpoint betweenness added to an edge during refinement.
pub const EDGE_BOOST: f64 = 0.1;
/// Fixed layout canvas center used by refinement.
pub const CANVAS_CENTER: Position = Position { x: 400.0, y: 300.0 };

/// Current graph schema version written into new graphs.
pub const GRAPH_VERSION: &str = "1.0.0";

// ============================================================================
// Nodes
// ============================================================================

/// Role of a node in the research graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Root,
    Dimension,
    Hypothesis,
    Evidence,
    Bridge,
    Gap,
    Synthesis,
    Reflection,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::Dimension => write!(f, "dimension"),
            Self::Hypothesis => write!(f, "hypothesis"),
            Self::Evidence => write!(f, "evidence"),
            Self::Bridge => write!(f, "bridge"),
            Self::Gap => write!(f, "gap"),
            Self::Synthesis => write!(f, "synthesis"),
            Self::Reflection => write!(f, "reflection"),
        }
    }
}

/// 2D layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A knowledge node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier within a graph
    pub id: String,
    /// Human-readable label
    pub label: String,
    /// Role of the node
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Multi-dimensional belief vector, each entry in [0, 1]
    pub confidence: Vec<f64>,
    /// Opaque metadata (disciplinary_tags, pruned, impact_score, ...)
    #[serde(default)]
    pub metadata: Metadata,
    /// Optional layout position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Node {
    /// Create a node with empty metadata and no position.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        node_type: NodeType,
        confidence: Vec<f64>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            node_type,
            confidence,
            metadata: Metadata::new(),
            position: None,
        }
    }

    /// Builder-style setter for `metadata.disciplinary_tags`.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<Value> = tags.into_iter().map(|t| Value::String(t.into())).collect();
        self.metadata
            .insert("disciplinary_tags".to_string(), Value::Array(tags));
        self
    }

    /// Builder-style setter for the layout position.
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position { x, y });
        self
    }

    /// Mean of the confidence vector (0.0 for an empty vector).
    pub fn mean_confidence(&self) -> f64 {
        if self.confidence.is_empty() {
            return 0.0;
        }
        self.confidence.iter().sum::<f64>() / self.confidence.len() as f64
    }

    /// The `disciplinary_tags` metadata entry as a set. Non-string entries are ignored.
    pub fn disciplinary_tags(&self) -> BTreeSet<String> {
        self.metadata
            .get("disciplinary_tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The `pruned` metadata flag (false when absent).
    pub fn is_pruned(&self) -> bool {
        self.metadata
            .get("pruned")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// The `impact_score` metadata entry, if present and numeric.
    pub fn impact_score(&self) -> Option<f64> {
        self.metadata.get("impact_score").and_then(Value::as_f64)
    }

    /// Ids of the nodes absorbed into this one by a merge, if any.
    pub fn merged_node_ids(&self) -> Vec<String> {
        self.metadata
            .get("merged_node_ids")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ============================================================================
// Edges
// ============================================================================

/// Semantics of a relationship between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Correlative,
    Supportive,
    Contradictory,
    Causal,
    Temporal,
    Prerequisite,
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Correlative => write!(f, "correlative"),
            Self::Supportive => write!(f, "supportive"),
            Self::Contradictory => write!(f, "contradictory"),
            Self::Causal => write!(f, "causal"),
            Self::Temporal => write!(f, "temporal"),
            Self::Prerequisite => write!(f, "prerequisite"),
        }
    }
}

/// A weighted relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier within a graph
    pub id: String,
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Relationship type
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    /// Edge confidence in [0, 1], used as the matrix weight
    pub confidence: f64,
    /// Whether the edge also applies target → source
    #[serde(default)]
    pub bidirectional: bool,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Edge {
    /// Create a directed edge with empty metadata.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        edge_type: EdgeType,
        confidence: f64,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            edge_type,
            confidence,
            bidirectional: false,
            metadata: Metadata::new(),
        }
    }

    /// Builder-style setter marking the edge bidirectional.
    pub fn bidirectional(mut self) -> Self {
        self.bidirectional = true;
        self
    }

    /// Whether this edge touches the given node id.
    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

// ============================================================================
// Graph
// ============================================================================

/// Bookkeeping carried alongside the nodes and edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub version: String,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// Pipeline stage that produced this graph
    #[serde(default)]
    pub stage: String,
    pub total_nodes: usize,
    pub total_edges: usize,
    /// Structural indicators refreshed after every transition
    #[serde(default)]
    pub graph_metrics: StructuralSummary,
}

impl Default for GraphMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            version: GRAPH_VERSION.to_string(),
            created: now,
            last_updated: now,
            stage: String::new(),
            total_nodes: 0,
            total_edges: 0,
            graph_metrics: StructuralSummary::default(),
        }
    }
}

/// A typed knowledge graph value.
///
/// Node and edge order is significant: it fixes the matrix index of every
/// node and therefore the iteration order of every analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub metadata: GraphMetadata,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            metadata: GraphMetadata::default(),
        }
    }

    /// Create a graph from nodes and edges, with metadata counts filled in.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut graph = Self {
            nodes,
            edges,
            metadata: GraphMetadata::default(),
        };
        graph.refresh_counts();
        graph
    }

    /// Builder-style setter for the pipeline stage.
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.metadata.stage = stage.into();
        self
    }

    /// Re-sync `total_nodes` / `total_edges` with the collections.
    pub fn refresh_counts(&mut self) {
        self.metadata.total_nodes = self.nodes.len();
        self.metadata.total_edges = self.edges.len();
    }

    /// Get a node by id (linear scan).
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Get an edge by id (linear scan).
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Confidence dimensionality of the graph, taken from the first node.
    pub fn confidence_dimension(&self) -> Option<usize> {
        self.nodes.first().map(|n| n.confidence.len())
    }

    /// Whether the graph has neither nodes nor edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Analytics results
// ============================================================================

/// Centrality scores for every node, keyed by node id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CentralityMeasures {
    /// Distinct neighbours / (n - 1)
    pub degree: HashMap<String, f64>,
    /// Normalised shortest-path betweenness
    pub betweenness: HashMap<String, f64>,
    /// Reachable nodes / sum of finite distances
    pub closeness: HashMap<String, f64>,
    /// PageRank scores (sum ≈ 1.0 for a non-empty graph)
    pub pagerank: HashMap<String, f64>,
    /// Absolute dominant-eigenvector components (L2 norm 1, or all zero)
    pub eigenvector: HashMap<String, f64>,
    pub pagerank_converged: bool,
    pub pagerank_iterations: usize,
    pub eigenvector_converged: bool,
    pub eigenvector_iterations: usize,
}

/// A group of nodes produced by community detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    /// Community identifier (contiguous from 0)
    pub id: u32,
    /// Member node ids, in graph order
    pub nodes: Vec<String>,
    /// This community's contribution to the global modularity Q
    pub modularity: f64,
    /// internal links / C(|nodes|, 2)
    pub internal_density: f64,
    /// links crossing the boundary / |nodes|
    pub external_connectivity: f64,
    /// Auto-generated label (dominant disciplinary tag or node type)
    pub label: String,
}

/// Result of a community detection run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunityDetection {
    pub communities: Vec<Community>,
    /// Global modularity Q of the final partition
    pub modularity: f64,
    /// Number of local-move passes performed
    pub passes: usize,
    /// False when the pass cap was hit while nodes were still moving
    pub converged: bool,
}

impl CommunityDetection {
    /// Community id of every node, keyed by node id.
    pub fn membership(&self) -> HashMap<String, u32> {
        self.communities
            .iter()
            .flat_map(|c| c.nodes.iter().map(move |id| (id.clone(), c.id)))
            .collect()
    }
}

/// Spectral properties of the (symmetrised) graph Laplacian.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectralAnalysis {
    /// Laplacian eigenvalues, ascending
    pub eigenvalues: Vec<f64>,
    /// Unit eigenvectors; `eigenvectors[k]` belongs to `eigenvalues[k]`
    pub eigenvectors: Vec<Vec<f64>>,
    /// The Laplacian that was decomposed
    pub laplacian: SquareMatrix,
    /// |edges| / C(n, 2)
    pub connectivity: f64,
    /// Second-smallest eigenvalue (Fiedler value)
    pub algebraic_connectivity: f64,
    /// Number of weakly connected components
    pub components: usize,
    /// False when the sweep cap was hit before the tolerance
    pub converged: bool,
    pub sweeps: usize,
}

/// Cheap structural indicators, stored in `GraphMetadata::graph_metrics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralSummary {
    /// |edges| / (n (n - 1)), directed density
    pub density: f64,
    /// Mean number of distinct neighbours per node
    pub average_degree: f64,
    /// Mean local clustering coefficient (undirected view)
    pub average_clustering: f64,
    pub weak_components: usize,
    pub strong_components: usize,
    /// Mean of all node mean confidences
    pub mean_confidence: f64,
    /// Shannon entropy of the pooled confidence values (bits)
    pub confidence_entropy: f64,
}

/// All on-demand queries bundled together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphAnalytics {
    pub centrality: CentralityMeasures,
    pub communities: CommunityDetection,
    pub spectral: SpectralAnalysis,
    pub summary: StructuralSummary,
    pub node_count: usize,
    pub edge_count: usize,
    /// Computation time in milliseconds
    pub computation_ms: u64,
}

// ============================================================================
// Transitions
// ============================================================================

/// Discrete state transition applied to a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    EvidenceIntegration,
    Pruning,
    Merging,
    Refinement,
}

impl TransitionKind {
    /// All kinds, in pipeline order.
    pub const ALL: [TransitionKind; 4] = [
        Self::EvidenceIntegration,
        Self::Pruning,
        Self::Merging,
        Self::Refinement,
    ];
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EvidenceIntegration => write!(f, "evidence_integration"),
            Self::Pruning => write!(f, "pruning"),
            Self::Merging => write!(f, "merging"),
            Self::Refinement => write!(f, "refinement"),
        }
    }
}

impl std::str::FromStr for TransitionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "evidence_integration" | "evidence" => Ok(Self::EvidenceIntegration),
            "pruning" | "prune" => Ok(Self::Pruning),
            "merging" | "merge" => Ok(Self::Merging),
            "refinement" | "refine" => Ok(Self::Refinement),
            other => Err(format!("unknown transition kind: {}", other)),
        }
    }
}

/// Change metrics between the graph before and after a transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionMetrics {
    pub nodes_added: usize,
    pub nodes_removed: usize,
    pub edges_added: usize,
    pub edges_removed: usize,
    /// (node-id symmetric difference + |Δ edge count|) / max(1, old nodes + old edges)
    pub topology_change: f64,
    /// entropy(new confidences) - entropy(old confidences), in bits
    pub information_gain: f64,
}

/// Result of applying one transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub graph: Graph,
    pub metrics: TransitionMetrics,
    /// Confidence in the transition, in [0, 1]
    pub confidence: f64,
}

// ============================================================================
// Configuration
// ============================================================================

/// Tuning parameters for the analytics and transition routines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// PageRank damping factor (default: 0.85)
    pub pagerank_damping: f64,
    /// Iteration cap for PageRank, eigenvector centrality and Louvain (default: 100)
    pub max_iterations: usize,
    /// Convergence epsilon for power iteration (default: 1e-6)
    pub convergence_epsilon: f64,
    /// Jacobi sweep cap (default: 100)
    pub jacobi_max_sweeps: usize,
    /// Jacobi off-diagonal tolerance (default: 1e-10)
    pub jacobi_tolerance: f64,
    /// Louvain resolution parameter (default: 1.0)
    pub louvain_resolution: f64,
    /// Pruning threshold for node mean confidence and edge confidence (default: 0.3)
    pub prune_threshold: f64,
    /// Merge similarity threshold (default: 0.8)
    pub merge_threshold: f64,
    /// Evidence linking similarity threshold (default: 0.6)
    pub evidence_link_threshold: f64,
    /// Maximum supportive links per evidence node (default: 3)
    pub max_evidence_links: usize,
    /// Keep self-loops created by merging two connected nodes (default: false)
    pub keep_merge_self_loops: bool,
    /// Canvas center used by refinement (default: 400, 300)
    pub canvas_center: Position,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pagerank_damping: PAGERANK_DAMPING,
            max_iterations: MAX_ITERATIONS,
            convergence_epsilon: CONVERGENCE_EPSILON,
            jacobi_max_sweeps: MAX_ITERATIONS,
            jacobi_tolerance: JACOBI_TOLERANCE,
            louvain_resolution: 1.0,
            prune_threshold: PRUNE_THRESHOLD,
            merge_threshold: MERGE_THRESHOLD,
            evidence_link_threshold: EVIDENCE_LINK_THRESHOLD,
            max_evidence_links: MAX_EVIDENCE_LINKS,
            keep_merge_self_loops: false,
            canvas_center: CANVAS_CENTER,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
