//! Knowledge-graph transition and analytics engine.
//!
//! Evolves a weighted, typed knowledge graph through discrete transitions
//! and computes the structural analytics used to steer that evolution.
//! Everything operates on in-memory [`Graph`] values: inputs are never
//! mutated, every transition returns a new graph.
//!
//! ## Architecture
//!
//! ```text
//! Graph ──► validation ──► NodeIndex + adjacency matrix
//!                                   │
//!              ┌──────────┬─────────┼──────────┐
//!            paths   centrality  community  spectral
//!              └──────────┴─────────┼──────────┘
//!                                   │
//!                transition ──► new Graph + TransitionMetrics
//!                                   │
//!                     TransitionEngine (entry point)
//! ```
//!
//! ## Modules
//!
//! - [`models`]: Graph values, result types, `EngineConfig`, named constants
//! - [`validation`]: Invariant checks and structural clone
//! - [`information`]: Entropy, KL divergence, mutual information
//! - [`matrix`]: `NodeIndex`, adjacency and Laplacian matrices
//! - [`paths`]: All shortest paths (BFS) and Dijkstra distances
//! - [`centrality`]: Degree, betweenness, closeness, PageRank, eigenvector
//! - [`community`]: Single-level Louvain
//! - [`spectral`]: Jacobi eigensolver, algebraic connectivity
//! - [`summary`]: Structural summary stored in graph metadata
//! - [`transition`]: Evidence integration, pruning, merging, refinement
//! - [`engine`]: `TransitionEngine` trait and `GraphTransitionEngine`
//! - [`error`]: `InvalidGraph` and `EngineError`

pub mod centrality;
pub mod community;
pub mod engine;
pub mod error;
pub mod information;
pub mod matrix;
pub mod models;
pub mod paths;
pub mod spectral;
pub mod summary;
pub mod transition;
pub mod validation;

// Re-export primary types for convenience
pub use engine::{GraphTransitionEngine, TransitionEngine};
pub use error::{EngineError, InvalidGraph};
pub use models::{
    CentralityMeasures, Community, CommunityDetection, Edge, EdgeType, EngineConfig, Graph,
    GraphAnalytics, GraphMetadata, Metadata, Node, NodeType, Position, SpectralAnalysis,
    StructuralSummary, TransitionKind, TransitionMetrics, TransitionOutcome,
};
pub use transition::apply;
pub use validation::{clone_graph, validate};
