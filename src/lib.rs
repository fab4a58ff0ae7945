//! Knowledge Transition
//!
//! A deterministic engine for evolving research knowledge graphs:
//! - Typed, weighted graph values with invariant checking
//! - State transitions: evidence integration, pruning, merging, refinement
//! - Centrality, community structure and Laplacian spectrum on demand
//! - Information-theoretic change metrics for every transition
//!
//! The engine is synchronous and side-effect free. The `kgt` binary wraps it
//! for JSON files on disk.

pub mod config;
pub mod graph;

pub use config::Config;
pub use graph::{
    apply, validate, EngineConfig, EngineError, Graph, GraphTransitionEngine, InvalidGraph,
    TransitionEngine, TransitionKind,
};
