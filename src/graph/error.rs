//! Error taxonomy for the transition engine.
//!
//! Degenerate inputs (no nodes, no edges) are not errors, and neither is a
//! numerical routine hitting its iteration cap: both are reported through
//! result fields. Only structurally broken graphs and evidence surface here.

use thiserror::Error;

use super::models::TransitionKind;

/// Reason a graph failed [`validate`](super::validation::validate).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidGraph {
    #[error("duplicate node id `{0}`")]
    DuplicateNodeId(String),

    #[error("duplicate edge id `{0}`")]
    DuplicateEdgeId(String),

    #[error("node `{0}` has an empty confidence vector")]
    EmptyConfidence(String),

    #[error("node `{id}` has {found} confidence dimensions, expected {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        found: usize,
    },

    #[error("confidence {value} of `{owner}` is outside [0, 1]")]
    ConfidenceOutOfRange { owner: String, value: f64 },

    #[error("edge `{edge}` references unknown node `{node}`")]
    DanglingEdge { edge: String, node: String },

    #[error("metadata reports {reported} {what}, graph has {actual}")]
    CountMismatch {
        what: &'static str,
        reported: usize,
        actual: usize,
    },
}

/// Errors returned by the engine's public entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid graph: {0}")]
    InvalidGraph(#[from] InvalidGraph),

    #[error("invalid evidence node `{id}`: {reason}")]
    InvalidEvidence { id: String, reason: String },

    #[error("{kind} transition produced an invalid graph: {source}")]
    CorruptedOutput {
        kind: TransitionKind,
        #[source]
        source: InvalidGraph,
    },
}
