//! Error types for waterline extraction.

use thiserror::Error;

/// Structural degeneracies detected while building or traversing the
/// weave. These are fatal for the current run; the caller may retry
/// with a perturbed Z.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WeaveError {
    /// A face walk did not return to its starting half-edge within the
    /// directed-edge budget.
    #[error("face traversal failed to close a loop after {steps} edges")]
    OpenLoop {
        /// Number of edges walked before giving up.
        steps: usize,
    },
    /// A face walk stepped onto a half-edge that was already consumed
    /// by an earlier loop.
    #[error("face traversal revisited a half-edge at vertex {vertex}")]
    EdgeRevisited {
        /// Arena id of the vertex where the revisit happened.
        vertex: u32,
    },
}

/// Errors from a waterline run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WaterlineError {
    /// The input surface has no triangles.
    #[error("mesh is empty")]
    EmptyMesh,
    /// The sampling distance must be positive.
    #[error("invalid sampling distance: {0}")]
    InvalidSampling(f64),
    /// Weave construction or traversal failed.
    #[error(transparent)]
    Weave(#[from] WeaveError),
}

/// Result type for waterline operations.
pub type Result<T> = std::result::Result<T, WaterlineError>;
