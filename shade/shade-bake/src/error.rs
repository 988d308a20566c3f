//! Error types for normal baking.

use shade_eval::EvalError;
use thiserror::Error;

/// Errors that can occur during normal baking.
#[derive(Debug, Error)]
pub enum BakeError {
    /// The modifier stack could not be evaluated.
    #[error("modifier stack evaluation failed: {0}")]
    Evaluation(#[from] EvalError),

    /// No face qualifies for normal transfer, or no evaluated corner
    /// resolves back to a base vertex.
    #[error("no faces qualify for normal transfer")]
    EmptySelection,
}

/// Result type for bake operations.
pub type BakeResult<T> = std::result::Result<T, BakeError>;
