//! Error types for stack evaluation.

use shade_bevel::BevelError;
use thiserror::Error;

/// Errors that can occur while evaluating or applying modifiers.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The base mesh has no vertices or faces.
    #[error("mesh is empty")]
    EmptyMesh,

    /// No modifier with the given name exists in the stack.
    #[error("modifier '{name}' not found")]
    UnknownModifier {
        /// The missing modifier name.
        name: String,
    },

    /// A modifier failed to evaluate.
    #[error("modifier '{name}' failed: {source}")]
    ModifierFailed {
        /// Name of the failing modifier.
        name: String,
        /// The underlying failure.
        #[source]
        source: BevelError,
    },
}

/// Result type for evaluation operations.
pub type EvalResult<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EvalError::UnknownModifier {
            name: "chamfer".into(),
        };
        assert!(format!("{err}").contains("chamfer"));

        let err = EvalError::ModifierFailed {
            name: "bevel".into(),
            source: BevelError::EmptyMesh,
        };
        let text = format!("{err}");
        assert!(text.contains("bevel"));
        assert!(text.contains("no vertices"));
    }
}
