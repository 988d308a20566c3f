//! Error types for edge and face detection.

use thiserror::Error;

/// Errors that can occur during detection.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Mesh has no vertices or faces.
    #[error("mesh is empty")]
    EmptyMesh,

    /// No edge matched the requested source, even after fallback.
    #[error("no edges matched the requested source")]
    NoEdgesDetected,

    /// The `FromModifier` source needs a bevel modifier in the stack.
    #[error("no bevel modifier in the stack")]
    NoBevelModifier,

    /// Area classification found no face that looks like bevel geometry.
    #[error("no bevel faces detected; adjust the detection ratio")]
    NoBevelFaces,
}

/// Result type for detection operations.
pub type DetectResult<T> = std::result::Result<T, DetectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            format!("{}", DetectError::NoEdgesDetected),
            "no edges matched the requested source"
        );
        assert!(format!("{}", DetectError::NoBevelFaces).contains("ratio"));
    }
}
