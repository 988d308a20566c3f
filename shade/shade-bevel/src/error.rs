//! Error types for tagging and bevel execution.

use thiserror::Error;

/// Errors from the face correspondence tagger.
#[derive(Debug, Error)]
pub enum TagError {
    /// Faces already carry a bevel tag from an earlier run.
    ///
    /// Beveling over stale tags would make the post-bevel original-face
    /// selection wrong; the caller must restore or retag explicitly first.
    #[error("{count} faces already carry a bevel tag from an earlier run")]
    StaleBevelTags {
        /// Number of faces with a stale bevel tag.
        count: usize,
    },
}

/// Result type for tagging operations.
pub type TagResult<T> = std::result::Result<T, TagError>;

/// Errors from bevel execution.
#[derive(Debug, Error)]
pub enum BevelError {
    /// Mesh has no vertices.
    #[error("mesh has no vertices")]
    EmptyMesh,

    /// Mesh has no faces.
    #[error("mesh has no faces")]
    NoFaces,

    /// Segment count must be at least 1.
    #[error("invalid segment count: 0 (must be >= 1)")]
    InvalidSegments,

    /// Width must be positive.
    #[error("invalid bevel width: {0} (must be > 0)")]
    InvalidWidth(f64),

    /// No edge satisfied the bevel limit.
    #[error("no weighted edges to bevel")]
    NoWeightedEdges,

    /// A selected edge has (near-)zero length.
    #[error("weighted edge ({a}, {b}) has zero length")]
    DegenerateEdge {
        /// First endpoint.
        a: u32,
        /// Second endpoint.
        b: u32,
    },

    /// The bevel would push geometry past an adjacent edge.
    #[error(
        "bevel along edge ({a}, {b}) overlaps adjacent geometry; \
         enable clamp_overlap or reduce the width"
    )]
    OverlappingGeometry {
        /// First endpoint of the overrun edge.
        a: u32,
        /// Second endpoint of the overrun edge.
        b: u32,
    },
}

/// Result type for bevel operations.
pub type BevelResult<T> = std::result::Result<T, BevelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TagError::StaleBevelTags { count: 3 };
        assert!(format!("{err}").contains('3'));

        let err = BevelError::OverlappingGeometry { a: 4, b: 7 };
        let text = format!("{err}");
        assert!(text.contains('4'));
        assert!(text.contains('7'));
        assert!(text.contains("clamp_overlap"));
    }
}
