//! Result type for normal baking.

use crate::params::{BakeScope, NormalWeighting};

/// Result of a normal bake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BakeOutcome {
    /// Corners that received a baked normal.
    pub corners_written: usize,

    /// Base vertices that accumulated at least one contribution.
    pub vertices_resolved: usize,

    /// Vertices whose weighted accumulation cancelled to near zero and
    /// fell back to the unweighted face-normal average.
    pub fallback_count: usize,

    /// Weighting mode used.
    pub weighting: NormalWeighting,

    /// Scope used.
    pub scope: BakeScope,
}

impl std::fmt::Display for BakeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Baked {} corner normals over {} vertices ({:?}, {:?})",
            self.corners_written, self.vertices_resolved, self.weighting, self.scope
        )?;
        if self.fallback_count > 0 {
            write!(f, ", {} degenerate fallbacks", self.fallback_count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_fallbacks_only_when_present() {
        let outcome = BakeOutcome {
            corners_written: 24,
            vertices_resolved: 8,
            fallback_count: 0,
            weighting: NormalWeighting::Combined,
            scope: BakeScope::OriginalFaces,
        };
        let text = format!("{outcome}");
        assert!(text.contains("24 corner normals"));
        assert!(!text.contains("fallback"));

        let with_fallback = BakeOutcome {
            fallback_count: 2,
            ..outcome
        };
        assert!(format!("{with_fallback}").contains("2 degenerate fallbacks"));
    }
}
