//! Bake parameters.

/// Per-corner contribution weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NormalWeighting {
    /// Weight by polygon area.
    FaceArea,

    /// Weight by the interior angle at the corner.
    CornerAngle,

    /// Weight by area times corner angle.
    #[default]
    Combined,

    /// Unweighted: every corner contributes its face normal equally.
    FaceNormal,
}

/// Which faces receive baked normals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BakeScope {
    /// Only faces tagged as original surface - the bevel pipelines.
    #[default]
    OriginalFaces,

    /// Every face - the plain bake pipeline.
    AllFaces,
}

/// Parameters for a normal bake.
///
/// # Example
///
/// ```
/// use shade_bake::{BakeParams, BakeScope, NormalWeighting};
///
/// let params = BakeParams::new()
///     .with_weighting(NormalWeighting::FaceArea)
///     .with_scope(BakeScope::AllFaces);
///
/// assert_eq!(params.weighting, NormalWeighting::FaceArea);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BakeParams {
    /// Per-corner contribution weighting.
    pub weighting: NormalWeighting,

    /// Which faces receive baked normals.
    pub scope: BakeScope,
}

impl BakeParams {
    /// Create parameters with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the weighting mode.
    #[must_use]
    pub const fn with_weighting(mut self, weighting: NormalWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Set the bake scope.
    #[must_use]
    pub const fn with_scope(mut self, scope: BakeScope) -> Self {
        self.scope = scope;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = BakeParams::default();
        assert_eq!(params.weighting, NormalWeighting::Combined);
        assert_eq!(params.scope, BakeScope::OriginalFaces);
    }

    #[test]
    fn builder() {
        let params = BakeParams::new()
            .with_weighting(NormalWeighting::FaceNormal)
            .with_scope(BakeScope::AllFaces);
        assert_eq!(params.weighting, NormalWeighting::FaceNormal);
        assert_eq!(params.scope, BakeScope::AllFaces);
    }
}
