//! Detection parameters.

/// Default angle threshold for automatic detection: 30 degrees.
pub const DEFAULT_ANGLE: f64 = std::f64::consts::FRAC_PI_6;

/// Where seam edges come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EdgeSource {
    /// Edges already marked sharp.
    Sharp,

    /// Edges already marked as seams.
    Seam,

    /// Edges already carrying a positive bevel weight.
    #[default]
    Weighted,

    /// Edges implied by an existing bevel modifier's own limit method,
    /// inspected without executing it.
    FromModifier,

    /// Edges whose adjacent face normals differ by at least the angle
    /// threshold; boundary edges are always included.
    Angle,
}

/// Parameters for edge detection and weight writing.
///
/// # Example
///
/// ```
/// use shade_detect::{DetectParams, EdgeSource};
///
/// let params = DetectParams::new()
///     .with_source(EdgeSource::Sharp)
///     .with_mark_seam(true)
///     .with_fallback(false);
///
/// assert_eq!(params.source, EdgeSource::Sharp);
/// assert!(!params.fallback);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DetectParams {
    /// Where seam edges come from.
    pub source: EdgeSource,

    /// Angle threshold in radians for the `Angle` source and for fallback.
    pub angle_threshold: f64,

    /// Fall back to angle detection when the primary source is empty.
    pub fallback: bool,

    /// Weight written onto detected edges.
    pub weight: f32,

    /// Also mark detected edges sharp.
    pub mark_sharp: bool,

    /// Also mark detected edges as seams.
    pub mark_seam: bool,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            source: EdgeSource::default(),
            angle_threshold: DEFAULT_ANGLE,
            fallback: true,
            weight: 1.0,
            mark_sharp: false,
            mark_seam: false,
        }
    }
}

impl DetectParams {
    /// Create parameters with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the edge source.
    #[must_use]
    pub const fn with_source(mut self, source: EdgeSource) -> Self {
        self.source = source;
        self
    }

    /// Set the angle threshold in radians.
    #[must_use]
    pub const fn with_angle_threshold(mut self, radians: f64) -> Self {
        self.angle_threshold = radians;
        self
    }

    /// Enable or disable the angle fallback.
    #[must_use]
    pub const fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Set the weight written onto detected edges.
    #[must_use]
    pub const fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// Also mark detected edges sharp.
    #[must_use]
    pub const fn with_mark_sharp(mut self, mark: bool) -> Self {
        self.mark_sharp = mark;
        self
    }

    /// Also mark detected edges as seams.
    #[must_use]
    pub const fn with_mark_seam(mut self, mark: bool) -> Self {
        self.mark_seam = mark;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_params() {
        let params = DetectParams::default();
        assert_eq!(params.source, EdgeSource::Weighted);
        assert_relative_eq!(params.angle_threshold, DEFAULT_ANGLE);
        assert!(params.fallback);
        assert_relative_eq!(params.weight, 1.0);
    }

    #[test]
    fn default_angle_is_thirty_degrees() {
        assert_relative_eq!(DEFAULT_ANGLE.to_degrees(), 30.0, epsilon = 1e-10);
    }
}
