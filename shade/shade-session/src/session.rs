//! The bake/restore pipeline over a single mesh.

use shade_bake::{bake_corner_normals, BakeParams};
use shade_bevel::{bevel_mesh, tag_original_faces, BevelParams};
use shade_detect::{
    detect_bevel_faces, detect_edges_with_stack, write_weights, DetectParams, EdgeSelection,
    EdgeSource,
};
use shade_eval::ModifierStack;
use shade_types::{FaceTag, PolyMesh};
use tracing::{debug, info, warn};

use crate::backup::BackupSlot;
use crate::error::{BackupError, SessionError, SessionResult};
use crate::state::SessionState;

/// Everything one bake invocation needs, constructed once and never
/// mutated mid-operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BakeRequest {
    /// Edge classification and weight writing.
    pub detect: DetectParams,

    /// Bevel execution. Ignored when the detect source is
    /// [`EdgeSource::FromModifier`]; the stack's own bevel parameters are
    /// applied (and the modifier consumed) instead.
    pub bevel: BevelParams,

    /// Normal baking.
    pub bake: BakeParams,
}

impl BakeRequest {
    /// Create a request with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the detection parameters.
    #[must_use]
    pub fn with_detect(mut self, detect: DetectParams) -> Self {
        self.detect = detect;
        self
    }

    /// Set the bevel parameters.
    #[must_use]
    pub fn with_bevel(mut self, bevel: BevelParams) -> Self {
        self.bevel = bevel;
        self
    }

    /// Set the bake parameters.
    #[must_use]
    pub fn with_bake(mut self, bake: BakeParams) -> Self {
        self.bake = bake;
        self
    }
}

/// Report of a completed bake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BakeReport {
    /// Edges the classifier selected.
    pub edges_detected: usize,
    /// Whether classification fell back to angle detection.
    pub fell_back: bool,
    /// Edges the bevel replaced (0 on a normals-only re-bake).
    pub edges_beveled: usize,
    /// Faces the bevel created (0 on a normals-only re-bake).
    pub faces_created: usize,
    /// Corners that received a baked normal.
    pub corners_written: usize,
    /// Vertices that fell back to the unweighted average.
    pub fallback_count: usize,
    /// Whether only the normal pass ran (valid post-bevel state reuse).
    pub normals_only: bool,
}

impl std::fmt::Display for BakeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.normals_only {
            write!(f, "Re-baked {} corner normals", self.corners_written)?;
        } else {
            write!(
                f,
                "Baked {} corner normals ({} edges beveled, {} bevel faces)",
                self.corners_written, self.edges_beveled, self.faces_created
            )?;
        }
        if self.fell_back {
            write!(f, ", edges from angle fallback")?;
        }
        Ok(())
    }
}

/// Report of a completed restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreReport {
    /// Vertex count of the restored mesh.
    pub vertices: usize,
    /// Face count of the restored mesh.
    pub faces: usize,
}

impl std::fmt::Display for RestoreReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Restored original mesh ({} vertices, {} faces)",
            self.vertices, self.faces
        )
    }
}

/// Report of a normals-only clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearReport {
    /// Corners whose baked normal was removed.
    pub corners_cleared: usize,
}

impl std::fmt::Display for ClearReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cleared {} corner normals", self.corners_cleared)
    }
}

/// Report of adopting already-beveled geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdoptReport {
    /// Faces classified as bevel geometry.
    pub bevel_faces: usize,
    /// Faces classified as original surface.
    pub original_faces: usize,
    /// Corners that received a baked normal.
    pub corners_written: usize,
}

impl std::fmt::Display for AdoptReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Detected {} bevel faces, baked normals onto {} originals ({} corners)",
            self.bevel_faces, self.original_faces, self.corners_written
        )
    }
}

/// A single mesh's bake/restore pipeline.
///
/// Owns the mesh, its live modifier stack, the backup slot, and the
/// lifecycle state. Operations run synchronously to completion, and
/// `&mut self` makes one in-flight operation per mesh a compile-time
/// property. Any failure mid-bake rolls the session back to exactly the
/// state observable before the call.
///
/// # Example
///
/// ```
/// use shade_types::unit_cube;
/// use shade_session::{BakeRequest, Session, SessionState};
///
/// let mut session = Session::new("crate", unit_cube());
///
/// // No weights exist, so classification falls back to angle detection,
/// // the twelve cube edges are beveled, and normals are baked back onto
/// // the six original faces.
/// let report = session.bake(&BakeRequest::new())?;
/// assert_eq!(session.state(), SessionState::Baked);
/// assert!(report.corners_written > 0);
///
/// session.restore()?;
/// assert_eq!(session.state(), SessionState::Clean);
/// assert_eq!(session.mesh(), &unit_cube());
/// # Ok::<(), shade_session::SessionError>(())
/// ```
#[derive(Debug)]
pub struct Session {
    name: String,
    mesh: PolyMesh,
    stack: ModifierStack,
    backup: BackupSlot,
    state: SessionState,
}

impl Session {
    /// Create a session around a mesh.
    #[must_use]
    pub fn new(name: impl Into<String>, mesh: PolyMesh) -> Self {
        Self {
            name: name.into(),
            mesh,
            stack: ModifierStack::new(),
            backup: BackupSlot::new(),
            state: SessionState::Clean,
        }
    }

    /// The session's mesh name, used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current mesh.
    #[must_use]
    pub const fn mesh(&self) -> &PolyMesh {
        &self.mesh
    }

    /// The lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The live modifier stack.
    #[must_use]
    pub const fn stack(&self) -> &ModifierStack {
        &self.stack
    }

    /// Mutable access to the live modifier stack.
    pub fn stack_mut(&mut self) -> &mut ModifierStack {
        &mut self.stack
    }

    /// Whether a backup snapshot exists.
    #[must_use]
    pub const fn has_backup(&self) -> bool {
        self.backup.has_backup()
    }

    /// Mark the mesh for smooth shading ahead of a bake.
    pub fn smooth_shade(&mut self) {
        self.mesh.smooth_shaded = true;
    }

    /// Read-only edge classification against the current mesh and stack.
    ///
    /// # Errors
    ///
    /// Propagates detection failures unchanged; they are user-actionable.
    pub fn detect_edges(&self, params: &DetectParams) -> SessionResult<EdgeSelection> {
        Ok(detect_edges_with_stack(&self.mesh, &self.stack, params)?)
    }

    /// Run the full bake pipeline: classify, weight, tag, snapshot, bevel,
    /// bake normals.
    ///
    /// Re-entrant: baking while already baked restores the working mesh
    /// from the retained snapshot and re-runs in full, without re-backing
    /// up. From a beveled-but-unbaked state with intact tags, only the
    /// normal pass re-runs.
    ///
    /// # Errors
    ///
    /// Detection failures surface unchanged. Every other failure rolls the
    /// session back to its pre-call state and surfaces as
    /// [`SessionError::Stage`].
    pub fn bake(&mut self, request: &BakeRequest) -> SessionResult<BakeReport> {
        if self.state == SessionState::BeveledUnbaked && self.has_post_bevel_tags() {
            return self.rebake_normals(request);
        }

        let previous_mesh = self.mesh.clone();
        let previous_stack = self.stack.clone();
        let previous_state = self.state;
        let fresh_snapshot = !self.backup.has_backup();

        match self.run_bake(request, fresh_snapshot) {
            Ok(report) => {
                self.state = SessionState::Baked;
                info!("mesh '{}': {report}", self.name);
                Ok(report)
            }
            Err(err) => {
                warn!("mesh '{}': bake rolled back: {err}", self.name);
                self.mesh = previous_mesh;
                self.stack = previous_stack;
                self.state = previous_state;
                if fresh_snapshot {
                    self.backup.discard();
                }
                Err(err)
            }
        }
    }

    fn run_bake(
        &mut self,
        request: &BakeRequest,
        fresh_snapshot: bool,
    ) -> SessionResult<BakeReport> {
        // A re-bake starts over from the retained snapshot.
        if self.state != SessionState::Clean {
            if let Some(snapshot) = self.backup.peek() {
                self.mesh = snapshot.clone();
            }
        }

        let selection = detect_edges_with_stack(&self.mesh, &self.stack, &request.detect)?;

        // When driven by an existing bevel modifier, its parameters win and
        // the entry is consumed by the commit.
        let (bevel_params, consumed) = if request.detect.source == EdgeSource::FromModifier {
            match self.stack.find_bevel() {
                Some((name, params)) => (params.clone(), Some(name.to_string())),
                None => return Err(shade_detect::DetectError::NoBevelModifier.into()),
            }
        } else {
            (request.bevel.clone(), None)
        };

        // Snapshot before the first mutation; an existing snapshot (from a
        // prior bake of this mesh) is reused, never overwritten.
        if fresh_snapshot {
            self.backup
                .snapshot(&self.mesh, false)
                .map_err(|e| SessionError::stage("backup", e))?;
        }

        write_weights(&mut self.mesh, &selection, &request.detect);
        tag_original_faces(&mut self.mesh).map_err(|e| SessionError::stage("tag", e))?;

        let outcome =
            bevel_mesh(&self.mesh, &bevel_params).map_err(|e| SessionError::stage("bevel", e))?;
        debug!("mesh '{}': {outcome}", self.name);
        // The commit: the sole irreversible step, guarded by the snapshot.
        self.mesh = outcome.mesh;
        if let Some(name) = consumed {
            self.stack.remove(&name);
        }

        let baked = bake_corner_normals(&mut self.mesh, &self.stack, &request.bake)
            .map_err(|e| SessionError::stage("bake", e))?;

        Ok(BakeReport {
            edges_detected: selection.len(),
            fell_back: selection.fell_back,
            edges_beveled: outcome.edges_beveled,
            faces_created: outcome.faces_created,
            corners_written: baked.corners_written,
            fallback_count: baked.fallback_count,
            normals_only: false,
        })
    }

    /// Re-run only the normal pass over intact post-bevel geometry.
    fn rebake_normals(&mut self, request: &BakeRequest) -> SessionResult<BakeReport> {
        let previous = self.mesh.corner_normals.clone();
        match bake_corner_normals(&mut self.mesh, &self.stack, &request.bake) {
            Ok(outcome) => {
                self.state = SessionState::Baked;
                let report = BakeReport {
                    edges_detected: 0,
                    fell_back: false,
                    edges_beveled: 0,
                    faces_created: 0,
                    corners_written: outcome.corners_written,
                    fallback_count: outcome.fallback_count,
                    normals_only: true,
                };
                info!("mesh '{}': {report}", self.name);
                Ok(report)
            }
            Err(err) => {
                warn!("mesh '{}': normal re-bake rolled back: {err}", self.name);
                self.mesh.corner_normals = previous;
                Err(SessionError::stage("bake", err))
            }
        }
    }

    fn has_post_bevel_tags(&self) -> bool {
        self.mesh.tagged_face_count(FaceTag::Original) > 0
            && self.mesh.tagged_face_count(FaceTag::Bevel) > 0
    }

    /// Replace the mesh with the backup snapshot, discarding the bevel and
    /// every baked normal.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoBackup`] when no snapshot exists.
    pub fn restore(&mut self) -> SessionResult<RestoreReport> {
        match self.backup.restore() {
            Ok(snapshot) => {
                self.mesh = snapshot;
                self.state = SessionState::Clean;
                let report = RestoreReport {
                    vertices: self.mesh.vertex_count(),
                    faces: self.mesh.face_count(),
                };
                info!("mesh '{}': {report}", self.name);
                Ok(report)
            }
            Err(BackupError::Empty | BackupError::AlreadyExists) => Err(SessionError::NoBackup),
        }
    }

    /// Clear baked normals without touching geometry or the backup.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] unless the session is baked.
    pub fn clear_normals(&mut self) -> SessionResult<ClearReport> {
        if self.state != SessionState::Baked {
            return Err(SessionError::InvalidState {
                operation: "clear normals",
                state: self.state,
            });
        }
        let corners_cleared = self.mesh.corner_normals.len();
        self.mesh.clear_corner_normals();
        self.state = SessionState::BeveledUnbaked;
        let report = ClearReport { corners_cleared };
        info!("mesh '{}': {report}", self.name);
        Ok(report)
    }

    /// Adopt already-beveled, untagged geometry: classify bevel faces by
    /// area, snapshot, tag, and bake - without running a bevel.
    ///
    /// # Errors
    ///
    /// Detection failures surface unchanged; other failures roll back.
    pub fn adopt_geometry(
        &mut self,
        ratio: f64,
        bake: &BakeParams,
    ) -> SessionResult<AdoptReport> {
        let previous_mesh = self.mesh.clone();
        let previous_state = self.state;
        let fresh_snapshot = !self.backup.has_backup();

        match self.run_adopt(ratio, bake, fresh_snapshot) {
            Ok(report) => {
                self.state = SessionState::Baked;
                info!("mesh '{}': {report}", self.name);
                Ok(report)
            }
            Err(err) => {
                warn!("mesh '{}': adopt rolled back: {err}", self.name);
                self.mesh = previous_mesh;
                self.state = previous_state;
                if fresh_snapshot {
                    self.backup.discard();
                }
                Err(err)
            }
        }
    }

    fn run_adopt(
        &mut self,
        ratio: f64,
        bake: &BakeParams,
        fresh_snapshot: bool,
    ) -> SessionResult<AdoptReport> {
        let detection = detect_bevel_faces(&self.mesh, ratio)?;

        if fresh_snapshot {
            self.backup
                .snapshot(&self.mesh, false)
                .map_err(|e| SessionError::stage("backup", e))?;
        }
        self.mesh.smooth_shaded = true;
        detection.apply_tags(&mut self.mesh);

        let baked = bake_corner_normals(&mut self.mesh, &self.stack, bake)
            .map_err(|e| SessionError::stage("bake", e))?;

        Ok(AdoptReport {
            bevel_faces: detection.bevel_faces.len(),
            original_faces: detection.original_faces.len(),
            corners_written: baked.corners_written,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use shade_bevel::{retag_all_faces, BevelLimit};
    use shade_eval::Modifier;
    use shade_types::unit_cube;

    fn request() -> BakeRequest {
        BakeRequest::new().with_bevel(BevelParams::new().with_width(0.1))
    }

    #[test]
    fn bake_restore_round_trip() {
        let original = unit_cube();
        let mut session = Session::new("cube", original.clone());

        let report = session.bake(&request()).expect("bake succeeds");
        assert_eq!(session.state(), SessionState::Baked);
        assert!(report.fell_back); // no weights existed
        assert_eq!(report.edges_beveled, 12);
        assert!(session.mesh().has_custom_normals());
        assert!(session.mesh().face_count() > 6);

        let restored = session.restore().expect("restore succeeds");
        assert_eq!(session.state(), SessionState::Clean);
        assert_eq!(restored.vertices, 8);
        assert_eq!(session.mesh(), &original);
        assert!(!session.mesh().has_custom_normals());
        assert!(!session.has_backup());
    }

    #[test]
    fn bake_is_idempotent() {
        let mut session = Session::new("cube", unit_cube());
        session.bake(&request()).expect("first bake");
        let first = session.mesh().clone();

        session.bake(&request()).expect("second bake");
        assert_eq!(session.mesh(), &first);
        assert_eq!(session.state(), SessionState::Baked);
    }

    #[test]
    fn rebake_reuses_backup() {
        let original = unit_cube();
        let mut session = Session::new("cube", original.clone());

        session.bake(&request()).expect("first bake");
        assert!(session.has_backup());
        session.bake(&request()).expect("second bake");
        assert!(session.has_backup());

        // The retained snapshot still restores the original.
        session.restore().expect("restore succeeds");
        assert_eq!(session.mesh(), &original);
    }

    #[test]
    fn clear_then_rebake_normals_only() {
        let mut session = Session::new("cube", unit_cube());
        session.bake(&request()).expect("bake");
        let beveled = session.mesh().clone();

        let cleared = session.clear_normals().expect("clear");
        assert!(cleared.corners_cleared > 0);
        assert_eq!(session.state(), SessionState::BeveledUnbaked);
        assert!(!session.mesh().has_custom_normals());

        let report = session.bake(&request()).expect("re-bake");
        assert!(report.normals_only);
        assert_eq!(report.edges_beveled, 0);
        assert_eq!(session.state(), SessionState::Baked);
        // Geometry untouched; normals identical to the first bake.
        assert_eq!(session.mesh(), &beveled);
    }

    #[test]
    fn failed_bake_contains_damage() {
        let original = unit_cube();
        let mut session = Session::new("cube", original.clone());

        // Overlapping width without clamp fails inside the bevel executor.
        let bad = BakeRequest::new().with_bevel(BevelParams::new().with_width(0.9));
        let err = session.bake(&bad).expect_err("bevel fails");
        assert!(matches!(err, SessionError::Stage { stage: "bevel", .. }));

        // No partial state: mesh, tags, weights, state, and backup are as
        // before the call.
        assert_eq!(session.mesh(), &original);
        assert_eq!(session.state(), SessionState::Clean);
        assert!(!session.has_backup());
    }

    #[test]
    fn failed_rebake_keeps_prior_bake_restorable() {
        let original = unit_cube();
        let mut session = Session::new("cube", original.clone());
        session.bake(&request()).expect("bake");
        let baked = session.mesh().clone();

        let bad = BakeRequest::new().with_bevel(BevelParams::new().with_width(0.9));
        session.bake(&bad).expect_err("re-bake fails");

        // Rolled back to the prior baked state with the backup intact.
        assert_eq!(session.state(), SessionState::Baked);
        assert_eq!(session.mesh(), &baked);
        assert!(session.has_backup());
        session.restore().expect("restore still works");
        assert_eq!(session.mesh(), &original);
    }

    #[test]
    fn restore_without_backup_is_surfaced() {
        let mut session = Session::new("cube", unit_cube());
        let err = session.restore().expect_err("no backup");
        assert!(matches!(err, SessionError::NoBackup));
    }

    #[test]
    fn clear_normals_needs_baked_state() {
        let mut session = Session::new("cube", unit_cube());
        let err = session.clear_normals().expect_err("not baked");
        assert!(matches!(err, SessionError::InvalidState { .. }));
    }

    #[test]
    fn detect_without_fallback_is_surfaced() {
        let mut session = Session::new("cube", unit_cube());
        let req = request().with_detect(DetectParams::new().with_fallback(false));
        let err = session.bake(&req).expect_err("nothing weighted");
        assert!(matches!(err, SessionError::Detect(_)));
        assert_eq!(session.state(), SessionState::Clean);
        assert!(!session.has_backup());
    }

    #[test]
    fn bake_from_existing_modifier_consumes_it() {
        let mut session = Session::new("cube", unit_cube());
        session.stack_mut().append(
            "bevel",
            Modifier::Bevel(
                BevelParams::new()
                    .with_width(0.1)
                    .with_limit(BevelLimit::Angle(std::f64::consts::FRAC_PI_4)),
            ),
        );

        let req = BakeRequest::new()
            .with_detect(DetectParams::new().with_source(EdgeSource::FromModifier));
        let report = session.bake(&req).expect("bake succeeds");

        assert_eq!(report.edges_beveled, 12);
        assert!(session.stack().find_bevel().is_none());
        assert_eq!(session.state(), SessionState::Baked);
    }

    #[test]
    fn adopt_existing_geometry() {
        // Bevel the top ring elsewhere, then hand the untagged result in.
        let mut cube = unit_cube();
        for (a, b) in [(4, 5), (5, 6), (6, 7), (4, 7)] {
            let idx = cube.edge_index(a, b).unwrap();
            cube.edges[idx].set_bevel_weight(1.0);
        }
        let mut beveled = bevel_mesh(&cube, &BevelParams::new().with_width(0.1))
            .expect("bevel")
            .mesh;
        retag_all_faces(&mut beveled); // simulate an import with no tags
        let imported = beveled.clone();

        let mut session = Session::new("imported", beveled);
        let report = session
            .adopt_geometry(0.5, &BakeParams::new())
            .expect("adopt succeeds");

        assert_eq!(report.bevel_faces, 4);
        assert_eq!(report.original_faces, 6);
        assert!(report.corners_written > 0);
        assert_eq!(session.state(), SessionState::Baked);
        assert!(session.mesh().smooth_shaded);

        session.restore().expect("restore");
        assert_eq!(session.mesh(), &imported);
    }

    #[test]
    fn smooth_shade_marks_mesh() {
        let mut session = Session::new("cube", unit_cube());
        assert!(!session.mesh().smooth_shaded);
        session.smooth_shade();
        assert!(session.mesh().smooth_shaded);
    }

    #[test]
    fn detect_query_is_read_only() {
        let session = Session::new("cube", unit_cube());
        let selection = session
            .detect_edges(&DetectParams::new())
            .expect("detects via fallback");
        assert_eq!(selection.len(), 12);
        assert_eq!(session.state(), SessionState::Clean);
    }
}
