//! Corner-normal baking toolkit for non-destructive bevels.
//!
//! This umbrella crate re-exports the shade-* crates, providing a unified
//! API for the whole pipeline: classify seam edges on a base mesh, bevel
//! them deterministically, and bake weighted per-corner normals back onto
//! the original faces so the unmodified base mesh shades as if the bevel
//! were permanent.
//!
//! # Quick Start
//!
//! ```
//! use shade::prelude::*;
//!
//! // A cube with nothing marked: classification falls back to angle
//! // detection and finds the twelve sharp edges.
//! let mut session = Session::new("crate", unit_cube());
//! let report = session.bake(&BakeRequest::new())?;
//! println!("{report}");
//!
//! // The baked normals live per corner on the mesh.
//! assert!(session.mesh().has_custom_normals());
//!
//! // One call puts the original back, bit-exact.
//! session.restore()?;
//! assert_eq!(session.mesh(), &unit_cube());
//! # Ok::<(), shade::session::SessionError>(())
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - `PolyMesh`, `Edge`, `Face`, `CornerNormals`, connectivity
//! - [`detect`] - edge classification, weight writing, bevel-face detection
//! - [`bevel`] - face tagging and the deterministic bevel executor
//! - [`eval`] - modifier stack and evaluation with origin correspondence
//! - [`bake`] - the weighted corner-normal baking engine
//! - [`session`] - backup slots and the bake/restore state machine

// Safety: Deny unwrap/expect in library code. Tests may use them.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

/// Core data structures: `PolyMesh`, `Edge`, `Face`, `CornerNormals`.
pub use shade_types as types;

/// Edge classification, weight writing, bevel-face detection.
pub use shade_detect as detect;

/// Face tagging and the deterministic bevel executor.
pub use shade_bevel as bevel;

/// Modifier stack and evaluation with origin correspondence.
pub use shade_eval as eval;

/// Weighted corner-normal baking.
pub use shade_bake as bake;

/// Backup slots and the bake/restore state machine.
pub use shade_session as session;

/// The most commonly used types, in one import.
pub mod prelude {
    pub use shade_bake::{BakeParams, BakeScope, NormalWeighting};
    pub use shade_bevel::{BevelAffect, BevelLimit, BevelParams, WidthType};
    pub use shade_detect::{DetectParams, EdgeSource};
    pub use shade_eval::{Modifier, ModifierStack};
    pub use shade_session::{BakeRequest, Session, SessionState};
    pub use shade_types::{
        unit_cube, CornerNormals, Edge, Face, FaceTag, MeshConnectivity, Point3, PolyMesh,
        Vector3, Vertex,
    };
}
