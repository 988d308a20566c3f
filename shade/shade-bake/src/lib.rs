//! Weighted corner-normal baking over an evaluated modifier stack.
//!
//! The central stage of the pipeline: make the base mesh *shade* like the
//! evaluated result without touching its topology. The engine evaluates
//! the live stack, accumulates weighted face-normal contributions into the
//! base vertices they resolve to, and writes unit vectors back onto the
//! base mesh's corners.
//!
//! Weighting modes: face area, interior corner angle, their product, or
//! plain unweighted face normals. Scope restricts the transfer to faces
//! tagged as original surface (the bevel pipelines) or covers every face
//! (the plain bake).
//!
//! # Examples
//!
//! ```
//! use shade_types::unit_cube;
//! use shade_eval::ModifierStack;
//! use shade_bake::{bake_corner_normals, BakeParams, BakeScope, NormalWeighting};
//!
//! let mut cube = unit_cube();
//! let params = BakeParams::new()
//!     .with_weighting(NormalWeighting::FaceNormal)
//!     .with_scope(BakeScope::AllFaces);
//!
//! let outcome = bake_corner_normals(&mut cube, &ModifierStack::new(), &params)?;
//! assert_eq!(outcome.corners_written, 24);
//! assert!(cube.has_custom_normals());
//! # Ok::<(), shade_bake::BakeError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bake;
mod error;
mod params;
mod result;

pub use bake::bake_corner_normals;
pub use error::{BakeError, BakeResult};
pub use params::{BakeParams, BakeScope, NormalWeighting};
pub use result::BakeOutcome;
