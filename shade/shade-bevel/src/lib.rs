//! Deterministic weighted-edge bevel with face correspondence tagging.
//!
//! This crate turns weighted edges into bevel geometry while keeping the
//! original surface identifiable:
//!
//! - [`tag_original_faces`] stamps every pre-bevel face so the original
//!   surface stays selectable after the topology changes
//! - [`bevel_mesh`] replaces each weighted edge with profile strips and
//!   fills the vertices where strips meet with patch polygons
//! - [`BevelOutcome::origin_vertex`] records, per output vertex, the input
//!   vertex it came from - the stable-identity contract the normal baking
//!   stage relies on
//!
//! Given identical input topology, weights, and parameters, the output
//! topology is reproducible run to run: faces, strips, and patches are
//! emitted in input index order, and winding is fixed against the adjacent
//! face normals.
//!
//! # Examples
//!
//! ```
//! use shade_types::unit_cube;
//! use shade_bevel::{bevel_mesh, tag_original_faces, BevelParams};
//!
//! let mut cube = unit_cube();
//! tag_original_faces(&mut cube)?;
//!
//! // Weight every edge and bevel with a 0.1 offset.
//! for edge in &mut cube.edges {
//!     edge.set_bevel_weight(1.0);
//! }
//! let outcome = bevel_mesh(&cube, &BevelParams::new().with_width(0.1))?;
//!
//! // 12 strips plus 8 corner patches.
//! assert_eq!(outcome.faces_created, 20);
//! assert_eq!(outcome.original_faces, 6);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bevel;
mod error;
mod params;
mod result;
mod tag;

pub use bevel::bevel_mesh;
pub use error::{BevelError, BevelResult, TagError, TagResult};
pub use params::{
    BevelAffect, BevelLimit, BevelParams, FaceStrengthMode, IntersectionKind, MiterInner,
    MiterOuter, WidthType,
};
pub use result::BevelOutcome;
pub use tag::{retag_all_faces, tag_original_faces};
