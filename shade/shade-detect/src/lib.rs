//! Seam edge classification and bevel weight writing.
//!
//! The first stage of the bake pipeline: decide which edges should become
//! bevel seams, then stamp weights (and optionally sharp/seam marks) onto
//! exactly those edges.
//!
//! - [`detect_edges`] classifies by existing marks, weights, or face-normal
//!   angle, with a deterministic 30 degree fallback
//! - [`detect_edges_with_stack`] additionally resolves the
//!   [`EdgeSource::FromModifier`] source against an existing bevel
//!   modifier's own limit method
//! - [`write_weights`] is the idempotent weight writer
//! - [`detect_bevel_faces`] recovers original/bevel face sets from
//!   untagged, already-beveled geometry by area classification
//!
//! # Examples
//!
//! ```
//! use shade_types::unit_cube;
//! use shade_detect::{detect_edges, write_weights, DetectParams, EdgeSource};
//!
//! let mut cube = unit_cube();
//!
//! // Nothing is weighted yet: the default source falls back to angle
//! // detection and finds all 12 sharp cube edges.
//! let params = DetectParams::new().with_mark_seam(true);
//! let selection = detect_edges(&cube, &params)?;
//! assert!(selection.fell_back);
//! assert_eq!(selection.len(), 12);
//!
//! let written = write_weights(&mut cube, &selection, &params);
//! assert_eq!(written, 12);
//! # Ok::<(), shade_detect::DetectError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod detect;
mod error;
mod faces;
mod params;

pub use detect::{detect_edges, detect_edges_with_stack, write_weights, EdgeSelection};
pub use error::{DetectError, DetectResult};
pub use faces::{detect_bevel_faces, FaceDetection};
pub use params::{DetectParams, EdgeSource, DEFAULT_ANGLE};
