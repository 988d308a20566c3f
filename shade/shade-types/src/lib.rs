//! Foundation types for the splitshade pipeline.
//!
//! This crate provides the polygon mesh store the rest of the workspace
//! operates on:
//!
//! - [`PolyMesh`] - vertices, polygon faces, an explicit edge table, and
//!   baked corner normals
//! - [`Edge`] - unordered vertex pair with sharp/seam marks and a bevel
//!   weight in `[0, 1]`
//! - [`Face`] / [`FaceTag`] - ordered corner list with a provenance tag
//!   that keeps original and bevel-created faces distinguishable
//! - [`CornerNormals`] - custom split normals keyed by `(face, corner)`
//! - [`MeshConnectivity`] - edge/vertex adjacency and manifold queries
//! - polygon math: [`polygon_normal`], [`polygon_area`], [`interior_angle`]
//!
//! # Example
//!
//! ```
//! use shade_types::{unit_cube, FaceTag};
//!
//! let mut cube = unit_cube();
//! assert_eq!(cube.edge_count(), 12);
//!
//! // Weight an edge for beveling and mirror a seam mark.
//! let idx = cube.edge_index(0, 1).unwrap();
//! cube.edges[idx].set_bevel_weight(1.0);
//! cube.edges[idx].seam = true;
//!
//! assert_eq!(cube.weighted_edges().count(), 1);
//! assert_eq!(cube.tagged_face_count(FaceTag::Original), 6);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod connectivity;
mod corner_normals;
mod edge;
mod face;
mod mesh;
mod polygon;
mod vertex;

pub use connectivity::MeshConnectivity;
pub use corner_normals::CornerNormals;
pub use edge::{edge_key, Edge};
pub use face::{Face, FaceStrength, FaceTag};
pub use mesh::{unit_cube, PolyMesh};
pub use polygon::{
    interior_angle, newell_normal, polygon_area, polygon_centroid, polygon_normal,
};
pub use vertex::Vertex;

/// 3D point with `f64` precision, the workspace-wide coordinate type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector with `f64` precision, the workspace-wide direction type.
pub type Vector3 = nalgebra::Vector3<f64>;
