//! Polygon mesh with edge flags, face tags, and corner normals.

use hashbrown::{HashMap, HashSet};

use crate::connectivity::MeshConnectivity;
use crate::corner_normals::CornerNormals;
use crate::edge::{edge_key, Edge};
use crate::face::{Face, FaceTag};
use crate::polygon::{interior_angle, newell_normal, polygon_area, polygon_centroid, polygon_normal};
use crate::vertex::Vertex;
use crate::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A polygon mesh: vertices, faces, an explicit edge table, and a set of
/// baked corner normals.
///
/// # Structure
///
/// - `vertices`: positions, referenced by index
/// - `faces`: ordered corner lists with CCW winding viewed from outside,
///   each carrying a provenance tag
/// - `edges`: one entry per distinct face boundary segment, carrying
///   sharp/seam marks and the bevel weight
/// - `corner_normals`: custom split normals keyed by `(face, corner)`
///
/// # Invariants
///
/// Every boundary segment of every face has an entry in the edge table;
/// [`PolyMesh::rebuild_edges`] restores this after topology edits while
/// preserving the flags of surviving edges. Equality is structural and
/// bit-exact over geometry, tags, flags, and corner normals, so
/// snapshot/restore round-trips can be asserted directly.
///
/// # Example
///
/// ```
/// use shade_types::{Face, PolyMesh, Vertex};
///
/// let mesh = PolyMesh::from_parts(
///     vec![
///         Vertex::from_coords(0.0, 0.0, 0.0),
///         Vertex::from_coords(1.0, 0.0, 0.0),
///         Vertex::from_coords(0.0, 1.0, 0.0),
///     ],
///     vec![Face::tri(0, 1, 2)],
/// );
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.edge_count(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolyMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Polygon faces.
    pub faces: Vec<Face>,

    /// Edge table, one entry per distinct boundary segment.
    pub edges: Vec<Edge>,

    /// Baked custom split normals.
    pub corner_normals: CornerNormals,

    /// Whether the mesh is marked for smooth shading.
    pub smooth_shaded: bool,
}

impl PolyMesh {
    /// Create an empty mesh.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
            edges: Vec::new(),
            corner_normals: CornerNormals::new(),
            smooth_shaded: false,
        }
    }

    /// Create a mesh from vertices and faces, deriving the edge table.
    #[must_use]
    pub fn from_parts(vertices: Vec<Vertex>, faces: Vec<Face>) -> Self {
        let mut mesh = Self {
            vertices,
            faces,
            edges: Vec::new(),
            corner_normals: CornerNormals::new(),
            smooth_shaded: false,
        };
        mesh.rebuild_edges();
        mesh
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of edges.
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the mesh has no vertices or no faces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Position of a vertex.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds; callers index within
    /// `vertex_count()`.
    #[inline]
    #[must_use]
    pub fn position(&self, vertex: u32) -> Point3 {
        self.vertices[vertex as usize].position
    }

    /// Rebuild the edge table from the current face list.
    ///
    /// Edges are emitted in first-seen order while walking faces in index
    /// order, so the result is deterministic. Flags and weights of edges
    /// whose endpoints survive are preserved; new edges start unmarked.
    pub fn rebuild_edges(&mut self) {
        let old: HashMap<(u32, u32), Edge> =
            self.edges.iter().map(|edge| (edge.key(), *edge)).collect();

        let mut seen: HashSet<(u32, u32)> = HashSet::new();
        let mut edges = Vec::new();
        for face in &self.faces {
            for key in face.edge_keys() {
                if seen.insert(key) {
                    edges.push(old.get(&key).copied().unwrap_or(Edge::new(key.0, key.1)));
                }
            }
        }
        self.edges = edges;
    }

    /// Map from canonical edge key to edge-table index.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // edge counts fit u32 by design
    pub fn edge_lookup(&self) -> HashMap<(u32, u32), u32> {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, edge)| (edge.key(), i as u32))
            .collect()
    }

    /// Find the edge-table index for a vertex pair.
    #[must_use]
    pub fn edge_index(&self, a: u32, b: u32) -> Option<usize> {
        let key = edge_key(a, b);
        self.edges.iter().position(|edge| edge.key() == key)
    }

    /// Iterate over edges carrying a positive bevel weight.
    pub fn weighted_edges(&self) -> impl Iterator<Item = (usize, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.is_weighted())
    }

    /// Build connectivity lookups for the current face list.
    #[must_use]
    pub fn connectivity(&self) -> MeshConnectivity {
        MeshConnectivity::build(&self.faces)
    }

    /// Corner positions of a face.
    #[must_use]
    pub fn face_points(&self, face: usize) -> Vec<Point3> {
        self.faces[face]
            .vertices
            .iter()
            .map(|&v| self.position(v))
            .collect()
    }

    /// Unit normal of a face, `None` if degenerate.
    #[must_use]
    pub fn face_normal(&self, face: usize) -> Option<Vector3> {
        polygon_normal(&self.face_points(face))
    }

    /// Area of a face.
    #[must_use]
    pub fn face_area(&self, face: usize) -> f64 {
        polygon_area(&self.face_points(face))
    }

    /// Centroid of a face's corners.
    #[must_use]
    pub fn face_centroid(&self, face: usize) -> Point3 {
        polygon_centroid(&self.face_points(face))
    }

    /// Interior angle at a face corner.
    ///
    /// Returns `0` for out-of-bounds slots or degenerate corners.
    #[must_use]
    pub fn corner_angle(&self, face: usize, slot: usize) -> f64 {
        self.faces[face]
            .corner_neighborhood(slot)
            .map_or(0.0, |(prev, at, next)| {
                interior_angle(
                    &self.position(prev),
                    &self.position(at),
                    &self.position(next),
                )
            })
    }

    /// Angle between the normals of the two faces adjacent to an edge.
    ///
    /// Returns `None` for boundary edges, non-manifold edges, and edges
    /// whose adjacent faces are degenerate.
    #[must_use]
    pub fn edge_face_angle(&self, conn: &MeshConnectivity, a: u32, b: u32) -> Option<f64> {
        let faces = conn.faces_for_edge(a, b);
        if faces.len() != 2 {
            return None;
        }
        let n0 = self.face_normal(faces[0] as usize)?;
        let n1 = self.face_normal(faces[1] as usize)?;
        Some(n0.angle(&n1))
    }

    /// Area-weighted vertex normals.
    ///
    /// Vertices with no adjacent non-degenerate face get a zero vector.
    #[must_use]
    pub fn vertex_normals(&self) -> Vec<Vector3> {
        let mut normals = vec![Vector3::zeros(); self.vertices.len()];
        for face in &self.faces {
            let points: Vec<Point3> = face.vertices.iter().map(|&v| self.position(v)).collect();
            // Newell magnitude is 2x area, which is exactly the weight wanted.
            let weighted = newell_normal(&points);
            for &v in &face.vertices {
                normals[v as usize] += weighted;
            }
        }
        for normal in &mut normals {
            let len = normal.norm();
            if len > f64::EPSILON {
                *normal /= len;
            }
        }
        normals
    }

    /// Set a face's provenance tag.
    pub fn set_face_tag(&mut self, face: usize, tag: FaceTag) {
        self.faces[face].tag = tag;
    }

    /// Count faces carrying the given tag.
    #[must_use]
    pub fn tagged_face_count(&self, tag: FaceTag) -> usize {
        self.faces.iter().filter(|face| face.tag == tag).count()
    }

    /// Iterate over indices of faces carrying the given tag.
    #[allow(clippy::cast_possible_truncation)] // face counts fit u32 by design
    pub fn faces_with_tag(&self, tag: FaceTag) -> impl Iterator<Item = u32> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(move |(_, face)| face.tag == tag)
            .map(|(i, _)| i as u32)
    }

    /// Whether any corner carries a baked custom normal.
    #[must_use]
    pub fn has_custom_normals(&self) -> bool {
        self.corner_normals.has_any()
    }

    /// Remove every baked custom normal.
    pub fn clear_corner_normals(&mut self) {
        self.corner_normals.clear();
    }
}

/// A unit cube from `(0,0,0)` to `(1,1,1)` with six quad faces and
/// outward CCW winding.
///
/// The standard fixture for bevel and bake tests: 8 vertices, 6 faces,
/// 12 edges.
///
/// # Example
///
/// ```
/// use shade_types::unit_cube;
///
/// let cube = unit_cube();
/// assert_eq!(cube.vertex_count(), 8);
/// assert_eq!(cube.face_count(), 6);
/// assert_eq!(cube.edge_count(), 12);
/// ```
#[must_use]
pub fn unit_cube() -> PolyMesh {
    let vertices = vec![
        Vertex::from_coords(0.0, 0.0, 0.0), // 0
        Vertex::from_coords(1.0, 0.0, 0.0), // 1
        Vertex::from_coords(1.0, 1.0, 0.0), // 2
        Vertex::from_coords(0.0, 1.0, 0.0), // 3
        Vertex::from_coords(0.0, 0.0, 1.0), // 4
        Vertex::from_coords(1.0, 0.0, 1.0), // 5
        Vertex::from_coords(1.0, 1.0, 1.0), // 6
        Vertex::from_coords(0.0, 1.0, 1.0), // 7
    ];

    let faces = vec![
        Face::quad(0, 3, 2, 1), // bottom (z=0), normal -Z
        Face::quad(4, 5, 6, 7), // top (z=1), normal +Z
        Face::quad(0, 1, 5, 4), // front (y=0), normal -Y
        Face::quad(2, 3, 7, 6), // back (y=1), normal +Y
        Face::quad(0, 4, 7, 3), // left (x=0), normal -X
        Face::quad(1, 2, 6, 5), // right (x=1), normal +X
    ];

    PolyMesh::from_parts(vertices, faces)
}
