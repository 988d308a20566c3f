//! Mesh connectivity lookups.
//!
//! Provides efficient edge-to-face and vertex-to-face relationships for
//! polygon meshes, plus boundary and manifold queries.

use hashbrown::HashMap;

use crate::edge::edge_key;
use crate::face::Face;

/// Connectivity information built from a face list.
///
/// Provides lookups for:
/// - Faces adjacent to an edge
/// - Faces adjacent to a vertex
/// - Boundary edges (edges with exactly one adjacent face)
/// - Non-manifold edges (edges with more than two adjacent faces)
///
/// Face index lists are in ascending order because faces are visited in
/// index order during construction.
#[derive(Debug, Clone)]
pub struct MeshConnectivity {
    /// Maps canonical edge `(lo, hi)` to adjacent face indices.
    edge_to_faces: HashMap<(u32, u32), Vec<u32>>,
    /// Maps vertex index to adjacent face indices.
    vertex_to_faces: HashMap<u32, Vec<u32>>,
}

impl MeshConnectivity {
    /// Build connectivity from a face list.
    ///
    /// # Example
    ///
    /// ```
    /// use shade_types::{Face, MeshConnectivity};
    ///
    /// let faces = vec![Face::tri(0, 1, 2), Face::tri(1, 3, 2)];
    /// let conn = MeshConnectivity::build(&faces);
    ///
    /// assert_eq!(conn.boundary_edge_count(), 4);
    /// assert_eq!(conn.faces_for_edge(1, 2), &[0, 1]);
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // face counts fit u32 by design
    pub fn build(faces: &[Face]) -> Self {
        let mut edge_to_faces: HashMap<(u32, u32), Vec<u32>> = HashMap::new();
        let mut vertex_to_faces: HashMap<u32, Vec<u32>> = HashMap::new();

        for (face_idx, face) in faces.iter().enumerate() {
            let face_idx = face_idx as u32;
            for &v in &face.vertices {
                vertex_to_faces.entry(v).or_default().push(face_idx);
            }
            for key in face.edge_keys() {
                edge_to_faces.entry(key).or_default().push(face_idx);
            }
        }

        Self {
            edge_to_faces,
            vertex_to_faces,
        }
    }

    /// Faces adjacent to an edge, in ascending index order.
    ///
    /// Returns an empty slice if the edge does not border any face.
    #[must_use]
    pub fn faces_for_edge(&self, a: u32, b: u32) -> &[u32] {
        self.edge_to_faces
            .get(&edge_key(a, b))
            .map_or(&[], Vec::as_slice)
    }

    /// Faces adjacent to a vertex, in ascending index order.
    #[must_use]
    pub fn faces_for_vertex(&self, v: u32) -> &[u32] {
        self.vertex_to_faces.get(&v).map_or(&[], Vec::as_slice)
    }

    /// Iterate over all boundary edges (exactly one adjacent face).
    pub fn boundary_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.edge_to_faces
            .iter()
            .filter(|(_, faces)| faces.len() == 1)
            .map(|(&edge, _)| edge)
    }

    /// Count the boundary edges.
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() == 1)
            .count()
    }

    /// Iterate over all non-manifold edges (more than two adjacent faces).
    pub fn non_manifold_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.edge_to_faces
            .iter()
            .filter(|(_, faces)| faces.len() > 2)
            .map(|(&edge, _)| edge)
    }

    /// Count the non-manifold edges.
    #[must_use]
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() > 2)
            .count()
    }

    /// Whether every edge has at most two adjacent faces.
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() <= 2)
    }

    /// Total number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_to_faces.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> Vec<Face> {
        vec![Face::tri(0, 1, 2), Face::tri(1, 3, 2)]
    }

    #[test]
    fn shared_edge_has_two_faces() {
        let conn = MeshConnectivity::build(&two_triangles());
        assert_eq!(conn.faces_for_edge(1, 2), &[0, 1]);
        assert_eq!(conn.faces_for_edge(2, 1), &[0, 1]);
        assert_eq!(conn.faces_for_edge(0, 1), &[0]);
    }

    #[test]
    fn vertex_fan_membership() {
        let conn = MeshConnectivity::build(&two_triangles());
        assert_eq!(conn.faces_for_vertex(1), &[0, 1]);
        assert_eq!(conn.faces_for_vertex(0), &[0]);
        assert!(conn.faces_for_vertex(9).is_empty());
    }

    #[test]
    fn boundary_and_manifold() {
        let conn = MeshConnectivity::build(&two_triangles());
        assert_eq!(conn.boundary_edge_count(), 4);
        assert_eq!(conn.edge_count(), 5);
        assert!(conn.is_manifold());
        assert_eq!(conn.non_manifold_edge_count(), 0);
    }

    #[test]
    fn non_manifold_detection() {
        // Edge (0, 1) shared by three faces.
        let faces = vec![Face::tri(0, 1, 2), Face::tri(0, 1, 3), Face::tri(0, 1, 4)];
        let conn = MeshConnectivity::build(&faces);
        assert_eq!(conn.non_manifold_edge_count(), 1);
        assert!(!conn.is_manifold());
        let non_manifold: Vec<_> = conn.non_manifold_edges().collect();
        assert_eq!(non_manifold, vec![(0, 1)]);
    }
}
