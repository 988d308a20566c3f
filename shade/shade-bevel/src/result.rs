//! Result type for bevel execution.

use shade_types::PolyMesh;

/// Result of a bevel execution.
///
/// Besides the new mesh, carries the origin-vertex map that later stages
/// use to trace evaluated vertices back to base vertices: `origin_vertex[i]`
/// is `Some(base_index)` for vertices that survived the bevel unchanged and
/// `None` for vertices the bevel created.
#[derive(Debug, Clone)]
pub struct BevelOutcome {
    /// The beveled mesh.
    pub mesh: PolyMesh,

    /// For each output vertex, the input vertex it originates from.
    pub origin_vertex: Vec<Option<u32>>,

    /// Number of edges that were beveled.
    pub edges_beveled: usize,

    /// Number of faces created by the bevel (strips and patches).
    pub faces_created: usize,

    /// Number of faces carried over from the input mesh.
    pub original_faces: usize,
}

impl BevelOutcome {
    /// Number of output vertices that trace back to an input vertex.
    #[must_use]
    pub fn surviving_vertices(&self) -> usize {
        self.origin_vertex.iter().filter(|o| o.is_some()).count()
    }
}

impl std::fmt::Display for BevelOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bevel: {} edges → {} new faces ({} originals kept, {} vertices survive)",
            self.edges_beveled,
            self.faces_created,
            self.original_faces,
            self.surviving_vertices()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_counts() {
        let outcome = BevelOutcome {
            mesh: PolyMesh::new(),
            origin_vertex: vec![Some(0), None, Some(2), None],
            edges_beveled: 1,
            faces_created: 3,
            original_faces: 6,
        };

        assert_eq!(outcome.surviving_vertices(), 2);
        let text = format!("{outcome}");
        assert!(text.contains("1 edges"));
        assert!(text.contains("3 new faces"));
    }
}
