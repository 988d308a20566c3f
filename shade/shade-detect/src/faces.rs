//! Bevel-face detection on untagged geometry.
//!
//! For meshes that were beveled elsewhere and carry no provenance tags,
//! bevel faces can still be recovered from their area signature: bevel
//! strips and patches are much smaller than the faces they border. Faces
//! below a ratio of the median area that flood-connect to a large face are
//! classified as bevel geometry.

use shade_types::{FaceTag, PolyMesh};
use tracing::debug;

use crate::error::{DetectError, DetectResult};

/// Classification of an untagged, already-beveled mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDetection {
    /// Faces classified as bevel geometry, ascending.
    pub bevel_faces: Vec<u32>,

    /// Faces classified as original surface, ascending.
    pub original_faces: Vec<u32>,

    /// The median face area the cutoff was derived from.
    pub median_area: f64,
}

impl FaceDetection {
    /// Stamp the classification onto the mesh's face tags.
    pub fn apply_tags(&self, mesh: &mut PolyMesh) {
        for &f in &self.original_faces {
            mesh.set_face_tag(f as usize, FaceTag::Original);
        }
        for &f in &self.bevel_faces {
            mesh.set_face_tag(f as usize, FaceTag::Bevel);
        }
    }
}

impl std::fmt::Display for FaceDetection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} bevel faces, {} originals (median area {:.4})",
            self.bevel_faces.len(),
            self.original_faces.len(),
            self.median_area
        )
    }
}

/// Detect bevel faces by area against `ratio x median`, flood-filling small
/// faces from large-face frontiers.
///
/// Small faces not connected to any large face (e.g. genuinely fine
/// original detail) stay classified as original surface.
///
/// # Errors
///
/// Returns [`DetectError::NoBevelFaces`] when the mesh is too small, flat
/// in area distribution, or no small face borders a large one.
#[allow(clippy::cast_possible_truncation)] // face counts fit u32 by design
pub fn detect_bevel_faces(mesh: &PolyMesh, ratio: f64) -> DetectResult<FaceDetection> {
    if mesh.face_count() < 2 {
        return Err(DetectError::NoBevelFaces);
    }

    let areas: Vec<f64> = (0..mesh.face_count()).map(|f| mesh.face_area(f)).collect();
    let mut sorted = areas.clone();
    sorted.sort_by(f64::total_cmp);
    let median_area = sorted[sorted.len() / 2];
    if median_area <= 0.0 {
        return Err(DetectError::NoBevelFaces);
    }

    let cutoff = median_area * ratio;
    let small: Vec<bool> = areas.iter().map(|&a| a < cutoff).collect();
    if small.iter().all(|&s| s) || !small.iter().any(|&s| s) {
        return Err(DetectError::NoBevelFaces);
    }

    // Flood small faces reachable from any large face.
    let conn = mesh.connectivity();
    let neighbors = |f: usize| -> Vec<u32> {
        let mut adjacent: Vec<u32> = mesh.faces[f]
            .edge_keys()
            .flat_map(|(a, b)| conn.faces_for_edge(a, b).iter().copied())
            .filter(|&g| g != f as u32)
            .collect();
        adjacent.sort_unstable();
        adjacent.dedup();
        adjacent
    };

    let mut confirmed = vec![false; mesh.face_count()];
    let mut frontier: Vec<u32> = Vec::new();
    for f in 0..mesh.face_count() {
        if small[f] {
            continue;
        }
        for n in neighbors(f) {
            if small[n as usize] && !confirmed[n as usize] {
                confirmed[n as usize] = true;
                frontier.push(n);
            }
        }
    }
    while let Some(current) = frontier.pop() {
        for n in neighbors(current as usize) {
            if small[n as usize] && !confirmed[n as usize] {
                confirmed[n as usize] = true;
                frontier.push(n);
            }
        }
    }

    let bevel_faces: Vec<u32> = (0..mesh.face_count() as u32)
        .filter(|&f| confirmed[f as usize])
        .collect();
    if bevel_faces.is_empty() {
        return Err(DetectError::NoBevelFaces);
    }
    let original_faces: Vec<u32> = (0..mesh.face_count() as u32)
        .filter(|&f| !confirmed[f as usize])
        .collect();

    let detection = FaceDetection {
        bevel_faces,
        original_faces,
        median_area,
    };
    debug!("{detection}");
    Ok(detection)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use shade_types::{Face, Vertex};

    /// Two unit quads flanking a thin strip, like a chamfered ridge seen
    /// from above.
    fn chamfered_plane() -> PolyMesh {
        PolyMesh::from_parts(
            vec![
                Vertex::from_coords(0.0, 0.0, 0.0),
                Vertex::from_coords(1.0, 0.0, 0.0),
                Vertex::from_coords(1.1, 0.0, 0.0),
                Vertex::from_coords(2.1, 0.0, 0.0),
                Vertex::from_coords(2.1, 1.0, 0.0),
                Vertex::from_coords(1.1, 1.0, 0.0),
                Vertex::from_coords(1.0, 1.0, 0.0),
                Vertex::from_coords(0.0, 1.0, 0.0),
            ],
            vec![
                Face::quad(0, 1, 6, 7), // area 1.0
                Face::quad(1, 2, 5, 6), // area 0.1 - the strip
                Face::quad(2, 3, 4, 5), // area 1.0
            ],
        )
    }

    #[test]
    fn strip_is_classified_as_bevel() {
        let mesh = chamfered_plane();
        let detection = detect_bevel_faces(&mesh, 0.5).expect("detects");

        assert_eq!(detection.bevel_faces, vec![1]);
        assert_eq!(detection.original_faces, vec![0, 2]);
        assert!((detection.median_area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn apply_tags_stamps_classification() {
        let mut mesh = chamfered_plane();
        let detection = detect_bevel_faces(&mesh, 0.5).expect("detects");
        detection.apply_tags(&mut mesh);

        assert_eq!(mesh.faces[1].tag, FaceTag::Bevel);
        assert_eq!(mesh.tagged_face_count(FaceTag::Original), 2);
    }

    #[test]
    fn uniform_mesh_has_no_bevel_faces() {
        let mesh = shade_types::unit_cube();
        assert!(matches!(
            detect_bevel_faces(&mesh, 0.5),
            Err(DetectError::NoBevelFaces)
        ));
    }

    #[test]
    fn isolated_small_faces_stay_original() {
        // A small triangle floating apart from two large quads: small but
        // not connected to a large face through other small faces.
        let mesh = PolyMesh::from_parts(
            vec![
                Vertex::from_coords(0.0, 0.0, 0.0),
                Vertex::from_coords(1.0, 0.0, 0.0),
                Vertex::from_coords(1.0, 1.0, 0.0),
                Vertex::from_coords(0.0, 1.0, 0.0),
                Vertex::from_coords(2.0, 0.0, 0.0),
                Vertex::from_coords(3.0, 0.0, 0.0),
                Vertex::from_coords(3.0, 1.0, 0.0),
                Vertex::from_coords(2.0, 1.0, 0.0),
                Vertex::from_coords(5.0, 0.0, 0.0),
                Vertex::from_coords(5.1, 0.0, 0.0),
                Vertex::from_coords(5.0, 0.1, 0.0),
            ],
            vec![
                Face::quad(0, 1, 2, 3),
                Face::quad(4, 5, 6, 7),
                Face::tri(8, 9, 10),
            ],
        );

        // The tiny triangle is below the cutoff but touches no large face,
        // so nothing is confirmed as bevel geometry.
        assert!(matches!(
            detect_bevel_faces(&mesh, 0.5),
            Err(DetectError::NoBevelFaces)
        ));
    }

    #[test]
    fn too_few_faces() {
        let mesh = PolyMesh::from_parts(
            vec![
                Vertex::from_coords(0.0, 0.0, 0.0),
                Vertex::from_coords(1.0, 0.0, 0.0),
                Vertex::from_coords(0.0, 1.0, 0.0),
            ],
            vec![Face::tri(0, 1, 2)],
        );
        assert!(matches!(
            detect_bevel_faces(&mesh, 0.5),
            Err(DetectError::NoBevelFaces)
        ));
    }
}
