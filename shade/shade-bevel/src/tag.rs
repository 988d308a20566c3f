//! Face correspondence tagging.
//!
//! Faces are stamped before the bevel runs so that, after the bevel inserts
//! new geometry, the original surface remains selectable by a plain
//! tag-equality filter.

use shade_types::{FaceTag, PolyMesh};
use tracing::debug;

use crate::error::{TagError, TagResult};

/// Stamp every current face as [`FaceTag::Original`].
///
/// Returns the number of faces tagged. Fails with
/// [`TagError::StaleBevelTags`] if any face still carries a
/// [`FaceTag::Bevel`] tag from an earlier run; beveling over stale tags
/// would corrupt the post-bevel original-face selection. Use
/// [`retag_all_faces`] to clear stale tags explicitly.
///
/// # Errors
///
/// Returns [`TagError::StaleBevelTags`] when stale bevel tags are present.
pub fn tag_original_faces(mesh: &mut PolyMesh) -> TagResult<usize> {
    let stale = mesh.tagged_face_count(FaceTag::Bevel);
    if stale > 0 {
        return Err(TagError::StaleBevelTags { count: stale });
    }

    for face in &mut mesh.faces {
        face.tag = FaceTag::Original;
    }
    debug!("tagged {} faces as original", mesh.face_count());
    Ok(mesh.face_count())
}

/// Stamp every face as [`FaceTag::Original`], clearing stale bevel tags.
///
/// Returns the number of stale tags cleared.
pub fn retag_all_faces(mesh: &mut PolyMesh) -> usize {
    let stale = mesh.tagged_face_count(FaceTag::Bevel);
    for face in &mut mesh.faces {
        face.tag = FaceTag::Original;
    }
    debug!(
        "retagged {} faces as original ({} stale bevel tags cleared)",
        mesh.face_count(),
        stale
    );
    stale
}

#[cfg(test)]
mod tests {
    use super::*;
    use shade_types::unit_cube;

    #[test]
    fn tags_all_faces() {
        let mut cube = unit_cube();
        let tagged = tag_original_faces(&mut cube).expect("clean mesh tags");
        assert_eq!(tagged, 6);
        assert_eq!(cube.tagged_face_count(FaceTag::Original), 6);
    }

    #[test]
    fn stale_bevel_tags_are_rejected() {
        let mut cube = unit_cube();
        cube.set_face_tag(1, FaceTag::Bevel);
        cube.set_face_tag(4, FaceTag::Bevel);

        let err = tag_original_faces(&mut cube).expect_err("stale tags rejected");
        assert!(matches!(err, TagError::StaleBevelTags { count: 2 }));
        // Mesh untouched on failure.
        assert_eq!(cube.tagged_face_count(FaceTag::Bevel), 2);
    }

    #[test]
    fn retag_clears_stale_tags() {
        let mut cube = unit_cube();
        cube.set_face_tag(1, FaceTag::Bevel);

        let cleared = retag_all_faces(&mut cube);
        assert_eq!(cleared, 1);
        assert_eq!(cube.tagged_face_count(FaceTag::Original), 6);
        assert!(tag_original_faces(&mut cube).is_ok());
    }

    #[test]
    fn tagging_is_idempotent() {
        let mut cube = unit_cube();
        tag_original_faces(&mut cube).expect("first tag");
        let snapshot = cube.clone();
        tag_original_faces(&mut cube).expect("second tag");
        assert_eq!(cube, snapshot);
    }
}
