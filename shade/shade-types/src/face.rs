//! Face type and per-face attributes.

use crate::edge::edge_key;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Provenance tag for a face.
///
/// Faces present before a bevel runs carry [`FaceTag::Original`]; faces the
/// bevel creates carry [`FaceTag::Bevel`]. The two sets stay disjoint, which
/// is what lets the bake engine select the original surface with a plain
/// tag-equality filter after the topology has changed.
///
/// A dedicated enum (rather than an index into some shared table) makes a
/// collision with user-visible attributes unrepresentable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FaceTag {
    /// Face existed before the bevel ran.
    #[default]
    Original,

    /// Face was created by the bevel.
    Bevel,
}

/// Face strength written by the bevel per its face-strength mode.
///
/// Persisted mesh data read by export paths; nothing in this workspace
/// consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FaceStrength {
    /// Weak shading influence.
    Weak,
    /// Medium shading influence.
    Medium,
    /// Strong shading influence.
    Strong,
}

/// A polygon face: an ordered corner list referencing vertices by index.
///
/// Winding is **counter-clockwise when viewed from outside**, so Newell
/// normals point outward by the right-hand rule. Faces must have at least
/// three corners; quads and larger n-gons are first-class (bevels produce
/// both).
///
/// # Example
///
/// ```
/// use shade_types::{Face, FaceTag};
///
/// let face = Face::quad(0, 1, 2, 3);
/// assert_eq!(face.corner_count(), 4);
/// assert_eq!(face.tag, FaceTag::Original);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Face {
    /// Corner vertices in CCW order.
    pub vertices: Vec<u32>,

    /// Provenance tag.
    pub tag: FaceTag,

    /// Face strength, if a bevel stamped one.
    pub strength: Option<FaceStrength>,
}

impl Face {
    /// Create a face from an ordered corner list.
    #[must_use]
    pub fn new(vertices: Vec<u32>) -> Self {
        Self {
            vertices,
            tag: FaceTag::default(),
            strength: None,
        }
    }

    /// Create a triangle face.
    #[inline]
    #[must_use]
    pub fn tri(a: u32, b: u32, c: u32) -> Self {
        Self::new(vec![a, b, c])
    }

    /// Create a quad face.
    #[inline]
    #[must_use]
    pub fn quad(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self::new(vec![a, b, c, d])
    }

    /// Set the provenance tag (builder pattern).
    #[must_use]
    pub fn with_tag(mut self, tag: FaceTag) -> Self {
        self.tag = tag;
        self
    }

    /// Number of corners (= number of boundary edges).
    #[inline]
    #[must_use]
    pub fn corner_count(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the face references the given vertex.
    #[must_use]
    pub fn contains(&self, vertex: u32) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Iterate over the boundary edges as canonical `(lo, hi)` keys.
    pub fn edge_keys(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| edge_key(self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// The previous, current, and next vertex around the given corner slot.
    ///
    /// Returns `None` if the slot is out of bounds.
    #[must_use]
    pub fn corner_neighborhood(&self, slot: usize) -> Option<(u32, u32, u32)> {
        let n = self.vertices.len();
        if slot >= n || n < 3 {
            return None;
        }
        let prev = self.vertices[(slot + n - 1) % n];
        let next = self.vertices[(slot + 1) % n];
        Some((prev, self.vertices[slot], next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_edge_keys() {
        let face = Face::tri(2, 0, 1);
        let keys: Vec<_> = face.edge_keys().collect();
        assert_eq!(keys, vec![(0, 2), (0, 1), (1, 2)]);
    }

    #[test]
    fn face_corner_neighborhood() {
        let face = Face::quad(0, 1, 2, 3);
        assert_eq!(face.corner_neighborhood(0), Some((3, 0, 1)));
        assert_eq!(face.corner_neighborhood(3), Some((2, 3, 0)));
        assert_eq!(face.corner_neighborhood(4), None);
    }

    #[test]
    fn default_tag_is_original() {
        let face = Face::tri(0, 1, 2);
        assert_eq!(face.tag, FaceTag::Original);
        assert!(face.strength.is_none());
    }

    #[test]
    fn with_tag_builder() {
        let face = Face::tri(0, 1, 2).with_tag(FaceTag::Bevel);
        assert_eq!(face.tag, FaceTag::Bevel);
    }
}
