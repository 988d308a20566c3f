//! Per-corner custom normal storage.

use hashbrown::HashMap;

use crate::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Custom split normals, keyed by `(face index, corner slot)`.
///
/// Absence of an entry means "use the default smooth/flat normal". Entries
/// are unit vectors written by the bake engine; export paths read them back
/// one per corner.
///
/// # Example
///
/// ```
/// use shade_types::{CornerNormals, Vector3};
///
/// let mut normals = CornerNormals::new();
/// assert!(!normals.has_any());
///
/// normals.set(0, 2, Vector3::z());
/// assert_eq!(normals.get(0, 2), Some(Vector3::z()));
/// assert_eq!(normals.get(0, 1), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CornerNormals {
    normals: HashMap<(u32, u32), Vector3>,
}

impl CornerNormals {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the normal for a corner.
    pub fn set(&mut self, face: u32, corner: u32, normal: Vector3) {
        self.normals.insert((face, corner), normal);
    }

    /// Get the normal for a corner, if one was baked.
    #[must_use]
    pub fn get(&self, face: u32, corner: u32) -> Option<Vector3> {
        self.normals.get(&(face, corner)).copied()
    }

    /// Number of corners with a baked normal.
    #[must_use]
    pub fn len(&self) -> usize {
        self.normals.len()
    }

    /// Whether no corner has a baked normal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.normals.is_empty()
    }

    /// Whether any corner has a baked normal.
    #[must_use]
    pub fn has_any(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Remove every baked normal.
    pub fn clear(&mut self) {
        self.normals.clear();
    }

    /// Iterate over `((face, corner), normal)` entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = ((u32, u32), Vector3)> + '_ {
        self.normals.iter().map(|(&key, &normal)| (key, normal))
    }

    /// Entries sorted by `(face, corner)`, for deterministic export.
    #[must_use]
    pub fn sorted_entries(&self) -> Vec<((u32, u32), Vector3)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_clear() {
        let mut normals = CornerNormals::new();
        normals.set(1, 0, Vector3::x());
        normals.set(1, 1, Vector3::y());

        assert_eq!(normals.len(), 2);
        assert!(normals.has_any());
        assert_eq!(normals.get(1, 0), Some(Vector3::x()));

        normals.clear();
        assert!(normals.is_empty());
        assert_eq!(normals.get(1, 0), None);
    }

    #[test]
    fn overwrite_replaces() {
        let mut normals = CornerNormals::new();
        normals.set(0, 0, Vector3::x());
        normals.set(0, 0, Vector3::y());
        assert_eq!(normals.len(), 1);
        assert_eq!(normals.get(0, 0), Some(Vector3::y()));
    }

    #[test]
    fn sorted_entries_are_ordered() {
        let mut normals = CornerNormals::new();
        normals.set(2, 0, Vector3::z());
        normals.set(0, 1, Vector3::x());
        normals.set(0, 0, Vector3::y());

        let entries = normals.sorted_entries();
        let keys: Vec<_> = entries.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, vec![(0, 0), (0, 1), (2, 0)]);
    }
}
