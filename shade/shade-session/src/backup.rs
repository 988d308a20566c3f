//! Mesh backup storage.

use hashbrown::HashMap;
use shade_types::PolyMesh;
use tracing::debug;

use crate::error::{BackupError, BackupResult};

/// Holds at most one full mesh snapshot.
///
/// The slot is the rollback point for every destructive pipeline step: a
/// snapshot is taken before the first mutation and is never silently
/// overwritten while occupied. Snapshot and restore round-trip bit-exactly
/// over geometry, tags, flags, and corner normals.
///
/// # Example
///
/// ```
/// use shade_types::unit_cube;
/// use shade_session::BackupSlot;
///
/// let mut slot = BackupSlot::new();
/// let cube = unit_cube();
///
/// slot.snapshot(&cube, false)?;
/// assert!(slot.has_backup());
///
/// let restored = slot.restore()?;
/// assert_eq!(restored, cube);
/// assert!(!slot.has_backup());
/// # Ok::<(), shade_session::BackupError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct BackupSlot {
    snapshot: Option<PolyMesh>,
}

impl BackupSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the slot holds a snapshot.
    #[must_use]
    pub const fn has_backup(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Deep-copy the mesh into the slot.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::AlreadyExists`] when the slot is occupied and
    /// `overwrite` is false - overwriting silently would lose the only copy
    /// of the pre-bevel state.
    pub fn snapshot(&mut self, mesh: &PolyMesh, overwrite: bool) -> BackupResult<()> {
        if self.snapshot.is_some() && !overwrite {
            return Err(BackupError::AlreadyExists);
        }
        debug!(
            "snapshot: {} vertices, {} faces",
            mesh.vertex_count(),
            mesh.face_count()
        );
        self.snapshot = Some(mesh.clone());
        Ok(())
    }

    /// Borrow the snapshot without consuming it (the re-bake path).
    #[must_use]
    pub const fn peek(&self) -> Option<&PolyMesh> {
        self.snapshot.as_ref()
    }

    /// Take the snapshot out of the slot.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Empty`] when the slot is vacant.
    pub fn restore(&mut self) -> BackupResult<PolyMesh> {
        self.snapshot.take().ok_or(BackupError::Empty)
    }

    /// Clear the slot without touching any mesh. Returns whether a
    /// snapshot was discarded.
    pub fn discard(&mut self) -> bool {
        self.snapshot.take().is_some()
    }
}

/// Named backup slots for hosts juggling several meshes.
///
/// Pure storage: each mesh still gets its own [`Session`](crate::Session)
/// for pipeline work; the registry only remembers snapshots across them.
#[derive(Debug, Clone, Default)]
pub struct BackupRegistry {
    slots: HashMap<String, BackupSlot>,
}

impl BackupRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot a mesh under a name.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::AlreadyExists`] when that name already holds
    /// a snapshot and `overwrite` is false.
    pub fn snapshot(
        &mut self,
        name: impl Into<String>,
        mesh: &PolyMesh,
        overwrite: bool,
    ) -> BackupResult<()> {
        self.slots
            .entry(name.into())
            .or_default()
            .snapshot(mesh, overwrite)
    }

    /// Whether a name holds a snapshot.
    #[must_use]
    pub fn has_backup(&self, name: &str) -> bool {
        self.slots.get(name).is_some_and(BackupSlot::has_backup)
    }

    /// Take the snapshot stored under a name.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Empty`] for unknown or vacant names.
    pub fn restore(&mut self, name: &str) -> BackupResult<PolyMesh> {
        self.slots
            .get_mut(name)
            .ok_or(BackupError::Empty)?
            .restore()
    }

    /// Discard the snapshot under a name, if any.
    pub fn discard(&mut self, name: &str) -> bool {
        self.slots
            .get_mut(name)
            .is_some_and(BackupSlot::discard)
    }

    /// Names currently holding a snapshot, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.has_backup())
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use shade_types::unit_cube;

    #[test]
    fn snapshot_restore_round_trip() {
        let mut slot = BackupSlot::new();
        let mut cube = unit_cube();
        cube.edges[0].set_bevel_weight(1.0);
        cube.edges[0].seam = true;

        slot.snapshot(&cube, false).expect("snapshot");
        let restored = slot.restore().expect("restore");
        assert_eq!(restored, cube);
        assert!(!slot.has_backup());
    }

    #[test]
    fn occupied_slot_is_protected() {
        let mut slot = BackupSlot::new();
        let cube = unit_cube();
        slot.snapshot(&cube, false).expect("first snapshot");

        let result = slot.snapshot(&cube, false);
        assert!(matches!(result, Err(BackupError::AlreadyExists)));

        // Explicit overwrite is allowed.
        slot.snapshot(&cube, true).expect("overwrite");
    }

    #[test]
    fn restore_empty_slot_fails() {
        let mut slot = BackupSlot::new();
        assert!(matches!(slot.restore(), Err(BackupError::Empty)));
    }

    #[test]
    fn discard_clears_without_restoring() {
        let mut slot = BackupSlot::new();
        slot.snapshot(&unit_cube(), false).expect("snapshot");
        assert!(slot.discard());
        assert!(!slot.discard());
        assert!(matches!(slot.restore(), Err(BackupError::Empty)));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut slot = BackupSlot::new();
        let cube = unit_cube();
        slot.snapshot(&cube, false).expect("snapshot");

        assert_eq!(slot.peek(), Some(&cube));
        assert!(slot.has_backup());
    }

    #[test]
    fn registry_tracks_names() {
        let mut registry = BackupRegistry::new();
        registry
            .snapshot("helmet", &unit_cube(), false)
            .expect("snapshot");
        registry
            .snapshot("boot", &unit_cube(), false)
            .expect("snapshot");

        assert_eq!(registry.names(), vec!["boot", "helmet"]);
        assert!(registry.has_backup("helmet"));
        assert!(!registry.has_backup("missing"));

        registry.restore("boot").expect("restore");
        assert_eq!(registry.names(), vec!["helmet"]);
        assert!(matches!(
            registry.restore("boot"),
            Err(BackupError::Empty)
        ));
    }
}
