//! Error types for the session layer.

use shade_bake::BakeError;
use shade_bevel::{BevelError, TagError};
use shade_detect::DetectError;
use shade_eval::EvalError;
use thiserror::Error;

use crate::state::SessionState;

/// Errors from the backup slot.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The slot already holds a snapshot.
    #[error("a backup already exists; restore or discard it first")]
    AlreadyExists,

    /// The slot is empty.
    #[error("no backup available")]
    Empty,
}

/// Result type for backup operations.
pub type BackupResult<T> = std::result::Result<T, BackupError>;

/// A failure inside one stage of the bake pipeline.
///
/// Carried as the source of [`SessionError::Stage`] so programmatic
/// callers can still reach the specific kind after the rollback.
#[derive(Debug, Error)]
pub enum StageError {
    /// Face tagging failed.
    #[error(transparent)]
    Tag(#[from] TagError),

    /// Snapshot management failed.
    #[error(transparent)]
    Backup(#[from] BackupError),

    /// The bevel executor failed.
    #[error(transparent)]
    Bevel(#[from] BevelError),

    /// Stack evaluation failed.
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// Normal baking failed.
    #[error(transparent)]
    Bake(#[from] BakeError),
}

/// Errors surfaced by [`Session`](crate::Session) entry points.
///
/// Only [`SessionError::NoBackup`] on an explicit restore and detection
/// failures pass through untouched; everything else is logged with mesh
/// and stage context, rolled back, and wrapped as a stage failure.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Explicit restore with an empty backup slot.
    #[error("no backup available to restore")]
    NoBackup,

    /// Edge or face classification found nothing to work with.
    #[error(transparent)]
    Detect(#[from] DetectError),

    /// The operation is not valid in the current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The state the session was in.
        state: SessionState,
    },

    /// A pipeline stage failed; the session was rolled back.
    #[error("bake failed during {stage}: {source}")]
    Stage {
        /// The failing stage.
        stage: &'static str,
        /// The underlying failure.
        #[source]
        source: StageError,
    },
}

impl SessionError {
    pub(crate) fn stage(stage: &'static str, source: impl Into<StageError>) -> Self {
        Self::Stage {
            stage,
            source: source.into(),
        }
    }
}

/// Result type for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;
