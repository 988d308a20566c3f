//! Backup slots and the bake/restore pipeline state machine.
//!
//! The session layer ties the pipeline together: classify seam edges,
//! write weights, tag the original surface, snapshot, commit the bevel,
//! and bake corner normals - with every failure rolled back so no partial
//! state is ever observable.
//!
//! - [`Session`] - one mesh's pipeline: `bake`, `restore`,
//!   `clear_normals`, `detect_edges`, `adopt_geometry`
//! - [`SessionState`] - explicit lifecycle state (clean / baked /
//!   beveled-without-normals)
//! - [`BackupSlot`] / [`BackupRegistry`] - snapshot storage with
//!   single-slot protection
//!
//! # Examples
//!
//! ```
//! use shade_types::unit_cube;
//! use shade_session::{BakeRequest, Session};
//!
//! let mut session = Session::new("crate", unit_cube());
//!
//! let report = session.bake(&BakeRequest::new())?;
//! println!("{report}");
//!
//! // Toggle the bake off and on without re-beveling.
//! session.clear_normals()?;
//! session.bake(&BakeRequest::new())?;
//!
//! // Or unwind everything.
//! session.restore()?;
//! assert_eq!(session.mesh(), &unit_cube());
//! # Ok::<(), shade_session::SessionError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod backup;
mod error;
mod session;
mod state;

pub use backup::{BackupRegistry, BackupSlot};
pub use error::{BackupError, BackupResult, SessionError, SessionResult, StageError};
pub use session::{AdoptReport, BakeReport, BakeRequest, ClearReport, RestoreReport, Session};
pub use state::SessionState;
