//! Modifier stack evaluation with origin-vertex correspondence.
//!
//! The live stack is the non-destructive layer between a base mesh and the
//! geometry an exporter sees. This crate provides:
//!
//! - [`ModifierStack`] / [`Modifier`] - ordered, named, toggleable entries:
//!   bevel, displace, smooth
//! - [`evaluate`] - fold the enabled entries over a base mesh, composing
//!   per-modifier origin maps into a single base-vertex correspondence
//! - [`apply_modifier`] - the one destructive step: commit a named entry
//!   into the base mesh and drop it from the stack
//!
//! Evaluation is read-only with respect to the base mesh; correspondence
//! is carried explicitly in [`EvaluatedMesh::origin_vertex`] rather than
//! assumed from index stability.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod evaluate;
mod stack;

pub use error::{EvalError, EvalResult};
pub use evaluate::{apply_modifier, evaluate, EvaluatedMesh};
pub use stack::{Modifier, ModifierEntry, ModifierStack};
