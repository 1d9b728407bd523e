//! Core shared types for Trellis.
//!
//! This crate is intentionally small: the problem/error taxonomy shared by
//! every other crate, plus the compute-if-absent cache that backs the
//! memoized metadata tables elsewhere in the workspace.

mod memo;
mod problems;

pub use memo::Memo;
pub use problems::{
    DefinitionError, DeploymentError, Problem, ProblemReport, Problems, ResolutionError, Severity,
};
