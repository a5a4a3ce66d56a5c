//! Core types for the `sr` RPC code generator.
//!
//! Provides the project context ([`project::Project`]), configuration, the
//! error taxonomy shared by every crate, helper-metadata wire types, the Go
//! code writer and the staging area that generated files pass through before
//! they reach disk.

pub mod config;
pub mod error;
pub mod generated;
pub mod meta;
pub mod naming;
pub mod pos;
pub mod project;
pub mod writer;

pub use error::{GenError, GenWarning, Result};
pub use pos::SourcePos;
