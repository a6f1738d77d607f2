//! Shared types for the alias-forge workspace
//!
//! Contains the record types that flow between the name generator, the
//! remote rule gateway and the export snapshots, plus the error taxonomy and
//! logging setup used by every crate.

pub mod types;
pub mod errors;
pub mod logging;

pub use types::*;
pub use errors::*;
