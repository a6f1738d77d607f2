//! On-disk export snapshot for one domain
//!
//! Three sibling files live under `<output_dir>/<domain>/`:
//! - [`STRUCTURED_FILE`]: reconciled record list (JSON)
//! - [`FLAT_FILE`]: one `address[:secret]` per line
//! - [`COMPACT_FILE`]: append-only report, one section per run

pub mod compact;
pub mod flat;
pub mod store;
pub mod structured;

pub use compact::{ReportKind, ReportSection};
pub use store::RealSnapshotStore;

pub const STRUCTURED_FILE: &str = "aliases.json";
pub const FLAT_FILE: &str = "aliases.txt";
pub const COMPACT_FILE: &str = "aliases.toon";

/// What one merge changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Records in the structured list after the merge
    pub structured_total: usize,
    pub added: usize,
    pub updated: usize,
    pub passwords_set: usize,
    /// Lines in the flat list after the merge
    pub flat_total: usize,
    /// Credentials whose address has no structured record
    pub unmatched_credentials: usize,
}
