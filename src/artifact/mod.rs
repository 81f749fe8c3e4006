//! Persisted intermediate results and their lifecycle.
//!
//! An artifact is a named, persisted intermediate result produced by one
//! pass and consumed by later passes, possibly in a later invocation.
//! [`ArtifactStore`] is the key-addressed backing storage;
//! [`ArtifactRegistry`] tracks producer/consumer relationships and
//! decides when backing files may be removed.

mod registry;
mod store;

pub use registry::{ArtifactRegistry, Retention};
pub use store::ArtifactStore;

/// The shared run-statistics artifact, needed by every pass.
pub const RUN_STATS_ARTIFACT: &str = "run-stats";

/// Filtered, transformed per-file histories.
pub const REVISIONS_ARTIFACT: &str = "revisions";

/// Aggregated per-symbol usage statistics.
pub const SYMBOL_USAGE_ARTIFACT: &str = "symbol-usage";

/// Resolved symbol classification table.
pub const SYMBOL_CLASSES_ARTIFACT: &str = "symbol-classes";

/// Linearized changeset sequence.
pub const CHANGESETS_ARTIFACT: &str = "changesets";
