// Export modules for library usage
pub mod artifact;
pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod output;
pub mod passes;
pub mod project;
pub mod source;
pub mod stats;
pub mod symbols;

// Re-export commonly used types
pub use crate::artifact::{ArtifactRegistry, ArtifactStore, Retention};
pub use crate::config::{ConversionOptions, RunConfig};
pub use crate::context::{RunContext, Scratch};
pub use crate::errors::{ConversionError, Result};
pub use crate::output::{Changeset, HistoryWriter, ManifestWriter};
pub use crate::passes::{default_passes, Pass, PassManager};
pub use crate::project::{Project, SymbolTransformRule};
pub use crate::source::{FileHistory, JsonSource, Lod, MemorySource, RevisionSource};
pub use crate::stats::RunStats;
pub use crate::symbols::strategy::DefaultPolicy;
pub use crate::symbols::{
    aggregate, Classification, OverrideRule, StrategyEngine, SymbolClassifications,
    SymbolUsageStats,
};
