//! The conversion pipeline.
//!
//! A conversion is an ordered list of passes executed strictly
//! sequentially by the [`PassManager`]. Each pass declares the artifacts
//! it produces and needs up front, runs to completion against the shared
//! run context, and communicates with later passes (possibly in a later
//! invocation) only through the artifact store.

pub mod builtin;
mod scheduler;

pub use builtin::default_passes;
pub use scheduler::PassManager;

use crate::artifact::{ArtifactRegistry, ArtifactStore};
use crate::context::RunContext;
use crate::errors::Result;

/// One ordered stage of the conversion pipeline.
pub trait Pass {
    /// Stable pass name, usable in `--passes` range selections.
    fn name(&self) -> &'static str;

    /// Declare produced and needed artifacts. Called once for every
    /// pass, in pipeline order, before any pass runs - including passes
    /// outside the active range, whose declarations drive skip/defer
    /// bookkeeping.
    fn register_artifacts(&self, registry: &mut ArtifactRegistry) -> Result<()>;

    /// Execute the pass body. Synchronous and run-to-completion; a
    /// failure aborts the whole run with artifacts left in place for
    /// inspection.
    fn run(&mut self, ctx: &mut RunContext, store: &ArtifactStore) -> Result<()>;
}
