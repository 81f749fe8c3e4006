//! Shared run context.
//!
//! One `RunContext` is constructed per invocation and passed explicitly
//! into every pass. It carries two disjoint kinds of state: persistent
//! state (configuration and projects, valid for the whole run) and
//! [`Scratch`] state (meaningful only within the pass that set it).
//! Scratch lives in its own typed container, so the pass-boundary reset
//! is a wholesale replacement rather than a name-convention sweep.

use crate::config::RunConfig;
use crate::output::Changeset;
use crate::project::Project;
use crate::source::FileHistory;
use crate::stats::RunStats;
use crate::symbols::{SymbolClassifications, SymbolUsageStats};

/// Pass-local intermediate state: working storage a pass body may hang
/// on the context while it runs. Anything here is discarded at every
/// pass boundary; data that must cross passes goes through the artifact
/// store instead.
#[derive(Debug, Default)]
pub struct Scratch {
    pub histories: Option<Vec<FileHistory>>,
    pub usage: Option<SymbolUsageStats>,
    pub changesets: Option<Vec<Changeset>>,
}

impl Scratch {
    pub fn is_empty(&self) -> bool {
        self.histories.is_none() && self.usage.is_none() && self.changesets.is_none()
    }
}

#[derive(Debug)]
pub struct RunContext {
    config: RunConfig,
    pub projects: Vec<Project>,
    pub stats: RunStats,
    /// The resolved symbol table, set once the classification pass has
    /// run. Persistent: later passes in the same invocation read it
    /// without a store round-trip, and it survives scratch resets.
    pub classifications: Option<SymbolClassifications>,
    pub scratch: Scratch,
}

impl RunContext {
    pub fn new(config: RunConfig, projects: Vec<Project>) -> Self {
        Self {
            config,
            projects,
            stats: RunStats::default(),
            classifications: None,
            scratch: Scratch::default(),
        }
    }

    /// Persistent configuration: written once at setup, read by every
    /// pass.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Discard all scratch state. Called by the scheduler at every pass
    /// boundary; idempotent.
    pub fn reset_scratch(&mut self) {
        self.scratch = Scratch::default();
    }
}
