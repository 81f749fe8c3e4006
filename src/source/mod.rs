//! Input collaborator seam: per-file parsed revision histories.
//!
//! Parsing the on-disk RCS format is out of scope; revmap consumes
//! already-parsed [`FileHistory`] records through the [`RevisionSource`]
//! trait. [`JsonSource`] loads a corpus from a JSON file so the tool runs
//! end-to-end without an RCS parser; [`MemorySource`] backs the tests.

mod json;

pub use json::JsonSource;

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// A line of development within one file: the trunk or a named branch.
///
/// Repository-wide, an `Lod` is also the unit of preferred-parent
/// selection: a symbol's candidate parents are the lines of development
/// it sprouts from, counted across files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lod {
    Trunk,
    Branch(String),
}

impl fmt::Display for Lod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lod::Trunk => write!(f, "trunk"),
            Lod::Branch(name) => write!(f, "branch '{}'", name),
        }
    }
}

/// How a symbolic name is used within one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UsageKind {
    /// The symbol roots a branch in this file; `commits` counts the
    /// revisions committed on that branch within the file.
    BranchRoot { commits: u32 },
    /// The symbol is a plain tag on one revision.
    Tag,
    /// The symbol is merely referenced (e.g. as a merge source) without
    /// rooting a branch or tagging a revision.
    Reference,
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageKind::BranchRoot { commits } => {
                write!(f, "a branch root ({} commit(s) on the branch)", commits)
            }
            UsageKind::Tag => write!(f, "a plain tag"),
            UsageKind::Reference => write!(f, "a bare reference"),
        }
    }
}

/// One revision of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    /// Revision identifier in the source numbering, e.g. `1.7` or `1.7.2.3`.
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub log: String,
    /// The line of development this revision was committed on.
    #[serde(default = "default_lod")]
    pub lod: Lod,
}

fn default_lod() -> Lod {
    Lod::Trunk
}

/// One symbolic name as it appears in one file's label graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolUsage {
    pub name: String,
    #[serde(flatten)]
    pub kind: UsageKind,
    /// The line of development the symbol forks from in this file.
    #[serde(default = "default_lod")]
    pub sprouts_from: Lod,
    /// The revision at which the symbol is attached in this file.
    pub sprout_revision: String,
}

/// The parsed history of a single source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileHistory {
    pub path: PathBuf,
    #[serde(default)]
    pub binary: bool,
    /// Revisions in the file's own order; the first entry is the file's
    /// initial revision.
    pub revisions: Vec<Revision>,
    #[serde(default)]
    pub symbols: Vec<SymbolUsage>,
}

impl FileHistory {
    /// The identifier of the file's initial revision, if any revision
    /// exists at all.
    pub fn initial_revision_id(&self) -> Option<&str> {
        self.revisions.first().map(|r| r.id.as_str())
    }
}

/// A provider of parsed per-file histories.
///
/// Implementations must yield files in a stable order: the aggregated
/// symbol statistics (and therefore the whole conversion) are only
/// deterministic if two runs over the same corpus see the same sequence.
pub trait RevisionSource {
    fn file_histories(&self) -> Result<Vec<FileHistory>>;
}

/// An in-memory source, used by tests and by callers that parse the
/// corpus themselves.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    histories: Vec<FileHistory>,
}

impl MemorySource {
    pub fn new(mut histories: Vec<FileHistory>) -> Self {
        // Stable order regardless of how the caller assembled the list.
        histories.sort_by(|a, b| a.path.cmp(&b.path));
        Self { histories }
    }
}

impl RevisionSource for MemorySource {
    fn file_histories(&self) -> Result<Vec<FileHistory>> {
        Ok(self.histories.clone())
    }
}
