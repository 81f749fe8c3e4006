//! Repository-wide symbol model.
//!
//! A symbol is a branch/tag label observed somewhere in the source
//! corpus. Per-file usage is aggregated into [`SymbolStats`]
//! ([`aggregator`]), which the strategy engine ([`strategy`]) resolves
//! into a [`SymbolClassifications`] table: exactly one of
//! {Branch, Tag, Excluded} per name, plus the chosen fork parent.

pub mod aggregator;
pub mod strategy;

pub use aggregator::aggregate;
pub use strategy::{OverrideRule, StrategyEngine};

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::source::{Lod, UsageKind};

/// Final classification of a symbol. `Undecided` never escapes the
/// strategy engine under a non-strict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Branch,
    Tag,
    Excluded,
    Undecided,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Classification::Branch => "branch",
            Classification::Tag => "tag",
            Classification::Excluded => "excluded",
            Classification::Undecided => "undecided",
        };
        // pad() so column widths in the manifest apply.
        f.pad(label)
    }
}

/// One file's observed use of a symbol, kept for error reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEvidence {
    pub path: PathBuf,
    pub kind: UsageKind,
}

/// A candidate fork parent: a line of development some files sprout this
/// symbol from, with the number of files that do so.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentCandidate {
    pub lod: Lod,
    pub file_count: u32,
}

/// Aggregated repository-wide usage statistics for one symbol.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SymbolStats {
    pub name: String,
    /// Files in which the symbol roots a branch.
    pub branch_files: u32,
    /// Files in which the symbol is a plain tag.
    pub tag_files: u32,
    /// Files in which the symbol is only referenced.
    pub reference_files: u32,
    /// Files in which the symbol's branch carries at least one commit.
    pub branch_commit_files: u32,
    /// True when the symbol looks like a branch created solely by a
    /// single-file bulk import: one file, one branch commit, sprouting
    /// from that file's initial revision.
    pub trivial_import: bool,
    /// Candidate fork parents in first-observed order over the stable
    /// file iteration order.
    pub candidates: Vec<ParentCandidate>,
    /// Per-file observations, for ambiguity reporting.
    pub evidence: Vec<FileEvidence>,
}

impl SymbolStats {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The preferred fork parent: the candidate used by the most files.
    /// Ties are broken in favor of the earliest-observed candidate,
    /// which is why `candidates` preserves first-observed order.
    pub fn preferred_parent(&self) -> Option<&Lod> {
        let mut best: Option<&ParentCandidate> = None;
        for candidate in &self.candidates {
            match best {
                Some(current) if candidate.file_count <= current.file_count => {}
                _ => best = Some(candidate),
            }
        }
        best.map(|c| &c.lod)
    }
}

/// The per-symbol statistics artifact: one record per distinct name,
/// in name order for deterministic iteration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SymbolUsageStats {
    pub symbols: BTreeMap<String, SymbolStats>,
}

impl SymbolUsageStats {
    pub fn get(&self, name: &str) -> Option<&SymbolStats> {
        self.symbols.get(name)
    }

    pub fn entry(&mut self, name: &str) -> &mut SymbolStats {
        self.symbols
            .entry(name.to_string())
            .or_insert_with(|| SymbolStats::new(name))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolStats> {
        self.symbols.values()
    }
}

/// One resolved symbol: its final classification and, for branches and
/// tags, the single fork parent used when materializing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSymbol {
    pub classification: Classification,
    pub parent: Option<Lod>,
}

/// The classification artifact consumed by downstream passes. Immutable
/// once the classification pass completes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SymbolClassifications {
    pub symbols: BTreeMap<String, ResolvedSymbol>,
}

impl SymbolClassifications {
    pub fn get(&self, name: &str) -> Option<&ResolvedSymbol> {
        self.symbols.get(name)
    }

    pub fn classification_of(&self, name: &str) -> Classification {
        self.symbols
            .get(name)
            .map(|s| s.classification)
            .unwrap_or(Classification::Undecided)
    }

    /// Whether a branch revision on `name` survives into the destination
    /// history.
    pub fn branch_is_kept(&self, name: &str) -> bool {
        self.classification_of(name) == Classification::Branch
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
