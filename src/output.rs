//! Destination-history writer seam.
//!
//! The core's only contract with the writer: by the time it is invoked,
//! symbol classification and parent selection are fully resolved and
//! immutable, and the changeset sequence is in dependency order. The
//! bundled [`ManifestWriter`] emits a human-readable manifest; a dump
//! stream or commit-graph exporter plugs in behind the same trait.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ConversionError, Result};
use crate::project::Project;
use crate::source::Lod;
use crate::symbols::{Classification, SymbolClassifications};

/// One revision of one file inside a changeset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangesetRevision {
    pub path: PathBuf,
    pub revision: String,
}

/// A synthesized destination-side commit grouping revisions across
/// files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Changeset {
    pub id: u32,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub log: String,
    pub lod: Lod,
    pub revisions: Vec<ChangesetRevision>,
}

/// Destination-history writer.
pub trait HistoryWriter {
    fn write_history(
        &mut self,
        projects: &[Project],
        classifications: &SymbolClassifications,
        changesets: &[Changeset],
    ) -> Result<()>;
}

/// Writes a plain-text manifest of the converted history to a file or
/// stdout.
#[derive(Debug, Default)]
pub struct ManifestWriter {
    path: Option<PathBuf>,
}

impl ManifestWriter {
    pub fn to_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn to_stdout() -> Self {
        Self { path: None }
    }

    fn open(&self) -> Result<Box<dyn Write>> {
        match &self.path {
            Some(path) => {
                let file = File::create(path).map_err(|e| {
                    ConversionError::artifact(path.display().to_string(), e)
                })?;
                Ok(Box::new(file))
            }
            None => Ok(Box::new(io::stdout())),
        }
    }
}

impl HistoryWriter for ManifestWriter {
    fn write_history(
        &mut self,
        projects: &[Project],
        classifications: &SymbolClassifications,
        changesets: &[Changeset],
    ) -> Result<()> {
        let mut out = self.open()?;
        render_manifest(&mut out, projects, classifications, changesets).map_err(|e| {
            ConversionError::artifact(
                self.path
                    .as_deref()
                    .unwrap_or_else(|| Path::new("<stdout>"))
                    .display()
                    .to_string(),
                e,
            )
        })
    }
}

fn render_manifest(
    out: &mut dyn Write,
    projects: &[Project],
    classifications: &SymbolClassifications,
    changesets: &[Changeset],
) -> io::Result<()> {
    for project in projects {
        writeln!(out, "{}", project)?;
        for dir in project.initial_directories() {
            writeln!(out, "  mkdir {}", dir)?;
        }
    }

    writeln!(out, "symbols ({}):", classifications.len())?;
    for (name, resolved) in &classifications.symbols {
        match (&resolved.classification, &resolved.parent) {
            (Classification::Excluded, _) => {
                writeln!(out, "  {:<24} excluded", name)?;
            }
            (class, Some(parent)) => {
                writeln!(out, "  {:<24} {:<8} forks from {}", name, class, parent)?;
            }
            (class, None) => {
                writeln!(out, "  {:<24} {}", name, class)?;
            }
        }
    }

    writeln!(out, "changesets ({}):", changesets.len())?;
    for changeset in changesets {
        writeln!(
            out,
            "  [{:>4}] {} {} on {}: {}",
            changeset.id,
            changeset.timestamp.format("%Y-%m-%d %H:%M:%S"),
            changeset.author,
            changeset.lod,
            first_line(&changeset.log),
        )?;
        for rev in &changeset.revisions {
            writeln!(out, "         {} {}", rev.revision, rev.path.display())?;
        }
    }
    Ok(())
}

fn first_line(log: &str) -> &str {
    log.lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manifest_lists_symbols_and_changesets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.txt");
        let mut writer = ManifestWriter::to_path(&path);

        let mut classifications = SymbolClassifications::default();
        classifications.symbols.insert(
            "REL_1".to_string(),
            crate::symbols::ResolvedSymbol {
                classification: Classification::Tag,
                parent: Some(Lod::Trunk),
            },
        );

        let changesets = vec![Changeset {
            id: 1,
            timestamp: Utc.timestamp_opt(986_000_000, 0).unwrap(),
            author: "jrandom".to_string(),
            log: "fix the parser\n\ndetails".to_string(),
            lod: Lod::Trunk,
            revisions: vec![ChangesetRevision {
                path: PathBuf::from("lib/parser.c"),
                revision: "1.2".to_string(),
            }],
        }];

        writer
            .write_history(&[], &classifications, &changesets)
            .unwrap();

        let manifest = std::fs::read_to_string(&path).unwrap();
        assert!(manifest.contains("REL_1"));
        assert!(manifest.contains("forks from trunk"));
        assert!(manifest.contains("fix the parser"));
        assert!(!manifest.contains("details"));
    }
}
