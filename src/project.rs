//! Project model: one source root mapped to one destination namespace.

use std::fmt;
use std::path::PathBuf;

use regex::Regex;

use crate::errors::{ConversionError, Result};

/// A destination-path symbol-renaming rule. Rules are applied in order;
/// the first rule that matches a name decides its fate. Patterns are
/// compiled whole-name anchored (`^(?:…)$`) at configuration time.
#[derive(Debug, Clone)]
pub enum SymbolTransformRule {
    /// Rewrite matching names using a regex replacement.
    Rename { pattern: Regex, replacement: String },
    /// Omit matching names from the conversion entirely.
    Ignore(Regex),
}

impl SymbolTransformRule {
    /// `Some(Some(name))` keeps (possibly renamed), `Some(None)` omits,
    /// `None` means this rule does not apply.
    fn apply(&self, name: &str) -> Option<Option<String>> {
        match self {
            SymbolTransformRule::Rename {
                pattern,
                replacement,
            } => {
                if pattern.is_match(name) {
                    Some(Some(pattern.replace(name, replacement.as_str()).into_owned()))
                } else {
                    None
                }
            }
            SymbolTransformRule::Ignore(pattern) => {
                pattern.is_match(name).then_some(None)
            }
        }
    }
}

/// One source root mapped to one destination namespace.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: u32,
    /// Root of the source corpus for this project.
    pub source_root: PathBuf,
    /// Destination paths for the three standard locations.
    pub trunk_path: String,
    pub branches_path: String,
    pub tags_path: String,
    /// Additional destination directories to materialize at creation.
    extra_directories: Vec<String>,
    transforms: Vec<SymbolTransformRule>,
    /// Populated by the collection pass; later passes require them.
    trunk_id: Option<u32>,
    root_directory_id: Option<u32>,
}

impl Project {
    pub fn new(
        id: u32,
        source_root: impl Into<PathBuf>,
        trunk_path: impl Into<String>,
        branches_path: impl Into<String>,
        tags_path: impl Into<String>,
    ) -> Result<Self> {
        let project = Self {
            id,
            source_root: source_root.into(),
            trunk_path: normalize_dest_path(trunk_path.into())?,
            branches_path: normalize_dest_path(branches_path.into())?,
            tags_path: normalize_dest_path(tags_path.into())?,
            extra_directories: Vec::new(),
            transforms: Vec::new(),
            trunk_id: None,
            root_directory_id: None,
        };
        verify_paths_disjoint(&project.initial_directories())?;
        Ok(project)
    }

    pub fn set_extra_directories(&mut self, directories: Vec<String>) -> Result<()> {
        let mut normalized = Vec::with_capacity(directories.len());
        for dir in directories {
            normalized.push(normalize_dest_path(dir)?);
        }
        self.extra_directories = normalized;
        verify_paths_disjoint(&self.initial_directories())
    }

    pub fn set_symbol_transforms(&mut self, transforms: Vec<SymbolTransformRule>) {
        self.transforms = transforms;
    }

    /// Destination directories created when the project is first
    /// materialized. Must be pairwise non-nested.
    pub fn initial_directories(&self) -> Vec<String> {
        let mut dirs = vec![
            self.trunk_path.clone(),
            self.branches_path.clone(),
            self.tags_path.clone(),
        ];
        dirs.extend(self.extra_directories.iter().cloned());
        dirs
    }

    /// Rename `name` per the transform pipeline. Returns `None` when the
    /// symbol should be omitted from the conversion.
    pub fn transform_symbol(&self, name: &str) -> Option<String> {
        for rule in &self.transforms {
            if let Some(decision) = rule.apply(name) {
                return decision;
            }
        }
        Some(name.to_string())
    }

    pub fn set_trunk_id(&mut self, id: u32) {
        self.trunk_id = Some(id);
    }

    pub fn set_root_directory_id(&mut self, id: u32) {
        self.root_directory_id = Some(id);
    }

    /// Available only after the collection pass has run.
    pub fn trunk_id(&self) -> Result<u32> {
        self.trunk_id.ok_or_else(|| {
            ConversionError::lifecycle(format!(
                "project {}: trunk id requested before the collection pass set it",
                self.id
            ))
        })
    }

    /// Available only after the collection pass has run.
    pub fn root_directory_id(&self) -> Result<u32> {
        self.root_directory_id.ok_or_else(|| {
            ConversionError::lifecycle(format!(
                "project {}: root directory id requested before the collection pass set it",
                self.id
            ))
        })
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project {} ({})", self.id, self.source_root.display())
    }
}

/// Strip leading/trailing slashes and reject empty or doubled segments.
fn normalize_dest_path(path: String) -> Result<String> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(ConversionError::config("destination path must not be empty"));
    }
    if trimmed.split('/').any(|segment| segment.is_empty()) {
        return Err(ConversionError::config(format!(
            "destination path '{}' contains an empty segment",
            path
        )));
    }
    Ok(trimmed.to_string())
}

/// Fail if any path is equal to or a path-prefix of another.
pub fn verify_paths_disjoint(paths: &[String]) -> Result<()> {
    let mut sorted: Vec<&String> = paths.iter().collect();
    sorted.sort();
    for pair in sorted.windows(2) {
        let (a, b) = (pair[0].as_str(), pair[1].as_str());
        if a == b || (b.starts_with(a) && b.as_bytes().get(a.len()) == Some(&b'/')) {
            return Err(ConversionError::config(format!(
                "destination paths '{}' and '{}' are not disjoint",
                a, b
            )));
        }
    }
    Ok(())
}
