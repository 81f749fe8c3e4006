//! Configuration file loading.
//!
//! `revmap.toml` supplies defaults that command-line options override.
//! An unreadable or unparsable file is reported as a warning and ignored
//! rather than aborting the run; a hints file, by contrast, is an
//! explicit per-symbol override source, so errors in it are fatal
//! configuration errors.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{ConversionError, Result};
use crate::symbols::strategy::DefaultPolicy;
use crate::symbols::{Classification, OverrideRule};

/// `[paths]` section of revmap.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    pub trunk: Option<String>,
    pub branches: Option<String>,
    pub tags: Option<String>,
    #[serde(default)]
    pub extra: Vec<String>,
}

/// `[symbols]` section of revmap.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SymbolsSection {
    pub default_policy: Option<DefaultPolicy>,
    pub keep_trivial_imports: Option<bool>,
    #[serde(default)]
    pub force_branch: Vec<String>,
    #[serde(default)]
    pub force_tag: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Path to a TOML hints file mapping symbol names to classes.
    pub hints: Option<String>,
}

impl SymbolsSection {
    pub fn is_empty(&self) -> bool {
        self.default_policy.is_none()
            && self.keep_trivial_imports.is_none()
            && self.force_branch.is_empty()
            && self.force_tag.is_empty()
            && self.exclude.is_empty()
            && self.hints.is_none()
    }
}

/// One `[[transform]]` entry: either a rename or an ignore.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformSection {
    pub pattern: String,
    pub replacement: Option<String>,
    #[serde(default)]
    pub ignore: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub symbols: SymbolsSection,
    #[serde(default, rename = "transform")]
    pub transforms: Vec<TransformSection>,
}

/// Parse a revmap.toml document.
pub fn parse_config(contents: &str) -> std::result::Result<FileConfig, String> {
    toml::from_str(contents).map_err(|e| format!("failed to parse revmap.toml: {}", e))
}

/// Load revmap.toml from `path` if it exists; parse problems warn and
/// fall back to defaults.
pub fn try_load_config(path: &Path) -> Option<FileConfig> {
    if !path.is_file() {
        return None;
    }
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("Warning: cannot read {}: {}. Ignoring it.", path.display(), e);
            return None;
        }
    };
    match parse_config(&contents) {
        Ok(config) => {
            log::debug!("loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            eprintln!("Warning: {}. Ignoring {}.", e, path.display());
            None
        }
    }
}

/// Load a hints file: a flat TOML table of `SYMBOL = "branch" | "tag" |
/// "excluded"` entries, in file order.
pub fn load_hints(path: &Path) -> Result<Vec<OverrideRule>> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ConversionError::config(format!("cannot read hints file {}: {}", path.display(), e))
    })?;
    let table: BTreeMap<String, String> = toml::from_str(&contents).map_err(|e| {
        ConversionError::config(format!("invalid hints file {}: {}", path.display(), e))
    })?;

    let mut hints = Vec::with_capacity(table.len());
    for (name, class) in table {
        let classification = match class.as_str() {
            "branch" => Classification::Branch,
            "tag" => Classification::Tag,
            "excluded" | "exclude" => Classification::Excluded,
            other => {
                return Err(ConversionError::config(format!(
                    "hint for '{}' has unknown class '{}' \
                     (expected branch, tag, or excluded)",
                    name, other
                )))
            }
        };
        hints.push(OverrideRule::Hint {
            name,
            classification,
        });
    }
    Ok(hints)
}
