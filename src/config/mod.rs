//! Finalized run configuration.
//!
//! The CLI collects raw options, [`loader`] supplies file-based defaults,
//! and [`RunConfig::from_options`] merges and validates both into the
//! immutable configuration object every pass reads. All configuration
//! errors surface here, before any pass executes.

pub mod loader;

use std::path::PathBuf;

use regex::Regex;

use crate::errors::{ConversionError, Result};
use crate::project::SymbolTransformRule;
use crate::symbols::strategy::DefaultPolicy;
use crate::symbols::OverrideRule;

use loader::{FileConfig, TransformSection};

/// Raw, unmerged options as collected from the command line. `None` and
/// empty collections mean "not given"; file configuration fills the
/// gaps.
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    pub corpus: PathBuf,
    pub workdir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub pass_range: Option<String>,
    pub trunk_only: bool,
    pub retain_artifacts: bool,
    pub default_policy: Option<DefaultPolicy>,
    pub keep_trivial_imports: Option<bool>,
    pub force_branch: Vec<String>,
    pub force_tag: Vec<String>,
    pub exclude: Vec<String>,
    pub hints_file: Option<PathBuf>,
    pub trunk: Option<String>,
    pub branches: Option<String>,
    pub tags: Option<String>,
}

/// The finalized configuration object. Immutable after construction;
/// passes read it through the run context without locking.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub corpus: PathBuf,
    pub workdir: PathBuf,
    pub output: Option<PathBuf>,
    pub pass_range: Option<String>,
    pub trunk_only: bool,
    pub retain_artifacts: bool,
    pub default_policy: DefaultPolicy,
    pub keep_trivial_imports: bool,
    pub overrides: Vec<OverrideRule>,
    pub trunk_path: String,
    pub branches_path: String,
    pub tags_path: String,
    pub extra_directories: Vec<String>,
    pub transforms: Vec<SymbolTransformRule>,
}

impl RunConfig {
    /// Merge command-line options over file configuration and validate
    /// the result.
    pub fn from_options(options: ConversionOptions, file: FileConfig) -> Result<Self> {
        let symbol_options_given = options.default_policy.is_some()
            || options.keep_trivial_imports.is_some()
            || !options.force_branch.is_empty()
            || !options.force_tag.is_empty()
            || !options.exclude.is_empty()
            || options.hints_file.is_some()
            || !file.symbols.is_empty();

        if options.trunk_only && symbol_options_given {
            return Err(ConversionError::config(
                "--trunk-only disables symbol handling entirely and cannot be \
                 combined with symbol strategy options",
            ));
        }

        let mut overrides = Vec::new();
        if let Some(hints) = options
            .hints_file
            .as_deref()
            .or(file.symbols.hints.as_deref().map(std::path::Path::new))
        {
            overrides.extend(loader::load_hints(hints)?);
        }
        for pattern in options.force_branch.iter().chain(&file.symbols.force_branch) {
            overrides.push(OverrideRule::ForceBranch(compile_pattern(pattern)?));
        }
        for pattern in options.force_tag.iter().chain(&file.symbols.force_tag) {
            overrides.push(OverrideRule::ForceTag(compile_pattern(pattern)?));
        }
        for pattern in options.exclude.iter().chain(&file.symbols.exclude) {
            overrides.push(OverrideRule::Exclude(compile_pattern(pattern)?));
        }

        let workdir = options
            .workdir
            .unwrap_or_else(|| PathBuf::from("revmap-work"));

        Ok(Self {
            corpus: options.corpus,
            workdir,
            output: options.output,
            pass_range: options.pass_range,
            trunk_only: options.trunk_only,
            retain_artifacts: options.retain_artifacts,
            default_policy: options
                .default_policy
                .or(file.symbols.default_policy)
                .unwrap_or_default(),
            keep_trivial_imports: options
                .keep_trivial_imports
                .or(file.symbols.keep_trivial_imports)
                .unwrap_or(false),
            overrides,
            trunk_path: options
                .trunk
                .or(file.paths.trunk)
                .unwrap_or_else(|| "trunk".to_string()),
            branches_path: options
                .branches
                .or(file.paths.branches)
                .unwrap_or_else(|| "branches".to_string()),
            tags_path: options
                .tags
                .or(file.paths.tags)
                .unwrap_or_else(|| "tags".to_string()),
            extra_directories: file.paths.extra,
            transforms: compile_transforms(&file.transforms)?,
        })
    }
}

/// Symbol patterns decide on whole names: anchoring at compile time
/// keeps `REL` from capturing `PRERELEASE` and makes alternations like
/// `R|REL` match either alternative in full.
fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
        ConversionError::config(format!("invalid symbol pattern '{}': {}", pattern, e))
    })
}

fn compile_transforms(sections: &[TransformSection]) -> Result<Vec<SymbolTransformRule>> {
    let mut rules = Vec::with_capacity(sections.len());
    for section in sections {
        let pattern = compile_pattern(&section.pattern)?;
        let rule = match (&section.replacement, section.ignore) {
            (Some(_), true) => {
                return Err(ConversionError::config(format!(
                    "transform '{}' cannot both rename and ignore",
                    section.pattern
                )))
            }
            (Some(replacement), false) => SymbolTransformRule::Rename {
                pattern,
                replacement: replacement.clone(),
            },
            (None, true) => SymbolTransformRule::Ignore(pattern),
            (None, false) => {
                return Err(ConversionError::config(format!(
                    "transform '{}' needs either a replacement or ignore = true",
                    section.pattern
                )))
            }
        };
        rules.push(rule);
    }
    Ok(rules)
}
