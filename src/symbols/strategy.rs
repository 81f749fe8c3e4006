//! Symbol strategy engine.
//!
//! Classification is a chain-of-responsibility over a closed set of rule
//! kinds, applied in fixed priority order. The first rule to commit a
//! decision for a symbol wins; override rules run first (in the order
//! the user configured them) and are never revisited. After every symbol
//! is classified, preferred-parent selection runs over all branches and
//! tags.

use std::fmt;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{ConversionError, Result};
use crate::symbols::{
    Classification, ResolvedSymbol, SymbolClassifications, SymbolStats, SymbolUsageStats,
};

/// Policy applied to symbols no earlier rule decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultPolicy {
    /// Leave undecided; any remaining symbol is a fatal ambiguity.
    Strict,
    /// Treat every remaining symbol as a branch.
    Branch,
    /// Treat every remaining symbol as a tag.
    Tag,
    /// Branch if the symbol roots actual commits anywhere, otherwise
    /// per-file majority with ties in favor of Branch.
    #[default]
    Heuristic,
}

impl fmt::Display for DefaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DefaultPolicy::Strict => "strict",
            DefaultPolicy::Branch => "branch",
            DefaultPolicy::Tag => "tag",
            DefaultPolicy::Heuristic => "heuristic",
        };
        f.write_str(label)
    }
}

/// User-configured override rules, applied before any other rule in the
/// order they were given. Patterns are compiled whole-name anchored
/// (`^(?:…)$`) at configuration time, so `REL` does not accidentally
/// capture `PRERELEASE`.
#[derive(Debug, Clone)]
pub enum OverrideRule {
    /// Explicit per-symbol hint from a hints file.
    Hint {
        name: String,
        classification: Classification,
    },
    /// Force every matching symbol to be a branch.
    ForceBranch(Regex),
    /// Force every matching symbol to be a tag.
    ForceTag(Regex),
    /// Exclude every matching symbol from the conversion.
    Exclude(Regex),
}

impl OverrideRule {
    fn decide(&self, stats: &SymbolStats) -> Option<Classification> {
        match self {
            OverrideRule::Hint {
                name,
                classification,
            } => (name == &stats.name).then_some(*classification),
            OverrideRule::ForceBranch(pattern) => pattern
                .is_match(&stats.name)
                .then_some(Classification::Branch),
            OverrideRule::ForceTag(pattern) => {
                pattern.is_match(&stats.name).then_some(Classification::Tag)
            }
            OverrideRule::Exclude(pattern) => pattern
                .is_match(&stats.name)
                .then_some(Classification::Excluded),
        }
    }
}

/// One link in the classification chain.
#[derive(Debug, Clone)]
enum StrategyRule {
    Override(OverrideRule),
    TrivialImportExclusion,
    UnambiguousUsage,
    Default(DefaultPolicy),
}

impl StrategyRule {
    fn decide(&self, stats: &SymbolStats) -> Option<Classification> {
        match self {
            StrategyRule::Override(rule) => rule.decide(stats),
            StrategyRule::TrivialImportExclusion => stats
                .trivial_import
                .then_some(Classification::Excluded),
            StrategyRule::UnambiguousUsage => {
                if stats.branch_files > 0 && stats.tag_files == 0 {
                    Some(Classification::Branch)
                } else if stats.tag_files > 0 && stats.branch_files == 0 {
                    Some(Classification::Tag)
                } else {
                    None
                }
            }
            StrategyRule::Default(policy) => match policy {
                DefaultPolicy::Strict => None,
                DefaultPolicy::Branch => Some(Classification::Branch),
                DefaultPolicy::Tag => Some(Classification::Tag),
                DefaultPolicy::Heuristic => {
                    if stats.branch_commit_files > 0 || stats.branch_files >= stats.tag_files {
                        Some(Classification::Branch)
                    } else {
                        Some(Classification::Tag)
                    }
                }
            },
        }
    }
}

/// The assembled rule chain plus preferred-parent selection.
#[derive(Debug, Clone)]
pub struct StrategyEngine {
    rules: Vec<StrategyRule>,
    policy: DefaultPolicy,
}

impl StrategyEngine {
    pub fn new(
        overrides: Vec<OverrideRule>,
        keep_trivial_imports: bool,
        policy: DefaultPolicy,
    ) -> Self {
        let mut rules: Vec<StrategyRule> =
            overrides.into_iter().map(StrategyRule::Override).collect();
        if !keep_trivial_imports {
            rules.push(StrategyRule::TrivialImportExclusion);
        }
        rules.push(StrategyRule::UnambiguousUsage);
        rules.push(StrategyRule::Default(policy));
        Self { rules, policy }
    }

    /// Resolve every symbol in `stats` to exactly one classification and,
    /// for branches and tags, a fork parent.
    ///
    /// Under the `strict` policy, every ambiguous symbol is logged with
    /// its per-file evidence and the first one is returned as the run's
    /// fatal error.
    pub fn classify_all(&self, stats: &SymbolUsageStats) -> Result<SymbolClassifications> {
        let mut table = SymbolClassifications::default();
        let mut first_ambiguous: Option<ConversionError> = None;

        for symbol in stats.iter() {
            let classification = self.classify_one(symbol);

            if classification == Classification::Undecided {
                debug_assert_eq!(self.policy, DefaultPolicy::Strict);
                let err =
                    ConversionError::ambiguity(symbol.name.clone(), symbol.evidence.clone());
                log::error!("{}", err);
                first_ambiguous.get_or_insert(err);
                continue;
            }

            let parent = match classification {
                Classification::Branch | Classification::Tag => {
                    symbol.preferred_parent().cloned()
                }
                _ => None,
            };

            table.symbols.insert(
                symbol.name.clone(),
                ResolvedSymbol {
                    classification,
                    parent,
                },
            );
        }

        match first_ambiguous {
            Some(err) => Err(err),
            None => Ok(table),
        }
    }

    fn classify_one(&self, stats: &SymbolStats) -> Classification {
        for rule in &self.rules {
            if let Some(classification) = rule.decide(stats) {
                return classification;
            }
        }
        Classification::Undecided
    }
}
