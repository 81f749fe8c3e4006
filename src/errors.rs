//! Error taxonomy for conversion runs.
//!
//! Errors fall into four categories with different recovery stories:
//!
//! - `Config`: rejected before any pass executes; fixed by changing the
//!   run configuration.
//! - `Ambiguity`: a symbol could not be classified under the `strict`
//!   policy; the run is resumable from the classification pass after an
//!   override rule is added.
//! - `Lifecycle`: an internal invariant of the artifact registry or pass
//!   scheduler was violated; always a bug in revmap, never a user error.
//! - `Artifact` / `Source`: store or corpus I/O failed; the documented
//!   recovery is re-running the scheduler from the same or an adjusted
//!   start pass.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::symbols::FileEvidence;

/// Unified error type for conversion operations.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Invalid run configuration, reported before any pass executes.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A symbol was left undecided under the `strict` policy.
    #[error("{}", format_ambiguity(.symbol, .evidence))]
    Ambiguity {
        symbol: String,
        evidence: Vec<FileEvidence>,
    },

    /// Artifact registry bookkeeping invariant violated. A bug, not a
    /// user-facing condition.
    #[error("internal lifecycle defect: {message}")]
    Lifecycle { message: String },

    /// Artifact store I/O or schema failure.
    #[error("artifact '{name}': {message}")]
    Artifact { name: String, message: String },

    /// Source corpus could not be read or parsed.
    #[error("source corpus {}: {message}", .path.display())]
    Source { path: PathBuf, message: String },
}

impl ConversionError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn ambiguity(symbol: impl Into<String>, evidence: Vec<FileEvidence>) -> Self {
        Self::Ambiguity {
            symbol: symbol.into(),
            evidence,
        }
    }

    pub fn lifecycle(message: impl Into<String>) -> Self {
        Self::Lifecycle {
            message: message.into(),
        }
    }

    pub fn artifact(name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Artifact {
            name: name.into(),
            message: message.to_string(),
        }
    }

    pub fn source(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::Source {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error indicates a revmap bug rather than a problem
    /// with the user's repository or configuration.
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::Lifecycle { .. })
    }
}

fn format_ambiguity(symbol: &str, evidence: &[FileEvidence]) -> String {
    let mut msg = format!(
        "symbol '{}' is ambiguous: used inconsistently across {} file(s)",
        symbol,
        evidence.len()
    );
    for item in evidence {
        msg.push_str(&format!(
            "\n    {}: used as {}",
            item.path.display(),
            item.kind
        ));
    }
    msg.push_str(
        "\n  add a force-branch, force-tag, or exclude rule for this symbol, \
         or choose a non-strict default policy",
    );
    msg
}

pub type Result<T> = std::result::Result<T, ConversionError>;
