use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ConversionOptions;
use crate::symbols::strategy::DefaultPolicy;

#[derive(Parser, Debug)]
#[command(name = "revmap")]
#[command(
    about = "Converts per-file RCS/CVS revision histories into a single linearized repository history",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the conversion pipeline over a parsed corpus
    Convert {
        /// Parsed corpus file (JSON)
        corpus: PathBuf,

        /// Configuration file
        #[arg(short, long, default_value = "revmap.toml")]
        config: PathBuf,

        /// Pass range to run: a single pass or START:END, by number or
        /// name (e.g. "2:4", "collate-symbols", "collect-revs:")
        #[arg(short, long)]
        passes: Option<String>,

        /// Working directory for intermediate artifacts
        #[arg(long, default_value = "revmap-work")]
        workdir: PathBuf,

        /// Manifest output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Convert the trunk only; disables all symbol handling
        #[arg(long)]
        trunk_only: bool,

        /// Keep intermediate artifacts after the run
        #[arg(long)]
        retain_artifacts: bool,

        /// Policy for symbols no other rule decides
        #[arg(long, value_enum)]
        symbol_default: Option<DefaultPolicy>,

        /// Keep branches that exist only as a bulk-import side effect
        #[arg(long)]
        keep_trivial_imports: bool,

        /// Force matching symbols to be branches (whole-name regex)
        #[arg(long = "force-branch", value_name = "REGEX")]
        force_branch: Vec<String>,

        /// Force matching symbols to be tags (whole-name regex)
        #[arg(long = "force-tag", value_name = "REGEX")]
        force_tag: Vec<String>,

        /// Exclude matching symbols from the conversion (whole-name regex)
        #[arg(long = "exclude", value_name = "REGEX")]
        exclude: Vec<String>,

        /// TOML file of per-symbol hints (SYMBOL = "branch"|"tag"|"excluded")
        #[arg(long = "symbol-hints", value_name = "FILE")]
        hints: Option<PathBuf>,

        /// Destination trunk path
        #[arg(long)]
        trunk: Option<String>,

        /// Destination branches path
        #[arg(long)]
        branches: Option<String>,

        /// Destination tags path
        #[arg(long)]
        tags: Option<String>,
    },

    /// List the passes of the conversion pipeline
    ListPasses,
}

impl Commands {
    /// Flatten the convert subcommand into raw conversion options.
    /// Panics on other subcommands; the caller dispatches first.
    pub fn into_options(self) -> (ConversionOptions, PathBuf) {
        match self {
            Commands::Convert {
                corpus,
                config,
                passes,
                workdir,
                output,
                trunk_only,
                retain_artifacts,
                symbol_default,
                keep_trivial_imports,
                force_branch,
                force_tag,
                exclude,
                hints,
                trunk,
                branches,
                tags,
            } => (
                ConversionOptions {
                    corpus,
                    workdir: Some(workdir),
                    output,
                    pass_range: passes,
                    trunk_only,
                    retain_artifacts,
                    default_policy: symbol_default,
                    keep_trivial_imports: keep_trivial_imports.then_some(true),
                    force_branch,
                    force_tag,
                    exclude,
                    hints_file: hints,
                    trunk,
                    branches,
                    tags,
                },
                config,
            ),
            Commands::ListPasses => unreachable!("list-passes has no conversion options"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_flags_map_onto_options() {
        let cli = Cli::parse_from([
            "revmap",
            "convert",
            "corpus.json",
            "--passes",
            "2:3",
            "--trunk-only",
            "--workdir",
            "/tmp/work",
        ]);
        let (options, config_path) = match cli.command {
            command @ Commands::Convert { .. } => command.into_options(),
            _ => panic!("expected convert"),
        };
        assert_eq!(options.corpus, PathBuf::from("corpus.json"));
        assert_eq!(options.pass_range.as_deref(), Some("2:3"));
        assert!(options.trunk_only);
        assert_eq!(options.workdir, Some(PathBuf::from("/tmp/work")));
        assert_eq!(config_path, PathBuf::from("revmap.toml"));
    }

    #[test]
    fn unset_symbol_flags_stay_unset() {
        let cli = Cli::parse_from(["revmap", "convert", "corpus.json"]);
        let (options, _) = match cli.command {
            command @ Commands::Convert { .. } => command.into_options(),
            _ => panic!("expected convert"),
        };
        assert!(options.default_policy.is_none());
        assert!(options.keep_trivial_imports.is_none());
        assert!(options.force_branch.is_empty());
    }
}
