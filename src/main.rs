use anyhow::Result;
use clap::Parser;

use revmap::artifact::ArtifactStore;
use revmap::cli::{Cli, Commands};
use revmap::config::{loader, RunConfig};
use revmap::context::RunContext;
use revmap::passes::{default_passes, PassManager};
use revmap::project::Project;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        command @ Commands::Convert { .. } => run_conversion(command),
        Commands::ListPasses => {
            // The pipeline shape does not depend on configuration.
            let config = placeholder_config()?;
            let manager = PassManager::new(default_passes(&config))?;
            print!("{}", manager.help_passes());
            Ok(())
        }
    }
}

fn run_conversion(command: Commands) -> Result<()> {
    let (options, config_path) = command.into_options();
    let file_config = loader::try_load_config(&config_path).unwrap_or_default();
    let config = RunConfig::from_options(options, file_config)?;

    let mut project = Project::new(
        1,
        &config.corpus,
        &config.trunk_path,
        &config.branches_path,
        &config.tags_path,
    )?;
    project.set_extra_directories(config.extra_directories.clone())?;
    project.set_symbol_transforms(config.transforms.clone());

    let store = ArtifactStore::open(&config.workdir)?;
    let mut manager = PassManager::new(default_passes(&config))?;
    let (start, end) = manager.resolve_range(config.pass_range.as_deref())?;

    let mut ctx = RunContext::new(config, vec![project]);
    manager.run(&mut ctx, &store, start, end)?;
    Ok(())
}

fn placeholder_config() -> Result<RunConfig> {
    Ok(RunConfig::from_options(
        revmap::config::ConversionOptions {
            corpus: "corpus.json".into(),
            ..Default::default()
        },
        Default::default(),
    )?)
}
