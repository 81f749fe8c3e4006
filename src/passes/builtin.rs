//! The standard conversion pipeline.
//!
//! 1. `collect-revs`   - scan the source corpus, apply symbol
//!    transforms, aggregate symbol usage.
//! 2. `collate-symbols` - resolve every symbol to branch/tag/excluded.
//! 3. `build-changesets` - linearize surviving revisions into
//!    repository-wide changesets.
//! 4. `output`          - drive the destination-history writer.

use std::collections::HashMap;

use chrono::Duration;

use crate::artifact::{
    ArtifactRegistry, ArtifactStore, CHANGESETS_ARTIFACT, REVISIONS_ARTIFACT,
    SYMBOL_CLASSES_ARTIFACT, SYMBOL_USAGE_ARTIFACT,
};
use crate::config::RunConfig;
use crate::context::RunContext;
use crate::errors::Result;
use crate::output::{Changeset, ChangesetRevision, HistoryWriter, ManifestWriter};
use crate::passes::Pass;
use crate::source::{FileHistory, JsonSource, Lod, RevisionSource};
use crate::symbols::{aggregate, StrategyEngine, SymbolClassifications, SymbolUsageStats};

/// Revisions by the same author with the same log message coalesce into
/// one changeset when they fall within this window of the first one.
const COALESCE_WINDOW_SECONDS: i64 = 300;

/// Build the standard pipeline for a configured run.
///
/// The pipeline converts one project per run: the CLI constructs a
/// single `Project`, and the collection pass reads its symbol
/// transforms from it.
pub fn default_passes(config: &RunConfig) -> Vec<Box<dyn Pass>> {
    let writer: Box<dyn HistoryWriter> = match &config.output {
        Some(path) => Box::new(ManifestWriter::to_path(path)),
        None => Box::new(ManifestWriter::to_stdout()),
    };
    vec![
        Box::new(CollectRevsPass::new(Box::new(JsonSource::new(
            &config.corpus,
        )))),
        Box::new(CollateSymbolsPass),
        Box::new(BuildChangesetsPass),
        Box::new(OutputPass::new(writer)),
    ]
}

/// Pass 1: read the corpus, rename/omit symbols per the project
/// transform rules, populate project trunk/root identifiers, and
/// aggregate per-symbol usage statistics.
pub struct CollectRevsPass {
    source: Box<dyn RevisionSource>,
}

impl CollectRevsPass {
    pub fn new(source: Box<dyn RevisionSource>) -> Self {
        Self { source }
    }
}

impl Pass for CollectRevsPass {
    fn name(&self) -> &'static str {
        "collect-revs"
    }

    fn register_artifacts(&self, registry: &mut ArtifactRegistry) -> Result<()> {
        registry.register(REVISIONS_ARTIFACT, self.name())?;
        registry.register(SYMBOL_USAGE_ARTIFACT, self.name())
    }

    fn run(&mut self, ctx: &mut RunContext, store: &ArtifactStore) -> Result<()> {
        let mut histories = self.source.file_histories()?;

        let mut next_id = 1u32;
        for project in &mut ctx.projects {
            project.set_trunk_id(next_id);
            project.set_root_directory_id(next_id + 1);
            next_id += 2;
        }

        // One project per run; see `default_passes`.
        if let Some(project) = ctx.projects.first() {
            for history in &mut histories {
                apply_transforms(project, history);
            }
        }

        ctx.stats.files_collected = histories.len();
        ctx.stats.revisions_collected = histories.iter().map(|h| h.revisions.len()).sum();
        log::info!(
            "collected {} file(s), {} revision(s)",
            ctx.stats.files_collected,
            ctx.stats.revisions_collected
        );

        let usage = aggregate(&histories);
        log::info!("observed {} distinct symbol(s)", usage.len());

        store.write(REVISIONS_ARTIFACT, &histories)?;
        store.write(SYMBOL_USAGE_ARTIFACT, &usage)
    }
}

/// Rename or omit every symbol mention in one file per the project's
/// transform pipeline, keeping the label graph consistent: branch
/// revisions and sprout references follow their symbol's new name.
fn apply_transforms(project: &crate::project::Project, history: &mut FileHistory) {
    let mut renames: HashMap<String, Option<String>> = HashMap::new();
    for usage in &history.symbols {
        renames
            .entry(usage.name.clone())
            .or_insert_with(|| project.transform_symbol(&usage.name));
    }

    history.symbols.retain_mut(|usage| {
        match renames.get(usage.name.as_str()) {
            Some(Some(new_name)) => {
                usage.name = new_name.clone();
                true
            }
            // Omitted by an ignore rule.
            Some(None) => false,
            None => true,
        }
    });

    let rename_lod = |lod: &mut Lod| {
        if let Lod::Branch(name) = lod {
            if let Some(Some(new_name)) = renames.get(name.as_str()) {
                *name = new_name.clone();
            }
        }
    };
    for revision in &mut history.revisions {
        rename_lod(&mut revision.lod);
    }
    for usage in &mut history.symbols {
        rename_lod(&mut usage.sprouts_from);
    }
}

/// Pass 2: run the symbol strategy engine over the aggregated usage
/// statistics, store the resolved table in the run context, and persist
/// it as an artifact. In trunk-only mode the engine is disabled and the
/// table is empty.
pub struct CollateSymbolsPass;

impl Pass for CollateSymbolsPass {
    fn name(&self) -> &'static str {
        "collate-symbols"
    }

    fn register_artifacts(&self, registry: &mut ArtifactRegistry) -> Result<()> {
        registry.register(SYMBOL_CLASSES_ARTIFACT, self.name())?;
        registry.register_need(SYMBOL_USAGE_ARTIFACT, self.name())
    }

    fn run(&mut self, ctx: &mut RunContext, store: &ArtifactStore) -> Result<()> {
        let usage: SymbolUsageStats = store.read(SYMBOL_USAGE_ARTIFACT)?;

        let table = if ctx.config().trunk_only {
            log::info!("trunk-only conversion; symbol strategy engine disabled");
            SymbolClassifications::default()
        } else {
            let engine = StrategyEngine::new(
                ctx.config().overrides.clone(),
                ctx.config().keep_trivial_imports,
                ctx.config().default_policy,
            );
            engine.classify_all(&usage)?
        };

        ctx.stats.symbols_classified = table.len();
        log::info!("classified {} symbol(s)", table.len());
        store.write(SYMBOL_CLASSES_ARTIFACT, &table)?;
        ctx.classifications = Some(table);
        Ok(())
    }
}

/// The classification table: taken from the run context when the
/// collate pass ran in this invocation, read back from its artifact on
/// a resumed run.
fn symbol_classes(ctx: &RunContext, store: &ArtifactStore) -> Result<SymbolClassifications> {
    match &ctx.classifications {
        Some(table) => Ok(table.clone()),
        None => store.read(SYMBOL_CLASSES_ARTIFACT),
    }
}

/// Pass 3: drop revisions on excluded or tag-classified branches and
/// linearize the survivors into timestamp-ordered changesets.
pub struct BuildChangesetsPass;

impl Pass for BuildChangesetsPass {
    fn name(&self) -> &'static str {
        "build-changesets"
    }

    fn register_artifacts(&self, registry: &mut ArtifactRegistry) -> Result<()> {
        registry.register(CHANGESETS_ARTIFACT, self.name())?;
        registry.register_need(REVISIONS_ARTIFACT, self.name())?;
        registry.register_need(SYMBOL_CLASSES_ARTIFACT, self.name())
    }

    fn run(&mut self, ctx: &mut RunContext, store: &ArtifactStore) -> Result<()> {
        let histories: Vec<FileHistory> = store.read(REVISIONS_ARTIFACT)?;
        let classes = symbol_classes(ctx, store)?;

        let changesets = build_changesets(&histories, &classes, ctx.config().trunk_only);
        ctx.stats.changesets_built = changesets.len();
        log::info!("built {} changeset(s)", changesets.len());

        store.write(CHANGESETS_ARTIFACT, &changesets)
    }
}

fn build_changesets(
    histories: &[FileHistory],
    classes: &SymbolClassifications,
    trunk_only: bool,
) -> Vec<Changeset> {
    struct Item<'a> {
        history: &'a FileHistory,
        revision: &'a crate::source::Revision,
    }

    let mut items: Vec<Item<'_>> = Vec::new();
    for history in histories {
        for revision in &history.revisions {
            let kept = match &revision.lod {
                Lod::Trunk => true,
                Lod::Branch(_) if trunk_only => false,
                Lod::Branch(name) => classes.branch_is_kept(name),
            };
            if kept {
                items.push(Item { history, revision });
            }
        }
    }

    // Deterministic order regardless of corpus layout.
    items.sort_by(|a, b| {
        (
            a.revision.timestamp,
            &a.revision.author,
            &a.revision.log,
            &a.revision.lod,
            &a.history.path,
            &a.revision.id,
        )
            .cmp(&(
                b.revision.timestamp,
                &b.revision.author,
                &b.revision.log,
                &b.revision.lod,
                &b.history.path,
                &b.revision.id,
            ))
    });

    let window = Duration::seconds(COALESCE_WINDOW_SECONDS);
    let mut changesets: Vec<Changeset> = Vec::new();
    for item in items {
        let revision = ChangesetRevision {
            path: item.history.path.clone(),
            revision: item.revision.id.clone(),
        };
        match changesets.last_mut() {
            Some(current)
                if current.author == item.revision.author
                    && current.log == item.revision.log
                    && current.lod == item.revision.lod
                    && item.revision.timestamp - current.timestamp <= window =>
            {
                current.revisions.push(revision);
            }
            _ => changesets.push(Changeset {
                id: changesets.len() as u32 + 1,
                timestamp: item.revision.timestamp,
                author: item.revision.author.clone(),
                log: item.revision.log.clone(),
                lod: item.revision.lod.clone(),
                revisions: vec![revision],
            }),
        }
    }
    changesets
}

/// Pass 4: hand the finished layout, classification table, and changeset
/// sequence to the destination writer.
pub struct OutputPass {
    writer: Box<dyn HistoryWriter>,
}

impl OutputPass {
    pub fn new(writer: Box<dyn HistoryWriter>) -> Self {
        Self { writer }
    }
}

impl Pass for OutputPass {
    fn name(&self) -> &'static str {
        "output"
    }

    fn register_artifacts(&self, registry: &mut ArtifactRegistry) -> Result<()> {
        registry.register_need(CHANGESETS_ARTIFACT, self.name())?;
        registry.register_need(SYMBOL_CLASSES_ARTIFACT, self.name())
    }

    fn run(&mut self, ctx: &mut RunContext, store: &ArtifactStore) -> Result<()> {
        let changesets: Vec<Changeset> = store.read(CHANGESETS_ARTIFACT)?;
        let classes = symbol_classes(ctx, store)?;

        self.writer
            .write_history(&ctx.projects, &classes, &changesets)
    }
}
