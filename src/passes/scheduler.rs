//! Pass scheduling and the run loop.

use std::fmt::Write as _;
use std::time::Instant;

use chrono::Utc;

use crate::artifact::{ArtifactRegistry, ArtifactStore, RUN_STATS_ARTIFACT};
use crate::context::RunContext;
use crate::errors::{ConversionError, Result};
use crate::passes::Pass;
use crate::stats::RunStats;

/// Virtual producer of the shared run-statistics artifact: the run
/// itself, completing after the last pass.
const RUN_PRODUCER: &str = "<run>";

/// Manages a fixed, ordered list of passes that can be executed all at
/// once or split across invocations. Passes are numbered starting at 1.
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    pub fn new(passes: Vec<Box<dyn Pass>>) -> Result<Self> {
        let mut seen = std::collections::BTreeSet::new();
        for pass in &passes {
            if !seen.insert(pass.name()) {
                return Err(ConversionError::lifecycle(format!(
                    "duplicate pass name '{}'",
                    pass.name()
                )));
            }
        }
        Ok(Self { passes })
    }

    pub fn num_passes(&self) -> usize {
        self.passes.len()
    }

    /// Indices and names of the available passes.
    pub fn help_passes(&self) -> String {
        let mut out = String::from("passes:\n");
        for (i, pass) in self.passes.iter().enumerate() {
            let _ = writeln!(out, "  {:>2} : {}", i + 1, pass.name());
        }
        out
    }

    /// Resolve a `--passes` selection into a 1-based `(start, end)`
    /// range. Accepts a single pass (`3` or `collate-symbols`) or a
    /// range with either bound open (`2:4`, `collect-revs:`, `:3`).
    pub fn resolve_range(&self, spec: Option<&str>) -> Result<(usize, usize)> {
        let spec = match spec {
            None => return Ok((1, self.num_passes())),
            Some(spec) => spec.trim(),
        };

        let (start, end) = match spec.split_once(':') {
            None => {
                let single = self.resolve_token(spec)?;
                (single, single)
            }
            Some((left, right)) => {
                let start = if left.is_empty() {
                    1
                } else {
                    self.resolve_token(left)?
                };
                let end = if right.is_empty() {
                    self.num_passes()
                } else {
                    self.resolve_token(right)?
                };
                (start, end)
            }
        };

        if start > end {
            return Err(ConversionError::config(format!(
                "pass range '{}' is empty (start {} after end {})",
                spec, start, end
            )));
        }
        Ok((start, end))
    }

    fn resolve_token(&self, token: &str) -> Result<usize> {
        if let Ok(number) = token.parse::<usize>() {
            if number < 1 || number > self.num_passes() {
                return Err(ConversionError::config(format!(
                    "pass number {} out of range 1..{}",
                    number,
                    self.num_passes()
                )));
            }
            return Ok(number);
        }
        self.passes
            .iter()
            .position(|p| p.name() == token)
            .map(|i| i + 1)
            .ok_or_else(|| {
                ConversionError::config(format!(
                    "unknown pass '{}'; use --list-passes to see the pipeline",
                    token
                ))
            })
    }

    /// Run passes `start..=end` (1-based), one after another.
    ///
    /// Passes before `start` are classified skipped, passes after `end`
    /// deferred, before the loop begins. A pass failure aborts
    /// immediately with no artifact released; the run can be resumed by
    /// re-invoking with an adjusted start index.
    pub fn run(
        &mut self,
        ctx: &mut RunContext,
        store: &ArtifactStore,
        start: usize,
        end: usize,
    ) -> Result<()> {
        if start < 1 || start > end || end > self.num_passes() {
            return Err(ConversionError::config(format!(
                "invalid pass range {}:{} for a {}-pass pipeline",
                start,
                end,
                self.num_passes()
            )));
        }

        let mut registry = ArtifactRegistry::new(ctx.config().retain_artifacts);
        registry.register(RUN_STATS_ARTIFACT, RUN_PRODUCER)?;
        for pass in &self.passes {
            // The statistics artifact is needed by every pass.
            registry.register_need(RUN_STATS_ARTIFACT, pass.name())?;
            pass.register_artifacts(&mut registry)?;
        }
        for pass in &self.passes[..start - 1] {
            registry.mark_pass_skipped(pass.name());
        }
        for pass in &self.passes[end..] {
            registry.mark_pass_deferred(pass.name());
        }
        registry.verify_skipped_artifacts(store)?;

        if start > 1 && store.exists(RUN_STATS_ARTIFACT) {
            // Resumed run: pick up timings from the earlier invocation.
            ctx.stats = store.read::<RunStats>(RUN_STATS_ARTIFACT)?;
        }
        ctx.stats.set_start_time(Utc::now());

        for ordinal in start..=end {
            let name = self.passes[ordinal - 1].name();
            log::info!("----- pass {} ({}) -----", ordinal, name);

            let begun = Instant::now();
            self.passes[ordinal - 1].run(ctx, store)?;
            ctx.stats.record_pass_duration(ordinal, begun.elapsed());
            ctx.stats.set_end_time(Utc::now());

            ctx.reset_scratch();
            store.write(RUN_STATS_ARTIFACT, &ctx.stats)?;
            registry.mark_pass_complete(name, store)?;
        }

        log::info!("{}", ctx.stats);
        log::info!("{}", ctx.stats.timings());

        registry.mark_pass_complete(RUN_PRODUCER, store)?;
        registry.check_consistency()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConversionOptions, RunConfig};

    /// A pass that records its execution order and exercises scratch
    /// state.
    struct ProbePass {
        name: &'static str,
        produces: Vec<&'static str>,
        needs: Vec<&'static str>,
        fail: bool,
    }

    impl ProbePass {
        fn boxed(
            name: &'static str,
            produces: Vec<&'static str>,
            needs: Vec<&'static str>,
        ) -> Box<dyn Pass> {
            Box::new(Self {
                name,
                produces,
                needs,
                fail: false,
            })
        }
    }

    impl Pass for ProbePass {
        fn name(&self) -> &'static str {
            self.name
        }

        fn register_artifacts(&self, registry: &mut ArtifactRegistry) -> Result<()> {
            for artifact in &self.produces {
                registry.register(artifact, self.name)?;
            }
            for artifact in &self.needs {
                registry.register_need(artifact, self.name)?;
            }
            Ok(())
        }

        fn run(&mut self, ctx: &mut RunContext, store: &ArtifactStore) -> Result<()> {
            // Entering a pass, the previous pass's scratch must be gone.
            assert!(ctx.scratch.is_empty());
            ctx.scratch.usage = Some(Default::default());
            if self.fail {
                return Err(ConversionError::config("probe failure"));
            }
            for artifact in &self.produces {
                store.write(artifact, &self.name)?;
            }
            Ok(())
        }
    }

    fn context() -> RunContext {
        let config = RunConfig::from_options(
            ConversionOptions {
                corpus: "corpus.json".into(),
                ..Default::default()
            },
            Default::default(),
        )
        .unwrap();
        RunContext::new(config, Vec::new())
    }

    fn store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("work")).unwrap();
        (dir, store)
    }

    fn three_pass_manager() -> PassManager {
        PassManager::new(vec![
            ProbePass::boxed("one", vec!["a"], vec![]),
            ProbePass::boxed("two", vec!["b"], vec!["a"]),
            ProbePass::boxed("three", vec![], vec!["a", "b"]),
        ])
        .unwrap()
    }

    #[test]
    fn full_run_releases_everything() {
        let (_dir, store) = store();
        let mut ctx = context();
        let mut manager = three_pass_manager();
        manager.run(&mut ctx, &store, 1, 3).unwrap();
        assert!(!store.exists("a"));
        assert!(!store.exists("b"));
        assert!(!store.exists(RUN_STATS_ARTIFACT));
        assert_eq!(ctx.stats.pass_durations.len(), 3);
    }

    #[test]
    fn split_run_retains_artifacts_for_deferred_passes() {
        let (_dir, store) = store();
        let mut ctx = context();
        let mut manager = three_pass_manager();
        manager.run(&mut ctx, &store, 1, 2).unwrap();
        // Pass "three" was deferred and still needs both.
        assert!(store.exists("a"));
        assert!(store.exists("b"));
        assert!(store.exists(RUN_STATS_ARTIFACT));

        let mut ctx = context();
        let mut manager = three_pass_manager();
        manager.run(&mut ctx, &store, 3, 3).unwrap();
        assert!(!store.exists("a"));
        assert!(!store.exists("b"));
        // Timings from the first invocation were resumed.
        assert_eq!(ctx.stats.pass_durations.len(), 3);
    }

    #[test]
    fn resuming_without_prior_artifacts_is_a_config_error() {
        let (_dir, store) = store();
        let mut ctx = context();
        let mut manager = three_pass_manager();
        let err = manager.run(&mut ctx, &store, 2, 3).unwrap_err();
        assert!(err.to_string().contains("configuration error"));
    }

    #[test]
    fn failing_pass_aborts_without_releasing() {
        let (_dir, store) = store();
        let mut ctx = context();
        let mut manager = PassManager::new(vec![
            ProbePass::boxed("one", vec!["a"], vec![]),
            Box::new(ProbePass {
                name: "two",
                produces: vec![],
                needs: vec!["a"],
                fail: true,
            }),
        ])
        .unwrap();
        assert!(manager.run(&mut ctx, &store, 1, 2).is_err());
        // "a" was not released; the failed run is left for inspection.
        assert!(store.exists("a"));
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let (_dir, store) = store();
        let mut ctx = context();
        let mut manager = three_pass_manager();
        assert!(manager.run(&mut ctx, &store, 0, 2).is_err());
        assert!(manager.run(&mut ctx, &store, 2, 1).is_err());
        assert!(manager.run(&mut ctx, &store, 1, 4).is_err());
    }

    #[test]
    fn range_resolution_accepts_numbers_and_names() {
        let manager = three_pass_manager();
        assert_eq!(manager.resolve_range(None).unwrap(), (1, 3));
        assert_eq!(manager.resolve_range(Some("2")).unwrap(), (2, 2));
        assert_eq!(manager.resolve_range(Some("two")).unwrap(), (2, 2));
        assert_eq!(manager.resolve_range(Some("1:2")).unwrap(), (1, 2));
        assert_eq!(manager.resolve_range(Some("two:")).unwrap(), (2, 3));
        assert_eq!(manager.resolve_range(Some(":two")).unwrap(), (1, 2));
        assert!(manager.resolve_range(Some("nope")).is_err());
        assert!(manager.resolve_range(Some("3:1")).is_err());
        assert!(manager.resolve_range(Some("4")).is_err());
    }

    #[test]
    fn help_passes_lists_ordinals() {
        let listing = three_pass_manager().help_passes();
        assert!(listing.contains(" 1 : one"));
        assert!(listing.contains(" 3 : three"));
    }
}
