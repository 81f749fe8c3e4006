//! End-to-end conversion runs over a small corpus: determinism,
//! split-range equivalence, trunk-only mode, and strict-policy
//! resumability.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use revmap::artifact::ArtifactStore;
use revmap::config::{ConversionOptions, RunConfig};
use revmap::context::RunContext;
use revmap::passes::{default_passes, PassManager};
use revmap::project::Project;

/// A corpus with one symbol of every interesting flavor:
/// - `DEVEL`: a real branch with commits in two files
/// - `REL_1`: a plain tag in two files
/// - `MIXED`: branch root in one file, tag in the other (ambiguous)
/// - `VENDOR`: a trivial single-file import branch
fn write_corpus(path: &Path) {
    let corpus = json!({
        "files": [
            {
                "path": "src/main.c",
                "revisions": [
                    {"id": "1.1", "timestamp": "2001-03-04T10:00:00Z",
                     "author": "jrandom", "log": "initial import"},
                    {"id": "1.2", "timestamp": "2001-03-05T09:00:00Z",
                     "author": "jrandom", "log": "add parser"},
                    {"id": "1.2.2.1", "timestamp": "2001-03-06T12:00:00Z",
                     "author": "fitz", "log": "devel work",
                     "lod": {"Branch": "DEVEL"}}
                ],
                "symbols": [
                    {"name": "DEVEL", "kind": "branch_root", "commits": 1,
                     "sprout_revision": "1.2"},
                    {"name": "REL_1", "kind": "tag", "sprout_revision": "1.2"},
                    {"name": "MIXED", "kind": "branch_root", "commits": 0,
                     "sprout_revision": "1.2"}
                ]
            },
            {
                "path": "src/util.c",
                "revisions": [
                    {"id": "1.1", "timestamp": "2001-03-04T10:00:30Z",
                     "author": "jrandom", "log": "initial import"},
                    {"id": "1.1.4.1", "timestamp": "2001-03-06T12:01:00Z",
                     "author": "fitz", "log": "devel work",
                     "lod": {"Branch": "DEVEL"}}
                ],
                "symbols": [
                    {"name": "DEVEL", "kind": "branch_root", "commits": 1,
                     "sprout_revision": "1.1"},
                    {"name": "REL_1", "kind": "tag", "sprout_revision": "1.1"},
                    {"name": "MIXED", "kind": "tag", "sprout_revision": "1.1"}
                ]
            },
            {
                "path": "vendor/blob.c",
                "revisions": [
                    {"id": "1.1", "timestamp": "2001-03-04T10:01:00Z",
                     "author": "jrandom", "log": "initial import"}
                ],
                "symbols": [
                    {"name": "VENDOR", "kind": "branch_root", "commits": 1,
                     "sprout_revision": "1.1"}
                ]
            }
        ]
    });
    fs::write(path, serde_json::to_string_pretty(&corpus).unwrap()).unwrap();
}

struct Setup {
    _dir: TempDir,
    corpus: PathBuf,
    workdir: PathBuf,
    manifest: PathBuf,
}

fn setup() -> Setup {
    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("corpus.json");
    write_corpus(&corpus);
    Setup {
        workdir: dir.path().join("work"),
        manifest: dir.path().join("manifest.txt"),
        corpus,
        _dir: dir,
    }
}

fn config(setup: &Setup, adjust: impl FnOnce(&mut ConversionOptions)) -> RunConfig {
    let mut options = ConversionOptions {
        corpus: setup.corpus.clone(),
        workdir: Some(setup.workdir.clone()),
        output: Some(setup.manifest.clone()),
        ..Default::default()
    };
    adjust(&mut options);
    RunConfig::from_options(options, Default::default()).unwrap()
}

fn run_range(config: &RunConfig, start: usize, end: usize) -> revmap::Result<()> {
    let mut project = Project::new(
        1,
        &config.corpus,
        &config.trunk_path,
        &config.branches_path,
        &config.tags_path,
    )
    .unwrap();
    project.set_symbol_transforms(config.transforms.clone());

    let store = ArtifactStore::open(&config.workdir)?;
    let mut manager = PassManager::new(default_passes(config))?;
    let mut ctx = RunContext::new(config.clone(), vec![project]);
    manager.run(&mut ctx, &store, start, end)
}

#[test]
fn full_run_classifies_and_linearizes() {
    let setup = setup();
    let config = config(&setup, |_| {});
    run_range(&config, 1, 4).unwrap();

    let manifest = fs::read_to_string(&setup.manifest).unwrap();
    assert!(manifest.contains("DEVEL"));
    assert!(manifest.contains("branch"));
    assert!(manifest.contains("REL_1"));
    // Trivial import branch excluded under default settings.
    let vendor_line = manifest
        .lines()
        .find(|line| line.trim_start().starts_with("VENDOR"))
        .unwrap();
    assert!(vendor_line.contains("excluded"), "got: {}", vendor_line);
    // The two same-log imports coalesce into one changeset; devel work
    // forms another; "add parser" a third.
    assert!(manifest.contains("changesets (3):"));
    // Nothing intermediate is left behind on a full run.
    assert_eq!(fs::read_dir(&setup.workdir).unwrap().count(), 0);
}

#[test]
fn two_full_runs_are_deterministic() {
    let first = setup();
    let config_a = config(&first, |_| {});
    run_range(&config_a, 1, 4).unwrap();
    let manifest_a = fs::read_to_string(&first.manifest).unwrap();

    let second = setup();
    let config_b = config(&second, |_| {});
    run_range(&config_b, 1, 4).unwrap();
    let manifest_b = fs::read_to_string(&second.manifest).unwrap();

    assert_eq!(manifest_a, manifest_b);
}

#[test]
fn split_invocations_match_a_single_run() {
    let whole = setup();
    run_range(&config(&whole, |_| {}), 1, 4).unwrap();
    let expected = fs::read_to_string(&whole.manifest).unwrap();

    let split = setup();
    let split_config = config(&split, |_| {});
    run_range(&split_config, 1, 2).unwrap();
    // The deferred passes' inputs survived the first invocation.
    assert!(split.workdir.join("revisions.json").exists());
    assert!(split.workdir.join("symbol-classes.json").exists());
    run_range(&split_config, 3, 4).unwrap();

    assert_eq!(fs::read_to_string(&split.manifest).unwrap(), expected);
}

#[test]
fn strict_policy_aborts_on_ambiguity_and_resumes_after_override() {
    let setup = setup();
    let strict = config(&setup, |options| {
        options.default_policy = Some(revmap::DefaultPolicy::Strict);
    });

    let err = run_range(&strict, 1, 4).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("MIXED"));
    assert!(msg.contains("src/main.c"));
    assert!(msg.contains("src/util.c"));
    // The failed run left the collected artifacts for inspection.
    assert!(setup.workdir.join("symbol-usage.json").exists());

    // Add an override and resume from the classification pass.
    let fixed = config(&setup, |options| {
        options.default_policy = Some(revmap::DefaultPolicy::Strict);
        options.force_branch = vec!["MIXED".to_string()];
    });
    run_range(&fixed, 2, 4).unwrap();

    let manifest = fs::read_to_string(&setup.manifest).unwrap();
    assert!(manifest.contains("MIXED"));
    assert!(manifest.contains("devel work"));
}

#[test]
fn heuristic_policy_resolves_the_same_ambiguity_to_branch() {
    let setup = setup();
    run_range(&config(&setup, |_| {}), 1, 4).unwrap();
    let manifest = fs::read_to_string(&setup.manifest).unwrap();
    let mixed_line = manifest
        .lines()
        .find(|line| line.contains("MIXED"))
        .unwrap();
    assert!(mixed_line.contains("branch"), "got: {}", mixed_line);
}

#[test]
fn trunk_only_run_drops_branches_and_symbols() {
    let setup = setup();
    let config = config(&setup, |options| {
        options.trunk_only = true;
    });
    run_range(&config, 1, 4).unwrap();

    let manifest = fs::read_to_string(&setup.manifest).unwrap();
    assert!(manifest.contains("symbols (0):"));
    assert!(!manifest.contains("devel work"));
    assert!(manifest.contains("initial import"));
}

#[test]
fn retained_artifacts_survive_a_full_run() {
    let setup = setup();
    let config = config(&setup, |options| {
        options.retain_artifacts = true;
    });
    run_range(&config, 1, 4).unwrap();
    assert!(setup.workdir.join("symbol-usage.json").exists());
    assert!(setup.workdir.join("changesets.json").exists());
    assert!(setup.workdir.join("run-stats.json").exists());
}

#[test]
fn forced_tag_overrides_unambiguous_branch_usage() {
    let setup = setup();
    let config = config(&setup, |options| {
        options.force_tag = vec!["DEVEL".to_string()];
    });
    run_range(&config, 1, 4).unwrap();

    let manifest = fs::read_to_string(&setup.manifest).unwrap();
    let devel_line = manifest
        .lines()
        .find(|line| line.trim_start().starts_with("DEVEL"))
        .unwrap();
    assert!(devel_line.contains("tag"), "got: {}", devel_line);
    // Its branch revisions are dropped from the linearized history.
    assert!(!manifest.contains("devel work"));
}

#[test]
fn keep_trivial_imports_reroutes_vendor_branch_through_the_chain() {
    let setup = setup();
    let config = config(&setup, |options| {
        options.keep_trivial_imports = Some(true);
    });
    run_range(&config, 1, 4).unwrap();

    let manifest = fs::read_to_string(&setup.manifest).unwrap();
    let vendor_line = manifest
        .lines()
        .find(|line| line.trim_start().starts_with("VENDOR"))
        .unwrap();
    assert!(vendor_line.contains("branch"), "got: {}", vendor_line);
}
