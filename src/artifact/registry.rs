//! Artifact lifecycle bookkeeping.
//!
//! The registry tracks, for every named artifact, which pass produces it
//! and which passes still need it. Passes outside the active range are
//! classified before the run loop starts: passes before the start index
//! are *skipped* (their artifacts are assumed on disk from a prior
//! invocation), passes after the end index are *deferred* (their future
//! needs pin artifacts for the rest of this invocation). After each
//! completed pass, any artifact whose consumer set has drained is
//! released and its backing file deleted, unless the run retains
//! intermediate data or a deferred pass still needs it.

use std::collections::{BTreeMap, BTreeSet};

use crate::artifact::ArtifactStore;
use crate::errors::{ConversionError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Registered, not yet materialized by its producer.
    Pending,
    /// Materialized (or assumed on disk for a skipped producer).
    Active,
    /// No remaining consumer; backing storage removed (or retained on
    /// request).
    Released,
}

#[derive(Debug)]
struct ArtifactEntry {
    producer: String,
    consumers: BTreeSet<String>,
    state: Retention,
    /// Needed by a pass after the active end index; never released
    /// during this invocation.
    deferred: bool,
}

#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    entries: BTreeMap<String, ArtifactEntry>,
    retain_artifacts: bool,
}

impl ArtifactRegistry {
    pub fn new(retain_artifacts: bool) -> Self {
        Self {
            entries: BTreeMap::new(),
            retain_artifacts,
        }
    }

    /// Declare that `producer` materializes `name`.
    pub fn register(&mut self, name: &str, producer: &str) -> Result<()> {
        if let Some(existing) = self.entries.get(name) {
            return Err(ConversionError::lifecycle(format!(
                "artifact '{}' registered by both '{}' and '{}'",
                name, existing.producer, producer
            )));
        }
        self.entries.insert(
            name.to_string(),
            ArtifactEntry {
                producer: producer.to_string(),
                consumers: BTreeSet::new(),
                state: Retention::Pending,
                deferred: false,
            },
        );
        Ok(())
    }

    /// Declare that `consumer` reads `name`. The artifact must already be
    /// registered; a need for an unregistered artifact is a wiring bug
    /// caught before any pass runs.
    pub fn register_need(&mut self, name: &str, consumer: &str) -> Result<()> {
        let entry = self.entries.get_mut(name).ok_or_else(|| {
            ConversionError::lifecycle(format!(
                "pass '{}' declared a need for unregistered artifact '{}'",
                consumer, name
            ))
        })?;
        entry.consumers.insert(consumer.to_string());
        Ok(())
    }

    pub fn state(&self, name: &str) -> Option<Retention> {
        self.entries.get(name).map(|e| e.state)
    }

    /// A pass before the active start index: its artifacts are assumed
    /// already present on disk, and it will not consume anything this
    /// invocation.
    pub fn mark_pass_skipped(&mut self, pass: &str) {
        for entry in self.entries.values_mut() {
            if entry.producer == pass && entry.state == Retention::Pending {
                entry.state = Retention::Active;
            }
            entry.consumers.remove(pass);
        }
    }

    /// A pass after the active end index: anything it needs must survive
    /// this invocation.
    pub fn mark_pass_deferred(&mut self, pass: &str) {
        for entry in self.entries.values_mut() {
            if entry.consumers.remove(pass) {
                entry.deferred = true;
            }
        }
    }

    /// Artifacts assumed on disk from skipped passes must actually be
    /// there before the run loop starts, for every artifact an active
    /// pass will read.
    pub fn verify_skipped_artifacts(&self, store: &ArtifactStore) -> Result<()> {
        let mut missing: Vec<&str> = Vec::new();
        for (name, entry) in &self.entries {
            if entry.state == Retention::Active
                && !entry.consumers.is_empty()
                && !store.exists(name)
            {
                missing.push(name);
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConversionError::config(format!(
                "artifact(s) {} required from skipped passes are not in the \
                 working directory; re-run from an earlier pass",
                missing
                    .iter()
                    .map(|n| format!("'{}'", n))
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }

    /// A pass in the active range finished. Its products must now exist;
    /// its needs are satisfied, and artifacts with no remaining consumer
    /// are released.
    pub fn mark_pass_complete(&mut self, pass: &str, store: &ArtifactStore) -> Result<()> {
        for (name, entry) in self.entries.iter_mut() {
            if entry.producer == pass && entry.state == Retention::Pending {
                if !store.exists(name) {
                    return Err(ConversionError::lifecycle(format!(
                        "pass '{}' completed without materializing artifact '{}'",
                        pass, name
                    )));
                }
                entry.state = Retention::Active;
            }
            entry.consumers.remove(pass);
        }
        self.release_unneeded(store)
    }

    fn release_unneeded(&mut self, store: &ArtifactStore) -> Result<()> {
        for (name, entry) in self.entries.iter_mut() {
            if entry.state == Retention::Active && entry.consumers.is_empty() && !entry.deferred {
                if !self.retain_artifacts {
                    store.delete(name)?;
                }
                entry.state = Retention::Released;
            }
        }
        Ok(())
    }

    /// End-of-run invariant: nothing may still be active without a
    /// remaining consumer. A violation is a bookkeeping bug in revmap.
    pub fn check_consistency(&self) -> Result<()> {
        let mut leaked: Vec<&str> = Vec::new();
        for (name, entry) in &self.entries {
            if entry.state == Retention::Active && entry.consumers.is_empty() && !entry.deferred {
                leaked.push(name);
            }
        }
        if leaked.is_empty() {
            Ok(())
        } else {
            Err(ConversionError::lifecycle(format!(
                "artifact(s) {} still active with no remaining consumer",
                leaked
                    .iter()
                    .map(|n| format!("'{}'", n))
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }
}
