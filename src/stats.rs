//! Run-level statistics.
//!
//! One `RunStats` record spans a whole conversion, including conversions
//! split across several invocations: the scheduler persists it as the
//! shared run-statistics artifact after every pass and reloads it when a
//! run resumes from a later start pass.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Wall-clock seconds keyed by pass ordinal (1-based).
    pub pass_durations: BTreeMap<usize, f64>,
    pub files_collected: usize,
    pub revisions_collected: usize,
    pub symbols_classified: usize,
    pub changesets_built: usize,
}

impl RunStats {
    pub fn set_start_time(&mut self, time: DateTime<Utc>) {
        // On a resumed run the original start time is kept.
        if self.start_time.is_none() {
            self.start_time = Some(time);
        }
    }

    pub fn set_end_time(&mut self, time: DateTime<Utc>) {
        self.end_time = Some(time);
    }

    pub fn record_pass_duration(&mut self, ordinal: usize, duration: Duration) {
        self.pass_durations.insert(ordinal, duration.as_secs_f64());
    }

    pub fn total_pass_seconds(&self) -> f64 {
        self.pass_durations.values().sum()
    }

    /// Per-pass timing table, rendered at the end of a run.
    pub fn timings(&self) -> String {
        let mut out = String::from("pass timings:\n");
        for (ordinal, seconds) in &self.pass_durations {
            out.push_str(&format!("  pass {:>2}: {:>8.3}s\n", ordinal, seconds));
        }
        out.push_str(&format!("  total  : {:>8.3}s", self.total_pass_seconds()));
        out
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "conversion statistics:")?;
        writeln!(f, "  files collected     : {}", self.files_collected)?;
        writeln!(f, "  revisions collected : {}", self.revisions_collected)?;
        writeln!(f, "  symbols classified  : {}", self.symbols_classified)?;
        write!(f, "  changesets built    : {}", self.changesets_built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn resumed_run_keeps_original_start_time() {
        let mut stats = RunStats::default();
        let first = Utc.timestamp_opt(100, 0).unwrap();
        let second = Utc.timestamp_opt(200, 0).unwrap();
        stats.set_start_time(first);
        stats.set_start_time(second);
        assert_eq!(stats.start_time, Some(first));
    }

    #[test]
    fn timings_accumulate_across_invocations() {
        let mut stats = RunStats::default();
        stats.record_pass_duration(1, Duration::from_millis(1500));
        stats.record_pass_duration(2, Duration::from_millis(500));
        assert!((stats.total_pass_seconds() - 2.0).abs() < 1e-9);
        assert!(stats.timings().contains("pass  1"));
    }
}
