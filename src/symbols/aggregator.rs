//! Symbol usage aggregation.
//!
//! A pure accumulation pass over the per-file histories: no
//! classification decisions are made here. Given a stable file order the
//! output is fully deterministic, including the first-observed order of
//! candidate parents that the preferred-parent tie-break depends on.

use crate::source::{FileHistory, UsageKind};
use crate::symbols::{FileEvidence, ParentCandidate, SymbolUsageStats};

/// Collect per-file symbol usage into repository-wide statistics.
pub fn aggregate(histories: &[FileHistory]) -> SymbolUsageStats {
    let mut stats = SymbolUsageStats::default();

    for history in histories {
        let initial = history.initial_revision_id().map(str::to_string);

        for usage in &history.symbols {
            let record = stats.entry(&usage.name);

            match usage.kind {
                UsageKind::BranchRoot { commits } => {
                    record.branch_files += 1;
                    if commits > 0 {
                        record.branch_commit_files += 1;
                    }
                    // A lone single-commit branch sprouting from the
                    // file's initial revision is the signature of a
                    // vendor/bulk import side effect.
                    record.trivial_import = record.branch_files == 1
                        && record.tag_files == 0
                        && record.reference_files == 0
                        && commits == 1
                        && initial.as_deref() == Some(usage.sprout_revision.as_str());
                }
                UsageKind::Tag => {
                    record.tag_files += 1;
                    record.trivial_import = false;
                }
                UsageKind::Reference => {
                    record.reference_files += 1;
                    record.trivial_import = false;
                }
            }

            match record
                .candidates
                .iter_mut()
                .find(|c| c.lod == usage.sprouts_from)
            {
                Some(candidate) => candidate.file_count += 1,
                None => record.candidates.push(ParentCandidate {
                    lod: usage.sprouts_from.clone(),
                    file_count: 1,
                }),
            }

            record.evidence.push(FileEvidence {
                path: history.path.clone(),
                kind: usage.kind,
            });
        }
    }

    stats
}
