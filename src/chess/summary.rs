use super::error::{ErrorAccumulator, SortError};
use super::filer::{FileOutcome, GroupingMode};
use super::merge::MergeSummary;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Tally of one filing pass.
#[derive(Debug, Clone, Default)]
pub struct FilingSummary {
    pub records_seen: usize,
    pub files_written: usize,
    pub skipped_incomplete: usize,
    pub skipped_missing_tag: usize,
    pub failed: usize,
    /// Files written per group directory name.
    pub groups: BTreeMap<String, usize>,
    pub failures: ErrorAccumulator,
}

impl FilingSummary {
    pub fn record(&mut self, outcome: &FileOutcome) {
        self.records_seen += 1;
        match outcome {
            FileOutcome::Written(paths) => {
                self.files_written += paths.len();
                for path in paths {
                    let group = path
                        .parent()
                        .and_then(Path::file_name)
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    *self.groups.entry(group).or_insert(0) += 1;
                }
            }
            FileOutcome::SkippedIncomplete => self.skipped_incomplete += 1,
            FileOutcome::SkippedMissingTag => self.skipped_missing_tag += 1,
        }
    }

    pub fn record_failure(&mut self, err: &SortError) {
        self.records_seen += 1;
        self.failed += 1;
        self.failures.push(&err.to_string());
    }

    pub fn merge(mut self, other: FilingSummary) -> FilingSummary {
        self.records_seen += other.records_seen;
        self.files_written += other.files_written;
        self.skipped_incomplete += other.skipped_incomplete;
        self.skipped_missing_tag += other.skipped_missing_tag;
        self.failed += other.failed;
        for (group, count) in other.groups {
            *self.groups.entry(group).or_insert(0) += count;
        }
        self.failures.merge(other.failures);
        self
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// Everything the `--report` JSON file describes about a run.
pub struct RunReport<'a> {
    pub mode: GroupingMode,
    pub input_files: usize,
    pub unreadable_inputs: usize,
    pub filing: &'a FilingSummary,
    pub merge: Option<&'a MergeSummary>,
}

impl RunReport<'_> {
    pub fn to_json(&self, generated_at: DateTime<Utc>) -> Value {
        let filing = self.filing;
        let merge = self.merge.map(|merge| {
            json!({
                "directories_merged": merge.directories_merged,
                "files_combined": merge.files_combined,
                "errors": merge.failures.as_deref(),
            })
        });

        json!({
            "generated_at": generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "mode": self.mode.name(),
            "inputs": {
                "files": self.input_files,
                "unreadable": self.unreadable_inputs,
            },
            "records": {
                "seen": filing.records_seen,
                "skipped_incomplete": filing.skipped_incomplete,
                "skipped_missing_tag": filing.skipped_missing_tag,
                "failed": filing.failed,
            },
            "files_written": filing.files_written,
            "groups": filing.groups,
            "errors": filing.failures.as_deref(),
            "merge": merge,
        })
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), SortError> {
        let path = path.as_ref();
        let body = serde_json::to_string_pretty(&self.to_json(Utc::now()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SortError::io(parent, e))?;
        }
        fs::write(path, body + "\n").map_err(|e| SortError::io(path, e))
    }
}
