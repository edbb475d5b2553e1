//! In-memory representation of one reconciliation run: the commits and diff
//! fetched from version control, the coverage snapshot fetched from the
//! coverage service, and the per-line verdicts produced by joining them.

use std::collections::BTreeMap;

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// Coverage percentage rounded to two decimal places.
#[must_use]
pub fn percentage(covered: u64, total: u64) -> f64 {
    (rate(covered, total) * 100.0 * 100.0).round() / 100.0
}

/// A commit in the repository history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    pub sha: String,
    /// Index in the newest-first history listing it came from.
    pub position: usize,
}

/// A file touched between two commits.
#[derive(Debug, Clone)]
pub struct ChangedFile {
    pub path: String,
    /// Unified-diff hunks for the file. `None` for binary or oversized diffs.
    pub patch: Option<String>,
}

/// The coverage service's record for a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageRepo {
    pub id: String,
}

/// A coverage snapshot keyed to a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestReport {
    pub id: String,
    pub commit_sha: String,
}

/// Per-line hit counts for one file of a snapshot.
///
/// `coverage[i]` is the hit count of line `i + 1`; `None` marks lines that
/// are not executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCoverage {
    pub path: String,
    pub coverage: Vec<Option<u64>>,
}

impl FileCoverage {
    /// Whether the 1-based `line_number` was executed at least once.
    /// Lines past the end of the array count as not covered.
    #[must_use]
    pub fn is_covered(&self, line_number: u32) -> bool {
        let Some(index) = (line_number as usize).checked_sub(1) else {
            return false;
        };
        matches!(self.coverage.get(index), Some(Some(hits)) if *hits > 0)
    }
}

/// Verdict for a single added line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineVerdict {
    pub line_number: u32,
    pub covered: bool,
}

/// Verdicts for the added lines of one file, in added-line order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: String,
    pub lines: Vec<LineVerdict>,
}

impl FileReport {
    #[must_use]
    pub fn covered(&self) -> u64 {
        self.lines.iter().filter(|l| l.covered).count() as u64
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.lines.len() as u64
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        percentage(self.covered(), self.total())
    }

    /// Added line numbers with no test hits.
    #[must_use]
    pub fn uncovered_lines(&self) -> Vec<u32> {
        self.lines
            .iter()
            .filter(|l| !l.covered)
            .map(|l| l.line_number)
            .collect()
    }
}

/// All file reports of a run, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateReport {
    pub files: BTreeMap<String, FileReport>,
}

impl AggregateReport {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn covered(&self) -> u64 {
        self.files.values().map(FileReport::covered).sum()
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.files.values().map(FileReport::total).sum()
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        percentage(self.covered(), self.total())
    }
}

/// Everything a single run fetched and computed.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Newest commit at or before the `days_since` cutoff.
    pub base: CommitRef,
    /// Newest commit of the repository.
    pub head: CommitRef,
    /// Snapshot the verdicts were computed against.
    pub test_report: TestReport,
    /// Number of commits queried before a snapshot was found.
    pub attempts: usize,
    pub report: AggregateReport,
}
