//! Reconcile a commit range's added lines against a coverage snapshot.
//!
//! A run walks through these steps, fetching each resource exactly once:
//!
//! 1. commit history (newest first) and the base commit before the cutoff
//! 2. the changed files between base and head, parsed into added lines
//! 3. the coverage repository record and a snapshot for one of the newest
//!    commits (see [`select_snapshot`])
//! 4. per-file coverage for the eligible changed paths, in batches
//! 5. the join of added lines against per-line hit counts

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::codeclimate::CoverageService;
use crate::config::PathFilter;
use crate::diff;
use crate::error::{DiffcovError, Result};
use crate::github::VersionControl;
use crate::model::{
    AggregateReport, CommitRef, CoverageRepo, FileCoverage, FileReport, LineVerdict,
    Reconciliation, TestReport,
};

/// How many of the newest commits are checked for a test report. Reports are
/// uploaded by CI after a commit lands, so the newest commit often has none.
pub const MAX_SNAPSHOT_ATTEMPTS: usize = 4;

/// Maximum number of paths per test file report request.
pub const COVERAGE_BATCH_SIZE: usize = 20;

pub struct Reconciler<'a> {
    vcs: &'a dyn VersionControl,
    coverage: &'a dyn CoverageService,
    path_filter: PathFilter,
    max_attempts: usize,
}

impl<'a> Reconciler<'a> {
    pub fn new(vcs: &'a dyn VersionControl, coverage: &'a dyn CoverageService) -> Self {
        Self {
            vcs,
            coverage,
            path_filter: PathFilter::default(),
            max_attempts: MAX_SNAPSHOT_ATTEMPTS,
        }
    }

    #[must_use]
    pub fn with_path_filter(mut self, path_filter: PathFilter) -> Self {
        self.path_filter = path_filter;
        self
    }

    /// Compute coverage of the lines added to `slug` since the newest commit
    /// at or before `until`.
    pub fn run(&self, slug: &str, until: DateTime<Utc>) -> Result<Reconciliation> {
        let commits = self.vcs.commits(slug, None)?;
        let head = commits
            .first()
            .cloned()
            .ok_or_else(|| DiffcovError::NoCommits(slug.to_string()))?;

        let base = self
            .vcs
            .commits(slug, Some(until))?
            .into_iter()
            .next()
            .ok_or_else(|| DiffcovError::NoBaseCommit {
                slug: slug.to_string(),
                until: until.to_rfc3339(),
            })?;
        info!(base = %base.sha, head = %head.sha, "Comparing commits");

        let changed_files = self.vcs.compare(slug, &base.sha, &head.sha)?;
        let added_lines = diff::extract_added_lines(&changed_files);
        debug!(
            changed = changed_files.len(),
            with_additions = added_lines.len(),
            "Parsed diff"
        );

        let repo = self
            .coverage
            .find_repo(slug)?
            .ok_or_else(|| DiffcovError::RepoNotFound(slug.to_string()))?;

        let (test_report, attempts) =
            select_snapshot(self.coverage, &repo, &commits, self.max_attempts)?;

        let eligible: Vec<String> = added_lines
            .keys()
            .filter(|path| self.path_filter.is_eligible(path))
            .cloned()
            .collect();
        let file_coverage = fetch_file_coverage(self.coverage, &repo, &test_report, &eligible)?;

        let report = join(&added_lines, &file_coverage);
        info!(
            files = report.files.len(),
            covered = report.covered(),
            total = report.total(),
            "Reconciled added lines"
        );

        Ok(Reconciliation {
            base,
            head,
            test_report,
            attempts,
            report,
        })
    }
}

/// Find a test report for one of the newest `max_attempts` commits, newest
/// first. Returns the report and the number of commits queried.
///
/// Only a commit without any test report moves the walk on; request failures
/// are returned as they are.
pub fn select_snapshot(
    coverage: &dyn CoverageService,
    repo: &CoverageRepo,
    commits: &[CommitRef],
    max_attempts: usize,
) -> Result<(TestReport, usize)> {
    let mut attempts = 0;

    for commit in commits.iter().take(max_attempts) {
        attempts += 1;
        if let Some(report) = coverage.test_reports(repo, &commit.sha)?.into_iter().next() {
            info!(
                sha = %commit.sha,
                report = %report.id,
                attempts,
                "Selected test report"
            );
            return Ok((report, attempts));
        }
        warn!(sha = %commit.sha, "No test report for commit");
    }

    Err(DiffcovError::NoTestReport { attempts })
}

/// Fetch per-file coverage for `paths`, at most [`COVERAGE_BATCH_SIZE`] paths
/// per request. The first record returned for a path wins.
pub fn fetch_file_coverage(
    coverage: &dyn CoverageService,
    repo: &CoverageRepo,
    report: &TestReport,
    paths: &[String],
) -> Result<HashMap<String, FileCoverage>> {
    let mut by_path = HashMap::new();

    for batch in paths.chunks(COVERAGE_BATCH_SIZE) {
        for file in coverage.test_file_reports(repo, report, batch)? {
            by_path.entry(file.path.clone()).or_insert(file);
        }
    }

    Ok(by_path)
}

/// Classify every added line against the snapshot's hit counts.
///
/// Paths without a coverage record are left out of the report.
pub fn join(
    added_lines: &BTreeMap<String, Vec<u32>>,
    coverage: &HashMap<String, FileCoverage>,
) -> AggregateReport {
    let mut report = AggregateReport::new();

    for (path, line_numbers) in added_lines {
        let Some(file) = coverage.get(path) else {
            debug!(path = %path, "No coverage record, skipping");
            continue;
        };

        let lines: Vec<LineVerdict> = line_numbers
            .iter()
            .map(|&line_number| LineVerdict {
                line_number,
                covered: file.is_covered(line_number),
            })
            .collect();

        if lines.is_empty() {
            continue;
        }

        report.files.insert(
            path.clone(),
            FileReport {
                path: path.clone(),
                lines,
            },
        );
    }

    report
}
