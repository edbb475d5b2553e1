#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use diffcov::codeclimate::CoverageService;
use diffcov::error::Result;
use diffcov::github::VersionControl;
use diffcov::model::{ChangedFile, CommitRef, CoverageRepo, FileCoverage, TestReport};

/// Fixed "now" used by the end-to-end tests.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

/// In-memory GitHub: a newest-first history, the subset of it older than the
/// cutoff, and the files changed between the two.
#[derive(Default)]
pub struct FakeVcs {
    pub history: Vec<&'static str>,
    pub before_cutoff: Vec<&'static str>,
    pub changed_files: Vec<ChangedFile>,
    pub compared: RefCell<Vec<(String, String)>>,
}

impl VersionControl for FakeVcs {
    fn commits(&self, _slug: &str, until: Option<DateTime<Utc>>) -> Result<Vec<CommitRef>> {
        let shas = if until.is_some() {
            &self.before_cutoff
        } else {
            &self.history
        };
        Ok(shas
            .iter()
            .enumerate()
            .map(|(position, sha)| CommitRef {
                sha: sha.to_string(),
                position,
            })
            .collect())
    }

    fn compare(&self, _slug: &str, base: &str, head: &str) -> Result<Vec<ChangedFile>> {
        self.compared
            .borrow_mut()
            .push((base.to_string(), head.to_string()));
        Ok(self.changed_files.clone())
    }
}

/// In-memory Code Climate with test reports keyed by commit sha.
#[derive(Default)]
pub struct FakeCoverage {
    pub repo_known: bool,
    pub reports: HashMap<&'static str, &'static str>,
    pub files: Vec<FileCoverage>,
    pub requested_paths: RefCell<Vec<String>>,
}

impl CoverageService for FakeCoverage {
    fn find_repo(&self, _slug: &str) -> Result<Option<CoverageRepo>> {
        Ok(self.repo_known.then(|| CoverageRepo {
            id: "5a1b".to_string(),
        }))
    }

    fn test_reports(&self, _repo: &CoverageRepo, commit_sha: &str) -> Result<Vec<TestReport>> {
        Ok(self
            .reports
            .get(commit_sha)
            .map(|id| TestReport {
                id: id.to_string(),
                commit_sha: commit_sha.to_string(),
            })
            .into_iter()
            .collect())
    }

    fn test_file_reports(
        &self,
        _repo: &CoverageRepo,
        _report: &TestReport,
        paths: &[String],
    ) -> Result<Vec<FileCoverage>> {
        self.requested_paths
            .borrow_mut()
            .extend(paths.iter().cloned());
        Ok(self
            .files
            .iter()
            .filter(|f| paths.contains(&f.path))
            .cloned()
            .collect())
    }
}

pub fn changed(path: &str, patch: Option<&str>) -> ChangedFile {
    ChangedFile {
        path: path.to_string(),
        patch: patch.map(str::to_string),
    }
}

pub fn file_coverage(path: &str, coverage: Vec<Option<u64>>) -> FileCoverage {
    FileCoverage {
        path: path.to_string(),
        coverage,
    }
}
