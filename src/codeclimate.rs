//! Code Climate test-coverage API gateway.
//!
//! Responses are JSON:API documents of the form
//! `{ "data": [{ "id": ..., "attributes": { ... } }] }`.

use serde::de::IgnoredAny;
use serde::Deserialize;

use crate::error::Result;
use crate::http::{endpoint, get_json, USER_AGENT};
use crate::model::{CoverageRepo, FileCoverage, TestReport};

pub const DEFAULT_API_URL: &str = "https://api.codeclimate.com";

/// Coverage-service operations a reconciliation run needs.
pub trait CoverageService {
    /// Look up the repository record for a GitHub slug.
    fn find_repo(&self, slug: &str) -> Result<Option<CoverageRepo>>;

    /// List test reports uploaded for a commit. Empty when coverage hasn't
    /// been reported (yet) for that commit.
    fn test_reports(&self, repo: &CoverageRepo, commit_sha: &str) -> Result<Vec<TestReport>>;

    /// List per-file coverage of a test report for the given paths. Paths
    /// the report doesn't cover are simply absent from the result.
    fn test_file_reports(
        &self,
        repo: &CoverageRepo,
        report: &TestReport,
        paths: &[String],
    ) -> Result<Vec<FileCoverage>>;
}

/// Client for the Code Climate REST API.
pub struct CodeClimate {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl CodeClimate {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            agent: ureq::Agent::new(),
            base_url: base_url.to_string(),
            token: token.to_string(),
        }
    }

    fn get(&self, path: &str) -> ureq::Request {
        self.agent
            .get(&endpoint(&self.base_url, path))
            .set("Authorization", &format!("Token token={}", self.token))
            .set("Accept", "application/vnd.api+json")
            .set("User-Agent", USER_AGENT)
    }
}

#[derive(Deserialize)]
struct Document<T> {
    data: Vec<Resource<T>>,
}

#[derive(Deserialize)]
struct Resource<T> {
    id: String,
    attributes: T,
}

#[derive(Deserialize)]
struct TestReportAttributes {
    commit_sha: String,
}

#[derive(Deserialize)]
struct TestFileReportAttributes {
    path: String,
    coverage: Vec<Option<u64>>,
}

impl CoverageService for CodeClimate {
    fn find_repo(&self, slug: &str) -> Result<Option<CoverageRepo>> {
        let request = self.get("v1/repos").query("github_slug", slug);
        let doc: Document<IgnoredAny> = get_json(request)?;
        Ok(doc.data.into_iter().next().map(|r| CoverageRepo { id: r.id }))
    }

    fn test_reports(&self, repo: &CoverageRepo, commit_sha: &str) -> Result<Vec<TestReport>> {
        let request = self
            .get(&format!("v1/repos/{}/test_reports", repo.id))
            .query("filter[commit_sha]", commit_sha);
        let doc: Document<TestReportAttributes> = get_json(request)?;
        Ok(doc
            .data
            .into_iter()
            .map(|r| TestReport {
                id: r.id,
                commit_sha: r.attributes.commit_sha,
            })
            .collect())
    }

    fn test_file_reports(
        &self,
        repo: &CoverageRepo,
        report: &TestReport,
        paths: &[String],
    ) -> Result<Vec<FileCoverage>> {
        let mut request = self
            .get(&format!(
                "v1/repos/{}/test_reports/{}/test_file_reports",
                repo.id, report.id
            ))
            .query("page[size]", &paths.len().to_string());
        for path in paths {
            request = request.query("filter[path][$in][]", path);
        }

        let doc: Document<TestFileReportAttributes> = get_json(request)?;
        Ok(doc
            .data
            .into_iter()
            .map(|r| FileCoverage {
                path: r.attributes.path,
                coverage: r.attributes.coverage,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_test_file_reports() {
        let json = r#"{
            "data": [{
                "id": "5b0e",
                "type": "test_file_reports",
                "attributes": {
                    "path": "app/models/user.rb",
                    "covered_percent": 66.6,
                    "coverage": [null, 1, 0, null, 12]
                }
            }]
        }"#;
        let doc: Document<TestFileReportAttributes> = serde_json::from_str(json).unwrap();

        assert_eq!(doc.data.len(), 1);
        let attrs = &doc.data[0].attributes;
        assert_eq!(attrs.path, "app/models/user.rb");
        assert_eq!(attrs.coverage, vec![None, Some(1), Some(0), None, Some(12)]);
    }

    #[test]
    fn test_decode_empty_document() {
        let doc: Document<TestReportAttributes> = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(doc.data.is_empty());
    }

    #[test]
    fn test_decode_test_report_missing_commit_sha_fails() {
        let json = r#"{"data": [{"id": "r1", "attributes": {"state": "done"}}]}"#;
        assert!(serde_json::from_str::<Document<TestReportAttributes>>(json).is_err());
    }

    #[test]
    fn test_decode_negative_hit_count_fails() {
        let json = r#"{"data": [{"id": "f1", "attributes": {"path": "a.rb", "coverage": [-1]}}]}"#;
        assert!(serde_json::from_str::<Document<TestFileReportAttributes>>(json).is_err());
    }

    #[test]
    fn test_decode_repo_ignores_attributes() {
        let json = r#"{"data": [
            {"id": "696a76232df1350001003a6c", "attributes": {"github_slug": "acme/shop", "badge_token": "x"}},
            {"id": "5a1b", "attributes": {}}
        ]}"#;
        let doc: Document<IgnoredAny> = serde_json::from_str(json).unwrap();
        assert_eq!(doc.data.len(), 2);
        assert_eq!(doc.data[0].id, "696a76232df1350001003a6c");
    }
}
