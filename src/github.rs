//! GitHub API gateway: commit history and commit comparisons.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use crate::error::Result;
use crate::http::{endpoint, get_json, USER_AGENT};
use crate::model::{ChangedFile, CommitRef};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Files per compare page. GitHub returns at most 300 files unless the
/// comparison is paginated.
const COMPARE_PAGE_SIZE: usize = 100;

/// Version-control operations a reconciliation run needs.
pub trait VersionControl {
    /// List commits newest first, optionally only those made at or before
    /// `until`.
    fn commits(&self, slug: &str, until: Option<DateTime<Utc>>) -> Result<Vec<CommitRef>>;

    /// List the files changed between `base` and `head`, with their patches.
    fn compare(&self, slug: &str, base: &str, head: &str) -> Result<Vec<ChangedFile>>;
}

/// Client for the GitHub REST API.
pub struct GitHub {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl GitHub {
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
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", USER_AGENT)
            .set("X-GitHub-Api-Version", "2022-11-28")
    }
}

#[derive(Deserialize)]
struct CommitItem {
    sha: String,
}

#[derive(Deserialize)]
struct Comparison {
    files: Vec<ComparedFile>,
}

#[derive(Deserialize)]
struct ComparedFile {
    filename: String,
    /// Omitted by GitHub for binary files and very large diffs.
    patch: Option<String>,
}

impl VersionControl for GitHub {
    fn commits(&self, slug: &str, until: Option<DateTime<Utc>>) -> Result<Vec<CommitRef>> {
        let mut request = self.get(&format!("repos/{slug}/commits"));
        if let Some(until) = until {
            request = request.query("until", &until.to_rfc3339_opts(SecondsFormat::Secs, true));
        }

        let items: Vec<CommitItem> = get_json(request)?;
        Ok(commit_refs(items))
    }

    fn compare(&self, slug: &str, base: &str, head: &str) -> Result<Vec<ChangedFile>> {
        let path = format!("repos/{slug}/compare/{base}...{head}");
        let files = collect_pages(COMPARE_PAGE_SIZE, |page| {
            let request = self
                .get(&path)
                .query("per_page", &COMPARE_PAGE_SIZE.to_string())
                .query("page", &page.to_string());
            let comparison: Comparison = get_json(request)?;
            Ok(comparison.files)
        })?;

        Ok(files
            .into_iter()
            .map(|f| ChangedFile {
                path: f.filename,
                patch: f.patch,
            })
            .collect())
    }
}

/// Fetch pages `1..` until one comes back short of `per_page` items.
fn collect_pages<T>(
    per_page: usize,
    mut fetch_page: impl FnMut(u32) -> Result<Vec<T>>,
) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut page = 1u32;
    loop {
        let batch = fetch_page(page)?;
        let done = batch.len() < per_page;
        items.extend(batch);
        if done {
            break;
        }
        page += 1;
    }
    Ok(items)
}

fn commit_refs(items: Vec<CommitItem>) -> Vec<CommitRef> {
    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| CommitRef {
            sha: item.sha,
            position,
        })
        .collect()
}
