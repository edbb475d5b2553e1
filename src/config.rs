//! Run configuration: validated CLI inputs plus environment overrides.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::error::{DiffcovError, Result};
use crate::{codeclimate, github};

/// GitHub "owner/name" slug. Owners are alphanumeric with inner hyphens;
/// repository names also allow `.` and `_`.
static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?/[A-Za-z0-9._-]+$").unwrap()
});

/// Environment variable overriding the GitHub API base URL.
pub const GITHUB_API_URL_ENV: &str = "DIFFCOV_GITHUB_API_URL";
/// Environment variable overriding the Code Climate API base URL.
pub const CC_API_URL_ENV: &str = "DIFFCOV_CC_API_URL";

/// Decides which changed paths are worth asking the coverage service about.
///
/// Suffixes are matched on the raw path, so "js" also takes in `.mjs` and
/// `.cjs` modules.
#[derive(Debug, Clone)]
pub struct PathFilter {
    pub suffixes: Vec<String>,
    pub excluded_suffixes: Vec<String>,
}

impl Default for PathFilter {
    fn default() -> Self {
        Self {
            suffixes: ["js", "rb", "py", "php"].map(String::from).to_vec(),
            excluded_suffixes: vec!["_spec.rb".to_string()],
        }
    }
}

impl PathFilter {
    #[must_use]
    pub fn is_eligible(&self, path: &str) -> bool {
        let matches = |suffixes: &[String]| suffixes.iter().any(|s| path.ends_with(s.as_str()));
        matches(&self.suffixes) && !matches(&self.excluded_suffixes)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// GitHub "owner/name" slug.
    pub repo: String,
    pub cc_token: String,
    pub github_token: String,
    /// Age in days of the base commit the diff starts from.
    pub days_since: u32,
    pub github_api_url: String,
    pub cc_api_url: String,
    pub path_filter: PathFilter,
}

impl Config {
    /// Build a configuration against the public API endpoints.
    pub fn new(repo: &str, cc_token: &str, github_token: &str, days_since: u32) -> Result<Self> {
        validate_slug(repo)?;
        Ok(Self {
            repo: repo.to_string(),
            cc_token: cc_token.to_string(),
            github_token: github_token.to_string(),
            days_since,
            github_api_url: github::DEFAULT_API_URL.to_string(),
            cc_api_url: codeclimate::DEFAULT_API_URL.to_string(),
            path_filter: PathFilter::default(),
        })
    }

    /// Apply API URL overrides from `DIFFCOV_GITHUB_API_URL` and
    /// `DIFFCOV_CC_API_URL`, if set.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(GITHUB_API_URL_ENV) {
            tracing::debug!(url = %url, "GitHub API URL overridden");
            self.github_api_url = url;
        }
        if let Ok(url) = std::env::var(CC_API_URL_ENV) {
            tracing::debug!(url = %url, "Code Climate API URL overridden");
            self.cc_api_url = url;
        }
        self
    }

    /// Cutoff for the base commit: `days_since` days before `now`.
    #[must_use]
    pub fn until(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.days_since))
    }
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        Err(DiffcovError::InvalidSlug(slug.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("rails/rails").is_ok());
        assert!(validate_slug("code-climate/test-reporter").is_ok());
        assert!(validate_slug("octo/my_repo.js").is_ok());

        assert!(validate_slug("rails").is_err());
        assert!(validate_slug("rails/rails/extra").is_err());
        assert!(validate_slug("/rails").is_err());
        assert!(validate_slug("-bad/repo").is_err());
        assert!(validate_slug("owner/").is_err());
    }

    #[test]
    fn test_config_rejects_invalid_slug() {
        let err = Config::new("not a slug", "cc", "gh", 7).unwrap_err();
        assert!(matches!(err, DiffcovError::InvalidSlug(_)));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::new("acme/shop", "cc", "gh", 7).unwrap();
        assert_eq!(config.github_api_url, "https://api.github.com");
        assert_eq!(config.cc_api_url, "https://api.codeclimate.com");
    }

    #[test]
    fn test_until() {
        let config = Config::new("acme/shop", "cc", "gh", 7).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(
            config.until(now),
            Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_path_filter() {
        let filter = PathFilter::default();
        assert!(filter.is_eligible("app/models/user.rb"));
        assert!(filter.is_eligible("web/static/app.js"));
        assert!(filter.is_eligible("scripts/sync.py"));
        assert!(filter.is_eligible("public/index.php"));

        assert!(!filter.is_eligible("spec/models/user_spec.rb"));
        assert!(!filter.is_eligible("README.md"));
        assert!(!filter.is_eligible("Gemfile"));
        assert!(!filter.is_eligible("config/app.rb.erb"));
    }

    #[test]
    fn test_path_filter_matches_module_suffixes() {
        let filter = PathFilter::default();
        assert!(filter.is_eligible("web/app.mjs"));
        assert!(filter.is_eligible("web/legacy/app.cjs"));
        assert!(!filter.is_eligible("package.json"));
    }
}
