use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiffcovError {
    #[error("No test report found for the last {attempts} commits")]
    NoTestReport { attempts: usize },

    #[error("Code Climate repo not found: {0}")]
    RepoNotFound(String),

    #[error("No commits found in {0}")]
    NoCommits(String),

    #[error("No commit found in {slug} before {until}")]
    NoBaseCommit { slug: String, until: String },

    #[error("HTTP {status} from {url}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid response from {url}: {source}")]
    InvalidResponse {
        url: String,
        source: std::io::Error,
    },

    #[error("Invalid repository slug '{0}', expected owner/name")]
    InvalidSlug(String),
}

impl DiffcovError {
    /// Map a `ureq` failure onto the transport error kinds.
    pub(crate) fn from_ureq(url: &str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, resp) => DiffcovError::Http {
                url: url.to_string(),
                status,
                body: resp.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(t) => DiffcovError::Transport {
                url: url.to_string(),
                message: t.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, DiffcovError>;
