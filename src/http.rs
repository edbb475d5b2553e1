//! Blocking JSON requests shared by the GitHub and Code Climate gateways.

use serde::de::DeserializeOwned;

use crate::error::{DiffcovError, Result};

pub(crate) const USER_AGENT: &str = concat!("diffcov/", env!("CARGO_PKG_VERSION"));

/// Send a prepared GET request and decode the JSON body into `T`.
///
/// Non-2xx responses become [`DiffcovError::Http`]; bodies that don't match
/// `T` (missing required fields, wrong types) become
/// [`DiffcovError::InvalidResponse`].
pub(crate) fn get_json<T: DeserializeOwned>(request: ureq::Request) -> Result<T> {
    let url = request.url().to_string();
    tracing::debug!(url = %url, "GET");

    let resp = request
        .call()
        .map_err(|e| DiffcovError::from_ureq(&url, e))?;
    resp.into_json()
        .map_err(|source| DiffcovError::InvalidResponse { url, source })
}

/// Join a base URL and a path, tolerating a trailing slash on the base.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
