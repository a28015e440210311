//! Shared HTTP client for the dictionary and Bluesky APIs

use crate::config::HttpConfig;
use crate::error::{ConfigError, FetchError, Result};

const USER_AGENT: &str = concat!("zpcast/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] with the configured per-request timeout.
///
/// Every outbound call goes through a client built here, so no request can
/// hang a run indefinitely.
pub fn build_client(config: &HttpConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| {
            ConfigError::InvalidValue {
                field: "http".to_string(),
                message: format!("failed to build HTTP client: {e}"),
            }
            .into()
        })
}

/// Send a request and reject non-2xx responses without reading the body
pub(crate) async fn send(request: reqwest::RequestBuilder) -> std::result::Result<reqwest::Response, FetchError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(FetchError::from_status(status));
    }

    Ok(response)
}

/// Read the body as JSON and decode it into `T`, tracking the failing path
pub(crate) async fn decode<T>(response: reqwest::Response) -> std::result::Result<T, FetchError>
where
    T: serde::de::DeserializeOwned,
{
    let body = response.bytes().await?;
    let value: serde_json::Value =
        serde_json::from_slice(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

    serde_path_to_error::deserialize(value).map_err(|e| {
        FetchError::Validation(vec![crate::error::ValidationIssue::from_path_error(&e)])
    })
}
