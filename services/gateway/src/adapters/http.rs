//! services/gateway/src/adapters/http.rs
//!
//! The shared HTTP client every backend adapter is built on. It owns the base URL
//! and the request timeout, and it is the one place where HTTP outcomes are
//! translated into `PortError`s.

use std::time::Duration;

use learning_engine_core::ports::{PortError, PortResult};
use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

#[derive(Clone, Debug)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Creates a client whose every request is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> PortResult<T> {
        debug!(path, "GET backend");
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| unavailable(path, e))?;
        decode(path, response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> PortResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send_post(path, body).await?;
        decode(path, response).await
    }

    /// Posts `body` and only checks the status; the response body is ignored.
    pub async fn post_ignoring_body<B>(&self, path: &str, body: &B) -> PortResult<()>
    where
        B: Serialize + ?Sized,
    {
        let response = self.send_post(path, body).await?;
        check_status(path, response).await.map(|_| ())
    }

    async fn send_post<B>(&self, path: &str, body: &B) -> PortResult<Response>
    where
        B: Serialize + ?Sized,
    {
        debug!(path, "POST backend");
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| unavailable(path, e))
    }
}

/// Percent-encodes a caller-supplied value as one path segment.
///
/// `.` and `..` would be resolved away by URL normalization, so they are refused.
pub fn path_segment(value: &str) -> PortResult<String> {
    if value.is_empty() || value == "." || value == ".." {
        return Err(PortError::NotFound(format!("invalid path segment '{}'", value)));
    }
    Ok(urlencoding::encode(value).into_owned())
}

fn unavailable(path: &str, e: reqwest::Error) -> PortError {
    error!(path, "Backend request failed: {}", e);
    PortError::Unavailable(format!("{}: {}", path, e))
}

async fn check_status(path: &str, response: Response) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(PortError::NotFound(path.to_string()));
    }
    let body = response.text().await.unwrap_or_default();
    error!(path, %status, "Backend returned an error status.");
    Err(PortError::Unexpected(format!("{} returned {}: {}", path, status, body)))
}

async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> PortResult<T> {
    let response = check_status(path, response).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| unavailable(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        error!(
            path,
            "Failed to parse backend JSON: {}. Body: {}",
            e,
            String::from_utf8_lossy(&bytes)
        );
        PortError::Unexpected(format!("{}: invalid response body: {}", path, e))
    })
}
