// GitHub API HTTP client.
// Handles authentication, status mapping, and request timeouts.

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
    Client, Response, StatusCode,
};

use crate::error::{ChangelogError, Result};

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Upper bound on a single API request, connection setup included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated GitHub client shared by the cache and the refresh task.
pub struct GithubClient {
    client: Client,
    api_base: String,
}

impl GithubClient {
    /// Create a client authenticated with the given token.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base(token, GITHUB_API_BASE)
    }

    /// Create a client against a non-default API base URL.
    pub fn with_base(token: &str, api_base: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                ChangelogError::Config {
                    var: "GH_TOKEN",
                    reason: e.to_string(),
                }
            })?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("changelog-service"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ChangelogError::Upstream)?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Make a GET request to an API path under the base URL.
    pub async fn get(&self, endpoint: &str) -> Result<Response> {
        self.get_url(&format!("{}{}", self.api_base, endpoint)).await
    }

    /// Make a GET request to an absolute URL, e.g. one taken from a
    /// pagination `Link` header.
    pub async fn get_url(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ChangelogError::Upstream)?;

        check_response(response).await
    }
}

/// Check response status and convert errors.
async fn check_response(response: Response) -> Result<Response> {
    match response.status() {
        StatusCode::OK => Ok(response),
        StatusCode::UNAUTHORIZED => Err(ChangelogError::Unauthorized),
        StatusCode::NOT_FOUND => {
            let url = response.url().to_string();
            Err(ChangelogError::NotFound(url))
        }
        StatusCode::FORBIDDEN if rate_limit_exhausted(&response) => {
            Err(ChangelogError::RateLimited {
                reset_at: rate_limit_reset(&response),
            })
        }
        status => Err(ChangelogError::UnexpectedStatus {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        }),
    }
}

fn rate_limit_exhausted(response: &Response) -> bool {
    header_number(response, "x-ratelimit-remaining") == Some(0)
}

/// Rate limit reset time as a wall-clock string, for error messages.
fn rate_limit_reset(response: &Response) -> String {
    header_number(response, "x-ratelimit-reset")
        .and_then(|ts| chrono::DateTime::from_timestamp(ts as i64, 0))
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_number(response: &Response, name: &str) -> Option<u64> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
