// Commit listing endpoints.
// Fetches repository metadata and pages of commits, following the
// RFC 5988 `Link` header for pagination.

use reqwest::header::HeaderMap;

use crate::error::Result;

use super::client::GithubClient;
use super::types::{CommitRecord, Repository};

/// One fetched batch of commits plus the continuation URL for the
/// following batch, absent on the last page.
#[derive(Debug, Clone)]
pub struct CommitPage {
    pub commits: Vec<CommitRecord>,
    pub next: Option<String>,
}

impl GithubClient {
    /// Get a repository by its `owner/name` identifier.
    pub async fn repository(&self, repo: &str) -> Result<Repository> {
        let response = self.get(&format!("/repos/{}", repo)).await?;
        let repository: Repository = response.json().await?;
        Ok(repository)
    }

    /// Get one page of a commit listing. The URL is either a repository's
    /// commits link or the `next` continuation of a previous page.
    pub async fn commit_page(&self, url: &str) -> Result<CommitPage> {
        let response = self.get_url(url).await?;
        let next = next_link(response.headers());
        let commits: Vec<CommitRecord> = response.json().await?;
        Ok(CommitPage { commits, next })
    }
}

/// Extract the `rel="next"` target from a `Link` header, if present.
fn next_link(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(reqwest::header::LINK)?.to_str().ok()?;
    value.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        if !params.contains("rel=\"next\"") {
            return None;
        }
        let url = target.trim().trim_start_matches('<').trim_end_matches('>');
        Some(url.to_string())
    })
}
