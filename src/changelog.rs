// In-memory changelog cache.
// Holds a bounded, pre-paginated snapshot of a repository's commit
// listing so request handlers never touch the network.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::{ChangelogError, Result};
use crate::github::commits::CommitPage;
use crate::github::{CommitRecord, GithubClient};

/// Render-ready projection of a commit record. Computed on demand,
/// never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayEntry {
    pub author_name: String,
    pub avatar_url: String,
    pub authored_at: DateTime<Utc>,
    pub message: String,
}

impl DisplayEntry {
    fn from_record(record: &CommitRecord) -> Self {
        let author = &record.commit.author;
        Self {
            author_name: author.name.clone(),
            avatar_url: gravatar_url(&author.email),
            authored_at: author.date,
            message: record.commit.message.clone(),
        }
    }
}

/// Gravatar endpoint for an email address: hex digest of the trimmed,
/// lower-cased address. The same email always yields the same URL.
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!("https://www.gravatar.com/avatar/{}", hex::encode(digest))
}

/// The cached page sequence plus its fetch timestamp. Immutable once
/// published; refresh builds a new snapshot and swaps it in whole, so a
/// concurrent reader holds either the old sequence or the new one,
/// never a mix.
struct Snapshot {
    pages: Vec<CommitPage>,
    last_update: DateTime<Utc>,
}

/// Shared commit cache. One instance exists per process, read by every
/// request handler and rebuilt only by `refresh`.
pub struct Changelog {
    client: GithubClient,
    commits_url: String,
    max_pages: usize,
    state: RwLock<Arc<Snapshot>>,
}

impl std::fmt::Debug for Changelog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Changelog")
            .field("commits_url", &self.commits_url)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

impl Changelog {
    /// Build the cache by resolving the repository's commits link and
    /// fetching pages 1..=max_pages. Fails if the repository cannot be
    /// fetched or has fewer pages than requested.
    pub async fn build(client: GithubClient, repo: &str, max_pages: usize) -> Result<Self> {
        let repository = client.repository(repo).await?;
        tracing::info!("resolved repository {}", repository.full_name);

        let commits_url = repository.commits_link().to_string();
        let pages = fetch_pages(&client, &commits_url, max_pages).await?;

        Ok(Self {
            client,
            commits_url,
            max_pages,
            state: RwLock::new(Arc::new(Snapshot {
                pages,
                last_update: Utc::now(),
            })),
        })
    }

    /// Re-fetch every page, then atomically replace the published
    /// snapshot. On any failure the current snapshot stays untouched.
    pub async fn refresh(&self) -> Result<()> {
        let pages = fetch_pages(&self.client, &self.commits_url, self.max_pages).await?;
        let snapshot = Arc::new(Snapshot {
            pages,
            last_update: Utc::now(),
        });
        *self.state.write().expect("snapshot lock poisoned") = snapshot;
        Ok(())
    }

    /// The commits of the 1-based page `number`.
    pub fn page(&self, number: usize) -> Result<CommitPage> {
        let snapshot = self.snapshot();
        match snapshot.pages.get(number.wrapping_sub(1)) {
            Some(page) => Ok(page.clone()),
            None => Err(ChangelogError::PageOutOfRange {
                page: number,
                pages: snapshot.pages.len(),
            }),
        }
    }

    /// The 1-based page `number` projected into display entries.
    pub fn display_page(&self, number: usize) -> Result<Vec<DisplayEntry>> {
        let page = self.page(number)?;
        Ok(page.commits.iter().map(DisplayEntry::from_record).collect())
    }

    /// Timestamp of the most recent successful build or refresh.
    pub fn last_update(&self) -> DateTime<Utc> {
        self.snapshot().last_update
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        self.state.read().expect("snapshot lock poisoned").clone()
    }
}

/// Walk the pagination chain from the first page until `max_pages` are
/// collected. The chain running dry earlier is an error: the cache
/// promises exactly the configured page count.
async fn fetch_pages(
    client: &GithubClient,
    commits_url: &str,
    max_pages: usize,
) -> Result<Vec<CommitPage>> {
    let mut pages = Vec::with_capacity(max_pages);

    tracing::debug!("fetching commit page 1/{}", max_pages);
    let mut page = client.commit_page(commits_url).await?;

    while pages.len() + 1 < max_pages {
        let next_url = match &page.next {
            Some(url) => url.clone(),
            None => {
                return Err(ChangelogError::ExhaustedPagination {
                    fetched: pages.len() + 1,
                    max_pages,
                })
            }
        };
        pages.push(page);

        tracing::debug!("fetching commit page {}/{}", pages.len() + 1, max_pages);
        page = client.commit_page(&next_url).await?;
    }
    pages.push(page);

    tracing::info!("fetched {} commit pages", pages.len());
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Mock, ServerGuard};

    fn commit_json(sha: &str, email: &str, message: &str) -> serde_json::Value {
        serde_json::json!({
            "sha": sha,
            "commit": {
                "author": {
                    "name": "Jan",
                    "email": email,
                    "date": "2024-05-01T12:00:00Z"
                },
                "message": message
            }
        })
    }

    async fn mock_repository(server: &mut ServerGuard) -> Mock {
        let body = serde_json::json!({
            "name": "rails",
            "full_name": "rails/rails",
            "commits_url": format!("{}/repos/rails/rails/commits{{/sha}}", server.url()),
            "description": "Ruby on Rails"
        });
        server
            .mock("GET", "/repos/rails/rails")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// Mock one commit page at `path`, linking to `next` when given.
    async fn mock_page(
        server: &mut ServerGuard,
        path: &str,
        commits: &[serde_json::Value],
        next: Option<&str>,
    ) -> Mock {
        let mut mock = server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::Value::Array(commits.to_vec()).to_string());
        if let Some(next_path) = next {
            let link = format!("<{}{}>; rel=\"next\"", server.url(), next_path);
            mock = mock.with_header("link", &link);
        }
        mock.create_async().await
    }

    /// Two pages of one commit each behind a repository lookup. The
    /// mock handles are returned so they stay registered for the whole
    /// test.
    async fn two_page_server() -> (ServerGuard, [Mock; 3]) {
        let mut server = mockito::Server::new_async().await;
        let repo = mock_repository(&mut server).await;
        let page1 = mock_page(
            &mut server,
            "/repos/rails/rails/commits",
            &[commit_json("aaa", "jan@example.com", "First commit")],
            Some("/commits/page2"),
        )
        .await;
        let page2 = mock_page(
            &mut server,
            "/commits/page2",
            &[commit_json("bbb", "mia@example.com", "Second commit")],
            None,
        )
        .await;
        (server, [repo, page1, page2])
    }

    async fn build(server: &ServerGuard, max_pages: usize) -> Result<Changelog> {
        let client = GithubClient::with_base("token", &server.url()).unwrap();
        Changelog::build(client, "rails/rails", max_pages).await
    }

    #[tokio::test]
    async fn build_walks_pagination_in_order() {
        let (server, _mocks) = two_page_server().await;
        let changelog = build(&server, 2).await.unwrap();

        assert_eq!(changelog.page(1).unwrap().commits[0].sha, "aaa");
        assert_eq!(changelog.page(2).unwrap().commits[0].sha, "bbb");
    }

    #[tokio::test]
    async fn build_fails_when_pagination_runs_dry() {
        let (server, _mocks) = two_page_server().await;
        let err = build(&server, 3).await.unwrap_err();
        assert!(matches!(
            err,
            ChangelogError::ExhaustedPagination {
                fetched: 2,
                max_pages: 3
            }
        ));
    }

    #[tokio::test]
    async fn page_lookup_rejects_out_of_range_numbers() {
        let (server, _mocks) = two_page_server().await;
        let changelog = build(&server, 2).await.unwrap();

        for number in [0, 3, usize::MAX] {
            let err = changelog.page(number).unwrap_err();
            assert!(matches!(
                err,
                ChangelogError::PageOutOfRange { pages: 2, .. }
            ));
            assert!(changelog.display_page(number).is_err());
        }
    }

    #[tokio::test]
    async fn display_page_projects_commits() {
        let (server, _mocks) = two_page_server().await;
        let changelog = build(&server, 2).await.unwrap();

        let entries = changelog.display_page(1).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].author_name, "Jan");
        assert_eq!(entries[0].message, "First commit");
        assert_eq!(entries[0].avatar_url, gravatar_url("jan@example.com"));

        // Pure: a second projection of the same snapshot is identical.
        assert_eq!(entries, changelog.display_page(1).unwrap());
    }

    #[tokio::test]
    async fn refresh_swaps_in_new_pages_and_bumps_timestamp() {
        let (mut server, [_repo, page1, _page2]) = two_page_server().await;
        let changelog = build(&server, 2).await.unwrap();
        let before = changelog.last_update();

        // Replace page 1 upstream, as if a commit landed.
        drop(page1);
        let _new_page1 = mock_page(
            &mut server,
            "/repos/rails/rails/commits",
            &[commit_json("ccc", "jan@example.com", "Newest commit")],
            Some("/commits/page2"),
        )
        .await;

        changelog.refresh().await.unwrap();

        assert_eq!(changelog.page(1).unwrap().commits[0].sha, "ccc");
        assert_eq!(changelog.page(2).unwrap().commits[0].sha, "bbb");
        assert!(changelog.last_update() > before);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let (mut server, [_repo, page1, page2]) = two_page_server().await;
        let changelog = build(&server, 2).await.unwrap();
        let before = changelog.last_update();

        // Page 1 now succeeds with fresh content but page 2 errors, so
        // the half-built sequence must be discarded wholesale.
        drop(page1);
        drop(page2);
        let _new_page1 = mock_page(
            &mut server,
            "/repos/rails/rails/commits",
            &[commit_json("ccc", "jan@example.com", "Newest commit")],
            Some("/commits/page2"),
        )
        .await;
        let _broken_page2 = server
            .mock("GET", "/commits/page2")
            .with_status(500)
            .create_async()
            .await;

        assert!(changelog.refresh().await.is_err());

        assert_eq!(changelog.page(1).unwrap().commits[0].sha, "aaa");
        assert_eq!(changelog.page(2).unwrap().commits[0].sha, "bbb");
        assert_eq!(changelog.last_update(), before);
    }

    #[test]
    fn gravatar_url_is_case_insensitive_in_email() {
        assert_eq!(gravatar_url("A@B.com"), gravatar_url("a@b.com"));
        assert_eq!(gravatar_url(" a@b.com "), gravatar_url("a@b.com"));
        assert_ne!(gravatar_url("a@b.com"), gravatar_url("c@d.com"));
    }

    #[test]
    fn gravatar_url_is_a_hex_digest_endpoint() {
        let url = gravatar_url("jan@example.com");
        let hash = url.rsplit('/').next().unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(url.starts_with("https://www.gravatar.com/avatar/"));
    }
}
