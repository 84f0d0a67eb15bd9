// GitHub API response types.
// Defines structs for deserializing GitHub REST API responses.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// GitHub repository, fetched once at startup to validate configuration
/// and obtain the commits link.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    /// Hypermedia link to the commits collection; carries a trailing
    /// `{/sha}` URI template segment.
    pub commits_url: String,
    pub description: Option<String>,
}

impl Repository {
    /// The commits collection URL with the `{/sha}` template stripped,
    /// usable as the first page of the commit listing.
    pub fn commits_link(&self) -> &str {
        match self.commits_url.find('{') {
            Some(idx) => &self.commits_url[..idx],
            None => &self.commits_url,
        }
    }
}

/// One commit as returned by the commits listing endpoint. Fields are
/// required: a response missing any of them fails at deserialization
/// time rather than at render time.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub commit: CommitDetails,
}

/// The author and message for a commit.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetails {
    pub author: CommitAuthor,
    pub message: String,
}

/// The author identity and date for a commit.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commits_link_strips_sha_template() {
        let repo = Repository {
            name: "rails".into(),
            full_name: "rails/rails".into(),
            commits_url: "https://api.github.com/repos/rails/rails/commits{/sha}".into(),
            description: None,
        };
        assert_eq!(
            repo.commits_link(),
            "https://api.github.com/repos/rails/rails/commits"
        );
    }

    #[test]
    fn commit_record_requires_author_fields() {
        let missing_email = serde_json::json!({
            "sha": "abc123",
            "commit": {
                "author": { "name": "Jan", "date": "2024-05-01T12:00:00Z" },
                "message": "Fix the widget"
            }
        });
        assert!(serde_json::from_value::<CommitRecord>(missing_email).is_err());
    }
}
