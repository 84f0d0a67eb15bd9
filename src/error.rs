// Error types for the changelog service.
// Covers GitHub API failures, pagination limits, and configuration problems.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error("GitHub API error: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    #[error("Unexpected HTTP {status} from GitHub: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Repository ran out of commit pages after {fetched} of {max_pages}")]
    ExhaustedPagination { fetched: usize, max_pages: usize },

    #[error("Page {page} outside cached range 1..={pages}")]
    PageOutOfRange { page: usize, pages: usize },

    #[error("Invalid configuration: {var}: {reason}")]
    Config { var: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ChangelogError>;
