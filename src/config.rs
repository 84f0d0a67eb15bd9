use std::env;
use std::time::Duration;

use crate::error::{ChangelogError, Result};

/// Runtime configuration, loaded once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// `owner/name` of the repository whose commits are displayed.
    pub repo: String,
    /// GitHub access token.
    pub token: String,
    /// Upper bound on cached commit pages.
    pub max_pages: usize,
    /// Idle period between cache refreshes. Zero disables refreshing.
    pub cache_duration: Duration,
    /// Cover image URL for the page header.
    pub cover_image: String,
    /// Display name shown in the page title and header.
    pub repo_name: String,
    /// Listen address for the HTTP server.
    pub bind_address: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let max_pages = parse_positive("MAX_PAGES", &required("MAX_PAGES")?)?;
        let cache_secs: u64 = parse_number("CACHE_DURATION", &required("CACHE_DURATION")?)?;

        Ok(Self {
            repo: required("GH_REPO")?,
            token: required("GH_TOKEN")?,
            max_pages,
            cache_duration: Duration::from_secs(cache_secs),
            cover_image: required("COVER_IMAGE")?,
            repo_name: required("REPO_NAME")?,
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
        })
    }
}

fn required(var: &'static str) -> Result<String> {
    match env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ChangelogError::Config {
            var,
            reason: "must be set".into(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T> {
    raw.parse().map_err(|_| ChangelogError::Config {
        var,
        reason: format!("expected an integer, got {:?}", raw),
    })
}

fn parse_positive(var: &'static str, raw: &str) -> Result<usize> {
    match parse_number::<usize>(var, raw)? {
        0 => Err(ChangelogError::Config {
            var,
            reason: "must be at least 1".into(),
        }),
        n => Ok(n),
    }
}
