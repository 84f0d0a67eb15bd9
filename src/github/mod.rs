// GitHub API module.
// Provides client and types for fetching a repository's commit history.

#![allow(dead_code)]

pub mod client;
pub mod commits;
pub mod types;

pub use client::GithubClient;
pub use types::*;
