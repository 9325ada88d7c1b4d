//! Repository hosts: where READMEs, metadata and manifest files come from.
//!
//! [`GitHubClient`] talks to the GitHub REST API. [`LocalCheckout`] walks a
//! directory on disk and serves the same manifest lookups.

mod github;
mod local;

pub use github::GitHubClient;
pub use local::{DiscoveredManifest, LocalCheckout};

use crate::error::FetchError;
use crate::model::{RepoRef, RepositoryMetadata};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static RE_GITHUB_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://github\.com/[\w-]+/[\w-]+").unwrap());

/// A service holding repositories.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    async fn fetch_readme(&self, repo: &RepoRef) -> Result<String, FetchError>;

    async fn fetch_repo_metadata(&self, repo: &RepoRef) -> Result<RepositoryMetadata, FetchError>;

    /// Content of the manifest stored under `manifest_id` at the repository
    /// root, or `None` if there is no such file.
    async fn fetch_file_content(
        &self,
        repo: &RepoRef,
        manifest_id: &str,
    ) -> Result<Option<String>, FetchError>;
}

/// Repository URLs mentioned in `text`, first occurrence order, without
/// duplicates.
///
/// ```
/// use depscan::host::extract_github_urls;
///
/// let readme = "See https://github.com/serde-rs/serde and https://github.com/serde-rs/serde.";
/// assert_eq!(extract_github_urls(readme), vec!["https://github.com/serde-rs/serde"]);
/// ```
pub fn extract_github_urls(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    RE_GITHUB_URL
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
