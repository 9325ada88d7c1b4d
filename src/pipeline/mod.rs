//! Batch services composing hosts, extractors, advisory sources and sinks.
//!
//! Every pipeline isolates failures per item: a repository whose metadata
//! cannot be fetched, a manifest that cannot be downloaded or an advisory
//! lookup that fails is logged and counted, and the batch carries on. Only
//! a sink that can no longer be written stops a run.

mod dependencies;
mod repositories;
mod vulnerabilities;

pub use dependencies::{collect_dependencies, collect_from_checkout, ManifestSummary};
pub use repositories::{collect_repositories, RepositoriesReport};
pub use vulnerabilities::{check_dependencies, VulnerabilityReport};

#[cfg(test)]
pub(crate) mod fakes {
    use crate::checker::AdvisorySource;
    use crate::error::FetchError;
    use crate::host::RepositoryHost;
    use crate::model::{Ecosystem, RepoRef, RepositoryMetadata, VulnerabilityMatch};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory host keyed by `owner/name`.
    #[derive(Default)]
    pub struct FakeHost {
        pub readmes: HashMap<String, String>,
        pub metadata: HashMap<String, RepositoryMetadata>,
        pub files: HashMap<(String, String), String>,
        pub broken_files: Vec<String>,
    }

    impl FakeHost {
        pub fn with_file(mut self, repo: &str, id: &str, content: &str) -> Self {
            self.files.insert((repo.to_string(), id.to_string()), content.to_string());
            self
        }

        pub fn with_repo(mut self, owner: &str, name: &str) -> Self {
            let full = format!("{}/{}", owner, name);
            self.metadata.insert(
                full.clone(),
                RepositoryMetadata {
                    owner: owner.to_string(),
                    name: name.to_string(),
                    description: format!("{} description", name),
                    stars: 10,
                    forks: 2,
                    collaborator_count: Some(3),
                    url: format!("https://github.com/{}", full),
                },
            );
            self
        }
    }

    #[async_trait]
    impl RepositoryHost for FakeHost {
        async fn fetch_readme(&self, repo: &RepoRef) -> Result<String, FetchError> {
            self.readmes
                .get(&repo.full_name())
                .cloned()
                .ok_or(FetchError::Status {
                    url: repo.html_url(),
                    status: 404,
                })
        }

        async fn fetch_repo_metadata(
            &self,
            repo: &RepoRef,
        ) -> Result<RepositoryMetadata, FetchError> {
            self.metadata
                .get(&repo.full_name())
                .cloned()
                .ok_or(FetchError::Status {
                    url: repo.html_url(),
                    status: 403,
                })
        }

        async fn fetch_file_content(
            &self,
            repo: &RepoRef,
            manifest_id: &str,
        ) -> Result<Option<String>, FetchError> {
            if self.broken_files.iter().any(|id| id == manifest_id) {
                return Err(FetchError::Status {
                    url: manifest_id.to_string(),
                    status: 500,
                });
            }
            Ok(self
                .files
                .get(&(repo.full_name(), manifest_id.to_string()))
                .cloned())
        }
    }

    /// In-memory advisory database keyed by package name.
    #[derive(Default)]
    pub struct FakeAdvisories {
        pub advisories: HashMap<String, Vec<VulnerabilityMatch>>,
        pub failing: Vec<String>,
        pub calls: AtomicUsize,
    }

    impl FakeAdvisories {
        pub fn with(mut self, name: &str, range: &str, severity: &str, id: &str) -> Self {
            self.advisories
                .entry(name.to_string())
                .or_default()
                .push(VulnerabilityMatch::new(
                    range,
                    severity,
                    format!("https://github.com/advisories/{}", id),
                    format!("{} advisory", id),
                ));
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AdvisorySource for FakeAdvisories {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_advisory_ranges(
            &self,
            _ecosystem: Ecosystem,
            name: &str,
        ) -> Result<Vec<VulnerabilityMatch>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.iter().any(|n| n == name) {
                return Err(FetchError::Advisory {
                    package: name.to_string(),
                    message: "rate limited".to_string(),
                });
            }
            Ok(self.advisories.get(name).cloned().unwrap_or_default())
        }
    }
}
