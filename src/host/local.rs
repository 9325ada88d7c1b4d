use super::RepositoryHost;
use crate::error::FetchError;
use crate::extractor::Registry;
use crate::model::{RepoRef, RepositoryMetadata};
use async_trait::async_trait;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const README_NAMES: [&str; 4] = ["README.md", "README", "README.rst", "README.txt"];

/// How deep discovery descends below the checkout root.
const MAX_DEPTH: usize = 8;

/// A manifest found in a checkout, with the identifier it parses as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredManifest {
    pub path: PathBuf,
    pub manifest_id: &'static str,
}

/// A repository checked out on local disk.
#[derive(Debug, Clone)]
pub struct LocalCheckout {
    root: PathBuf,
}

/// Dependency caches, build output and VCS metadata hold manifests that
/// belong to other projects.
fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|s| {
                s.starts_with('.')
                    || s == "node_modules"
                    || s == "target"
                    || s == "vendor"
                    || s == "venv"
                    || s == "__pycache__"
            })
            .unwrap_or(false)
}

impl LocalCheckout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every file below the root whose name the registry recognises, in path
    /// order.
    pub fn discover(&self, registry: &Registry) -> Vec<DiscoveredManifest> {
        WalkDir::new(&self.root)
            .max_depth(MAX_DEPTH)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored_dir(e))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!("skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let manifest_id = registry.resolve_file_name(entry.file_name().to_str()?)?;
                Some(DiscoveredManifest {
                    path: entry.into_path(),
                    manifest_id,
                })
            })
            .collect()
    }

    /// Path relative to the checkout root, for display and CSV rows.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    pub fn read(&self, path: &Path) -> Result<String, FetchError> {
        fs::read_to_string(path).map_err(|source| FetchError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    fn read_optional(&self, path: &Path) -> Result<Option<String>, FetchError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FetchError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}

/// The checkout answers for any repository reference: it is the repository.
#[async_trait]
impl RepositoryHost for LocalCheckout {
    async fn fetch_readme(&self, _repo: &RepoRef) -> Result<String, FetchError> {
        for name in README_NAMES {
            if let Some(content) = self.read_optional(&self.root.join(name))? {
                return Ok(content);
            }
        }
        Err(FetchError::Io {
            path: self.root.join(README_NAMES[0]).display().to_string(),
            source: std::io::Error::from(ErrorKind::NotFound),
        })
    }

    async fn fetch_repo_metadata(&self, repo: &RepoRef) -> Result<RepositoryMetadata, FetchError> {
        let name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| repo.name.clone());
        Ok(RepositoryMetadata {
            owner: repo.owner.clone(),
            name,
            description: String::new(),
            stars: 0,
            forks: 0,
            collaborator_count: None,
            url: self.root.display().to_string(),
        })
    }

    async fn fetch_file_content(
        &self,
        _repo: &RepoRef,
        manifest_id: &str,
    ) -> Result<Option<String>, FetchError> {
        let path = self.root.join(manifest_id);
        if !path.is_file() {
            return Ok(None);
        }
        self.read_optional(&path)
    }
}
