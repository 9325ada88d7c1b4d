use serde::{Deserialize, Serialize};

/// Summary information about a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    pub owner: String,
    pub name: String,
    pub description: String,
    pub stars: u64,
    pub forks: u64,
    /// `None` when the host refuses to list collaborators.
    pub collaborator_count: Option<u64>,
    pub url: String,
}

/// An `owner/name` pair identifying a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Takes the last two path segments of a repository URL. A URL with a
    /// host needs both an owner and a name after it.
    ///
    /// ```
    /// use depscan::model::RepoRef;
    ///
    /// let repo = RepoRef::from_url("https://github.com/psf/requests/").unwrap();
    /// assert_eq!(repo.full_name(), "psf/requests");
    /// assert!(RepoRef::from_url("https://github.com/psf").is_none());
    /// ```
    pub fn from_url(url: &str) -> Option<Self> {
        let trimmed = url.trim().trim_end_matches('/').trim_end_matches(".git");
        let (has_scheme, rest) = match trimmed.split_once("://") {
            Some((_, rest)) => (true, rest),
            None => (false, trimmed),
        };

        let mut segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
        let starts_with_host = segments.first().map(|s| s.contains('.')).unwrap_or(false);
        if has_scheme || (starts_with_host && segments.len() > 2) {
            segments.remove(0);
        }

        let [.., owner, name] = segments.as_slice() else {
            return None;
        };
        if owner.contains([':', '.']) || name.contains(':') {
            return None;
        }
        Some(Self::new(*owner, *name))
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_ref_from_url() {
        let repo = RepoRef::from_url("https://github.com/rust-lang/cargo").unwrap();
        assert_eq!(repo.owner, "rust-lang");
        assert_eq!(repo.name, "cargo");

        let repo = RepoRef::from_url("https://github.com/rust-lang/cargo.git/").unwrap();
        assert_eq!(repo.name, "cargo");
    }

    #[test]
    fn test_repo_ref_rejects_bare_host() {
        assert!(RepoRef::from_url("https://github.com").is_none());
        assert!(RepoRef::from_url("cargo").is_none());
    }

    #[test]
    fn test_repo_ref_rejects_owner_only_url() {
        assert!(RepoRef::from_url("https://github.com/rust-lang").is_none());
        assert!(RepoRef::from_url("https://github.com/rust-lang/").is_none());
        assert!(RepoRef::from_url("github.com/rust-lang").is_none());

        let repo = RepoRef::from_url("github.com/rust-lang/cargo").unwrap();
        assert_eq!(repo.full_name(), "rust-lang/cargo");
    }

    #[test]
    fn test_repo_ref_accepts_owner_slash_name() {
        let repo = RepoRef::from_url("psf/requests").unwrap();
        assert_eq!(repo.html_url(), "https://github.com/psf/requests");
    }
}
