//! Configuration file handling.
//!
//! Settings live in a TOML file at:
//! - Linux: `~/.config/depscan/config.toml`
//! - macOS: `~/Library/Application Support/depscan/config.toml`
//! - Windows: `%APPDATA%\depscan\config.toml`
//!
//! A `GITHUB_TOKEN` environment variable (also read from `.env`) takes
//! precedence over `github_token` in the file.
//!
//! # Example Configuration
//!
//! ```toml
//! api_url = "https://api.github.com"
//! graphql_url = "https://api.github.com/graphql"
//! cache_ttl_hours = 24
//! advisories_per_package = 10
//! concurrency = 8
//! manifests = ["package.json", "requirements.txt"]
//!
//! [ignore]
//! packages = ["@types/*"]
//! advisories = ["https://github.com/advisories/GHSA-xxxx-xxxx-xxxx"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Application configuration.
///
/// # Example
///
/// ```no_run
/// use depscan::Config;
///
/// let config = Config::load().unwrap();
/// println!("Cache TTL: {} hours", config.cache_ttl_hours);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Token for the GitHub REST and GraphQL APIs.
    pub github_token: Option<String>,

    /// Base URL of the GitHub REST API.
    pub api_url: String,

    /// GitHub GraphQL endpoint used for advisory lookups.
    pub graphql_url: String,

    /// How long advisory lookups stay cached, in hours.
    pub cache_ttl_hours: u64,

    /// Maximum advisories requested per package.
    pub advisories_per_package: u32,

    /// Number of requests in flight at once.
    pub concurrency: usize,

    /// Manifest identifiers to probe in a repository. Empty means every
    /// registered format.
    pub manifests: Vec<String>,

    #[serde(default)]
    pub ignore: IgnoreConfig,
}

/// Suppression lists for accepted risks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Package names to skip during advisory lookups. Supports `*` globs
    /// (`@types/*`, `*-dev`).
    pub packages: Vec<String>,

    /// Advisory links that are never reported.
    pub advisories: Vec<String>,
}

impl IgnoreConfig {
    pub fn should_ignore_package(&self, name: &str) -> bool {
        self.packages.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, name)
            } else {
                pattern == name
            }
        })
    }

    pub fn should_ignore_advisory(&self, advisory_link: &str) -> bool {
        self.advisories.iter().any(|link| link == advisory_link)
    }
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let (first, last) = (parts[0], parts[parts.len() - 1]);
    if text.len() < first.len() + last.len() || !text.starts_with(first) || !text.ends_with(last) {
        return false;
    }

    let mut remaining = &text[first.len()..text.len() - last.len()];
    for part in parts[1..parts.len() - 1].iter().filter(|p| !p.is_empty()) {
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: None,
            api_url: "https://api.github.com".to_string(),
            graphql_url: "https://api.github.com/graphql".to_string(),
            cache_ttl_hours: 24,
            advisories_per_package: 10,
            concurrency: 8,
            manifests: Vec::new(),
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads the config file (defaults if it does not exist), then applies
    /// the environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// `GITHUB_TOKEN` overrides the configured token when set and non-empty.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.github_token = Some(token.trim().to_string());
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depscan")
            .join("config.toml")
    }

    pub fn generate_default_config() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }

    /// Concurrency with a floor of one.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}
