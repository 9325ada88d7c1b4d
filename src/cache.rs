//! File-based cache for advisory lookups.
//!
//! Entries are JSON files under the platform cache directory
//! (`~/.cache/depscan/` on Linux, `~/Library/Caches/depscan/` on macOS,
//! `%LOCALAPPDATA%\depscan\` on Windows) and expire after a TTL measured
//! from the file's modification time.
//!
//! # Example
//!
//! ```no_run
//! use depscan::Cache;
//!
//! let cache = Cache::with_ttl_hours(6);
//! cache.set("advisories_npm_lodash", &vec!["< 4.17.21".to_string()]).unwrap();
//!
//! let ranges: Option<Vec<String>> = cache.get("advisories_npm_lodash");
//! assert!(ranges.is_some());
//! ```

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const DEFAULT_TTL_HOURS: u64 = 24;

/// Returns the directory cached responses are written to.
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("depscan")
}

/// A JSON file cache with per-entry expiry.
#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
    ttl: Duration,
}

impl Cache {
    pub fn new() -> Self {
        Self::with_ttl_hours(DEFAULT_TTL_HOURS)
    }

    pub fn with_ttl_hours(hours: u64) -> Self {
        Self::in_dir(cache_dir(), hours)
    }

    /// A cache rooted at `dir` instead of the platform cache directory.
    pub fn in_dir(dir: impl Into<PathBuf>, hours: u64) -> Self {
        Self {
            dir: dir.into(),
            ttl: Duration::from_secs(hours * 3600),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys may contain anything a package name can (`@scope/pkg`,
    /// `group:artifact`); characters outside `[A-Za-z0-9_-]` are hex-escaped
    /// so distinct keys never share a file.
    fn cache_path(&self, key: &str) -> PathBuf {
        let mut safe_key = String::with_capacity(key.len());
        for c in key.chars() {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                safe_key.push(c);
            } else {
                safe_key.push_str(&format!("~{:x}", c as u32));
            }
        }
        self.dir.join(format!("{}.json", safe_key))
    }

    fn is_expired(&self, path: &Path) -> bool {
        fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .map(|elapsed| elapsed > self.ttl)
            .unwrap_or(false)
    }

    /// Returns the cached value for `key`, or `None` when it is missing,
    /// expired or unreadable. Expired entries are removed.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.cache_path(key);
        if !path.exists() {
            return None;
        }

        if self.is_expired(&path) {
            let _ = fs::remove_file(&path);
            return None;
        }

        let content = fs::read_to_string(&path).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating cache directory {}", self.dir.display()))?;
        let path = self.cache_path(key);
        let content = serde_json::to_string(value)?;
        fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Removes every cached entry and returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false)
                && fs::remove_file(&path).is_ok()
            {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_then_get() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::in_dir(dir.path(), 1);

        cache.set("advisories_npm_lodash", &vec!["< 4.17.21"]).unwrap();
        let value: Option<Vec<String>> = cache.get("advisories_npm_lodash");
        assert_eq!(value, Some(vec!["< 4.17.21".to_string()]));
    }

    #[test]
    fn test_missing_key() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::in_dir(dir.path(), 1);
        let value: Option<String> = cache.get("nothing");
        assert!(value.is_none());
    }

    #[test]
    fn test_zero_ttl_expires() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::in_dir(dir.path(), 0);
        cache.set("key", &1u32).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        let value: Option<u32> = cache.get("key");
        assert!(value.is_none());
    }

    #[test]
    fn test_keys_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::in_dir(dir.path(), 1);
        cache.set("npm_@a/b", &"scoped").unwrap();
        cache.set("npm__a_b", &"plain").unwrap();
        assert_eq!(cache.get::<String>("npm_@a/b").as_deref(), Some("scoped"));
        assert_eq!(cache.get::<String>("npm__a_b").as_deref(), Some("plain"));
    }

    #[test]
    fn test_clear_counts_entries() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::in_dir(dir.path(), 1);
        cache.set("a", &1).unwrap();
        cache.set("b", &2).unwrap();
        assert_eq!(cache.clear().unwrap(), 2);
        assert!(cache.get::<i32>("a").is_none());
    }
}
