use super::AdvisorySource;
use crate::cache::Cache;
use crate::error::FetchError;
use crate::model::{Ecosystem, VulnerabilityMatch};
use async_trait::async_trait;

/// Wraps an advisory source with the on-disk [`Cache`]. Only successful
/// lookups are stored.
pub struct CachedSource<S> {
    inner: S,
    cache: Cache,
}

impl<S: AdvisorySource> CachedSource<S> {
    pub fn new(inner: S, cache: Cache) -> Self {
        Self { inner, cache }
    }

    fn cache_key(ecosystem: Ecosystem, name: &str) -> String {
        format!("advisories_{}_{}", ecosystem.as_str(), name)
    }
}

#[async_trait]
impl<S: AdvisorySource> AdvisorySource for CachedSource<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn fetch_advisory_ranges(
        &self,
        ecosystem: Ecosystem,
        name: &str,
    ) -> Result<Vec<VulnerabilityMatch>, FetchError> {
        let key = Self::cache_key(ecosystem, name);
        if let Some(cached) = self.cache.get::<Vec<VulnerabilityMatch>>(&key) {
            tracing::debug!("cache hit for {}", key);
            return Ok(cached);
        }

        let fresh = self.inner.fetch_advisory_ranges(ecosystem, name).await?;
        if let Err(e) = self.cache.set(&key, &fresh) {
            tracing::warn!("could not cache advisories for {}: {:#}", name, e);
        }
        Ok(fresh)
    }
}
