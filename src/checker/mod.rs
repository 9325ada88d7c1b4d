//! Advisory lookup and applicability filtering.
//!
//! An [`AdvisorySource`] returns every advisory range known for a package;
//! [`filter_applicable`] narrows those down to the ones that contain the
//! version actually in use.
//!
//! # Example
//!
//! ```no_run
//! use depscan::checker::{filter_applicable, AdvisorySource, GhsaClient};
//! use depscan::Ecosystem;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let source = GhsaClient::new(None, "https://api.github.com/graphql", 10)?;
//!     let advisories = source.fetch_advisory_ranges(Ecosystem::Npm, "lodash").await?;
//!     let outcome = filter_applicable("4.17.15", &advisories);
//!     println!("{} advisories apply", outcome.applicable.len());
//!     Ok(())
//! }
//! ```

mod cached;
mod filter;
mod ghsa;

pub use cached::CachedSource;
pub use filter::{filter_applicable, FilterOutcome, RejectedRange};
pub use ghsa::GhsaClient;

use crate::error::FetchError;
use crate::model::{Ecosystem, VulnerabilityMatch};
use async_trait::async_trait;

/// A database of vulnerable version ranges.
#[async_trait]
pub trait AdvisorySource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Every advisory range recorded for `name` in `ecosystem`. Ecosystems
    /// without an advisory database yield an empty list.
    async fn fetch_advisory_ranges(
        &self,
        ecosystem: Ecosystem,
        name: &str,
    ) -> Result<Vec<VulnerabilityMatch>, FetchError>;
}
