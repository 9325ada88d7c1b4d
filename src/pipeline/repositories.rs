use crate::host::{extract_github_urls, RepositoryHost};
use crate::model::RepoRef;
use crate::output::{RepositoryRow, RowSink};
use serde::Serialize;

/// Counts from one repository-collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoriesReport {
    /// Distinct repository URLs found in the seed README.
    pub discovered: usize,
    pub written: usize,
    pub failed: usize,
}

/// Reads the seed repository's README, then looks up and writes metadata for
/// every GitHub repository it links to, in the order they first appear.
///
/// A README that cannot be fetched aborts the run since there is nothing to
/// iterate. Individual repositories that fail are logged and skipped.
pub async fn collect_repositories<H, S>(
    host: &H,
    seed: &RepoRef,
    sink: &mut S,
) -> anyhow::Result<RepositoriesReport>
where
    H: RepositoryHost + ?Sized,
    S: RowSink<RepositoryRow> + ?Sized,
{
    let readme = host.fetch_readme(seed).await?;
    let urls = extract_github_urls(&readme);
    tracing::info!("{} repositories linked from {}", urls.len(), seed);

    let mut report = RepositoriesReport {
        discovered: urls.len(),
        ..Default::default()
    };

    for url in urls {
        let Some(repo) = RepoRef::from_url(&url) else {
            tracing::debug!("not a repository URL: {}", url);
            report.failed += 1;
            continue;
        };

        match host.fetch_repo_metadata(&repo).await {
            Ok(metadata) => {
                sink.append(&RepositoryRow::from(metadata))?;
                report.written += 1;
            }
            Err(e) => {
                tracing::warn!("skipping {}: {}", repo, e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
