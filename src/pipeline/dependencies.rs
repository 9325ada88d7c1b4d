use crate::error::SinkError;
use crate::extractor::Registry;
use crate::host::{LocalCheckout, RepositoryHost};
use crate::model::RepoRef;
use crate::output::{DependencyRow, RowSink};
use futures::stream::{self, StreamExt};
use serde::Serialize;

/// What one manifest contributed to a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestSummary {
    /// Path within the repository.
    pub path: String,
    pub manifest_id: &'static str,
    pub dependencies: usize,
}

/// Fetches each manifest in `manifest_ids` from the repository root, parses
/// it and appends one row per dependency.
///
/// Up to `concurrency` downloads run at once, but rows are written in the
/// order of `manifest_ids`. Missing files are skipped silently, files that
/// fail to download are logged and skipped. Unknown identifiers are ignored.
pub async fn collect_dependencies<H, S>(
    host: &H,
    registry: &Registry,
    repo: &RepoRef,
    manifest_ids: &[&str],
    concurrency: usize,
    sink: &mut S,
) -> Result<Vec<ManifestSummary>, SinkError>
where
    H: RepositoryHost + ?Sized,
    S: RowSink<DependencyRow> + ?Sized,
{
    let url = repo.html_url();
    let formats: Vec<_> = manifest_ids
        .iter()
        .filter_map(|id| {
            let format = registry.get(id);
            if format.is_none() {
                tracing::debug!("no parser registered for {}", id);
            }
            format
        })
        .collect();

    let mut downloads = stream::iter(formats)
        .map(|format| async move {
            let content = host.fetch_file_content(repo, format.id).await;
            (format, content)
        })
        .buffered(concurrency.max(1));

    let mut summaries = Vec::new();
    while let Some((format, content)) = downloads.next().await {
        let content = match content {
            Ok(Some(content)) => content,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("{}: could not fetch {}: {}", repo, format.id, e);
                continue;
            }
        };

        let records = format.parse(&content);
        tracing::info!("{}: {} dependencies in {}", repo, records.len(), format.id);
        for record in &records {
            sink.append(&DependencyRow::new(repo, &url, record))?;
        }
        summaries.push(ManifestSummary {
            path: format.id.to_string(),
            manifest_id: format.id,
            dependencies: records.len(),
        });
    }

    Ok(summaries)
}

/// Walks a checkout, parses every recognised manifest and appends one row per
/// dependency. The row's `source_file` is the manifest's path relative to the
/// checkout root.
pub fn collect_from_checkout<S>(
    checkout: &LocalCheckout,
    registry: &Registry,
    repo: &RepoRef,
    sink: &mut S,
) -> Result<Vec<ManifestSummary>, SinkError>
where
    S: RowSink<DependencyRow> + ?Sized,
{
    let url = checkout.root().display().to_string();
    let mut summaries = Vec::new();

    for manifest in checkout.discover(registry) {
        let relative = checkout.relative(&manifest.path).display().to_string();
        let content = match checkout.read(&manifest.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("{}", e);
                continue;
            }
        };

        let records = registry.extract(manifest.manifest_id, &content);
        for record in &records {
            let mut row = DependencyRow::new(repo, &url, record);
            row.source_file = relative.clone();
            sink.append(&row)?;
        }
        summaries.push(ManifestSummary {
            path: relative,
            manifest_id: manifest.manifest_id,
            dependencies: records.len(),
        });
    }

    Ok(summaries)
}
