use crate::checker::{filter_applicable, AdvisorySource};
use crate::config::IgnoreConfig;
use crate::error::SinkError;
use crate::model::{Ecosystem, VulnerabilityMatch};
use crate::output::{DependencyRow, RowSink, VulnerabilityRow};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Counts from one vulnerability-check run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VulnerabilityReport {
    /// Dependency rows evaluated against advisories.
    pub checked: usize,
    /// Rows skipped: ignored packages, unversioned rows and ecosystems the
    /// advisory database does not cover.
    pub skipped: usize,
    /// Distinct packages whose advisory lookup failed.
    pub lookup_failures: usize,
    /// Advisory ranges that could not be evaluated.
    pub rejected_ranges: usize,
    pub findings: usize,
}

type PackageKey = (Ecosystem, String);

fn is_checkable(row: &DependencyRow, ignore: &IgnoreConfig) -> bool {
    if ignore.should_ignore_package(&row.name) {
        tracing::debug!("ignoring {}", row.name);
        return false;
    }
    if row.version.trim().is_empty() {
        return false;
    }
    row.ecosystem.advisory_ecosystem().is_some()
}

/// Looks up advisories for every dependency row and appends one
/// [`VulnerabilityRow`] per advisory whose range contains the row's version.
///
/// Each distinct package is looked up once, with up to `concurrency` lookups
/// in flight. Names and versions are passed through exactly as the manifest
/// declared them. Findings are written in dependency-row order, and within a
/// row in the order the source returned them.
pub async fn check_dependencies<A, S>(
    source: &A,
    dependencies: &[DependencyRow],
    ignore: &IgnoreConfig,
    concurrency: usize,
    sink: &mut S,
) -> Result<VulnerabilityReport, SinkError>
where
    A: AdvisorySource + ?Sized,
    S: RowSink<VulnerabilityRow> + ?Sized,
{
    let mut report = VulnerabilityReport::default();

    let mut seen = HashSet::new();
    let packages: Vec<PackageKey> = dependencies
        .iter()
        .filter(|row| is_checkable(row, ignore))
        .map(|row| (row.ecosystem, row.name.clone()))
        .filter(|key| seen.insert(key.clone()))
        .collect();
    tracing::info!(
        "looking up advisories for {} packages via {}",
        packages.len(),
        source.name()
    );

    let advisories: HashMap<PackageKey, Vec<VulnerabilityMatch>> = stream::iter(packages)
        .map(|key| async move {
            let result = source.fetch_advisory_ranges(key.0, &key.1).await;
            (key, result)
        })
        .buffer_unordered(concurrency.max(1))
        .filter_map(|(key, result)| {
            let entry = match result {
                Ok(matches) => Some((key, matches)),
                Err(e) => {
                    tracing::warn!("{}", e);
                    None
                }
            };
            futures::future::ready(entry)
        })
        .collect()
        .await;
    report.lookup_failures = seen.len() - advisories.len();

    for row in dependencies {
        if !is_checkable(row, ignore) {
            report.skipped += 1;
            continue;
        }
        let Some(candidates) = advisories.get(&(row.ecosystem, row.name.clone())) else {
            continue;
        };
        report.checked += 1;

        let outcome = filter_applicable(&row.version, candidates);
        for rejected in &outcome.rejected {
            tracing::warn!("{} {}: skipping range: {}", row.name, row.version, rejected.error);
        }
        report.rejected_ranges += outcome.rejected.len();

        for advisory in outcome
            .applicable
            .iter()
            .filter(|a| !ignore.should_ignore_advisory(&a.advisory_link))
        {
            sink.append(&VulnerabilityRow::new(row, advisory))?;
            report.findings += 1;
        }
    }

    Ok(report)
}
