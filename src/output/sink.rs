//! CSV sinks for the batch pipelines.
//!
//! A sink is created with its header row and then only ever appended to;
//! each row is flushed as it is written so an interrupted run keeps what it
//! produced.

use crate::error::SinkError;
use crate::model::{
    DependencyRecord, Ecosystem, Operator, RepoRef, RepositoryMetadata, VulnerabilityMatch,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A row type with a fixed column layout.
pub trait SinkRow: Serialize {
    const HEADER: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRow {
    pub repo: String,
    pub url: String,
    pub source_file: String,
    pub ecosystem: Ecosystem,
    pub name: String,
    pub operator: Operator,
    pub version: String,
}

impl DependencyRow {
    pub fn new(repo: &RepoRef, url: &str, record: &DependencyRecord) -> Self {
        Self {
            repo: repo.full_name(),
            url: url.to_string(),
            source_file: record.source_file.clone(),
            ecosystem: record.ecosystem,
            name: record.name.clone(),
            operator: record.operator,
            version: record.version.clone(),
        }
    }
}

impl SinkRow for DependencyRow {
    const HEADER: &'static [&'static str] =
        &["repo", "url", "source_file", "ecosystem", "name", "operator", "version"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityRow {
    pub repo: String,
    pub ecosystem: Ecosystem,
    pub source_file: String,
    pub name: String,
    pub version: String,
    pub severity: String,
    pub advisory: String,
    pub url: String,
}

impl VulnerabilityRow {
    pub fn new(dependency: &DependencyRow, advisory: &VulnerabilityMatch) -> Self {
        Self {
            repo: dependency.repo.clone(),
            ecosystem: dependency.ecosystem,
            source_file: dependency.source_file.clone(),
            name: dependency.name.clone(),
            version: dependency.version.clone(),
            severity: advisory.severity.clone(),
            advisory: advisory.advisory_link.clone(),
            url: dependency.url.clone(),
        }
    }
}

impl SinkRow for VulnerabilityRow {
    const HEADER: &'static [&'static str] = &[
        "repo",
        "ecosystem",
        "source_file",
        "name",
        "version",
        "severity",
        "advisory",
        "url",
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRow {
    pub owner: String,
    pub name: String,
    pub description: String,
    pub stars: u64,
    pub forks: u64,
    pub collaborators: Option<u64>,
    pub url: String,
}

impl From<RepositoryMetadata> for RepositoryRow {
    fn from(metadata: RepositoryMetadata) -> Self {
        Self {
            owner: metadata.owner,
            name: metadata.name,
            description: metadata.description,
            stars: metadata.stars,
            forks: metadata.forks,
            collaborators: metadata.collaborator_count,
            url: metadata.url,
        }
    }
}

impl SinkRow for RepositoryRow {
    const HEADER: &'static [&'static str] =
        &["owner", "name", "description", "stars", "forks", "collaborators", "url"];
}

/// Receives rows of one type.
pub trait RowSink<R> {
    fn append(&mut self, row: &R) -> Result<(), SinkError>;
}

/// Collects rows in memory.
impl<R: Clone> RowSink<R> for Vec<R> {
    fn append(&mut self, row: &R) -> Result<(), SinkError> {
        self.push(row.clone());
        Ok(())
    }
}

/// An append-only CSV file whose header is written at creation.
pub struct CsvSink<R> {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
    _row: PhantomData<R>,
}

impl<R: SinkRow> CsvSink<R> {
    /// Creates (or truncates) `path` and writes the header row.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SinkError::Io {
                path: path.display().to_string(),
                source,
            })?;
        }
        let file = File::create(&path).map_err(|source| SinkError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .write_record(R::HEADER)
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|source| SinkError::Csv {
                path: path.display().to_string(),
                source,
            })?;

        Ok(Self {
            path,
            writer,
            rows: 0,
            _row: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended so far, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl<R: SinkRow> RowSink<R> for CsvSink<R> {
    fn append(&mut self, row: &R) -> Result<(), SinkError> {
        self.writer
            .serialize(row)
            .and_then(|_| self.writer.flush().map_err(csv::Error::from))
            .map_err(|source| SinkError::Csv {
                path: self.path.display().to_string(),
                source,
            })?;
        self.rows += 1;
        Ok(())
    }
}

/// Reads every row of a CSV file written by a [`CsvSink`].
pub fn read_rows<R: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<R>, SinkError> {
    let path = path.as_ref();
    let csv_error = |source| SinkError::Csv {
        path: path.display().to_string(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    reader
        .deserialize()
        .collect::<Result<Vec<R>, csv::Error>>()
        .map_err(csv_error)
}
