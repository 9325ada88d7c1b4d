//! Error types shared across the crate.
//!
//! Parsers never return errors: a malformed manifest is simply a manifest with
//! no dependencies. The types here cover what callers need to observe.

use thiserror::Error;

/// A version string that cannot be read as dotted numeric components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("empty version string")]
    Empty,

    #[error("version `{version}` has a non-numeric component `{component}`")]
    NonNumeric { version: String, component: String },
}

/// A version range (or the version it is evaluated against) that cannot be
/// evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("clause `{clause}` in range `{range}`: {source}")]
    Clause {
        range: String,
        clause: String,
        #[source]
        source: VersionError,
    },

    #[error("operator `{operator}` in range `{range}` has no version")]
    DanglingOperator { range: String, operator: String },

    #[error("subject version: {0}")]
    Subject(#[source] VersionError),
}

/// A collaborator failed to deliver data for one item.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {details}")]
    Decode { url: String, details: String },

    #[error("advisory query for {package} failed: {message}")]
    Advisory { package: String, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// An output sink could not be written or read.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("CSV error on {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
