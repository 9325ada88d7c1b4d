//! Core data types for dependency records, advisories, and repositories.
//!
//! This module contains the fundamental types used throughout depscan:
//!
//! - [`DependencyRecord`] - A dependency declared in a manifest file
//! - [`Operator`] - The constraint operator attached to a declared version
//! - [`Ecosystem`] - The package-manager family a manifest belongs to
//! - [`VulnerabilityMatch`] - An advisory range with its metadata
//! - [`Severity`] - Advisory severity levels used for exit codes
//! - [`RepositoryMetadata`] - Summary information about a hosted repository
//!
//! # Example
//!
//! ```
//! use depscan::{DependencyRecord, Ecosystem, Operator};
//!
//! let record = DependencyRecord::new("requests", Operator::Eq, "2.28.0", Ecosystem::Pip, "requirements.txt");
//!
//! assert_eq!(record.operator.as_str(), "==");
//! ```

mod dependency;
mod repository;
mod vulnerability;

pub use dependency::*;
pub use repository::*;
pub use vulnerability::*;
