pub mod cache;
pub mod checker;
pub mod config;
pub mod error;
pub mod extractor;
pub mod host;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod version;

pub use cache::Cache;
pub use config::Config;
pub use error::{FetchError, RangeError, SinkError, VersionError};
pub use model::{
    DependencyRecord, Ecosystem, Operator, RepoRef, RepositoryMetadata, Severity,
    VulnerabilityMatch,
};
