//! Error types for dependency manifest export.
//!
//! Every failure other than a missing artifact URL aborts the job it occurs
//! in. The variants carry the path or URL involved so the CLI can report
//! them without further context.

use crate::config::ConfigError;
use crate::coordinate::CoordinateError;
use crate::digest::DigestError;
use crate::repository::ProbeError;
use crate::source::SourceError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while exporting manifests.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The resolved artifacts of a job could not be obtained.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A module coordinate is malformed.
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),

    /// A repository probe failed for a reason other than "not found".
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// A local artifact could not be hashed.
    #[error(transparent)]
    Digest(#[from] DigestError),

    /// A job requested on the command line is not configured.
    #[error("no export named \"{name}\" is configured")]
    UnknownJob {
        /// The requested job name.
        name: String,
    },

    /// The destination directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        /// The directory path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest could not be written or persisted.
    #[error("failed to write manifest {path}: {source}")]
    Write {
        /// The destination path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A manifest entry could not be serialized.
    #[error("failed to serialize manifest {path}: {source}")]
    Serialize {
        /// The destination path.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A stale manifest could not be removed for an empty job.
    #[error("failed to remove stale manifest {path}: {source}")]
    RemoveStale {
        /// The destination path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`ExportError`].
pub type Result<T> = std::result::Result<T, ExportError>;
