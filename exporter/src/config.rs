//! Export configuration loaded from `depexport.toml`.
//!
//! The file declares the output directory, the repositories to probe and a
//! table of named export jobs. Everything is resolved eagerly at load time:
//! relative paths are anchored to the configuration file's directory, digest
//! algorithm names are parsed and repository URLs are validated, so that a
//! configuration that loads successfully can be exported without further
//! validation.
//!
//! ```toml
//! output_dir = "build/generated/dependencyExport"
//!
//! [[repositories]]
//! url = "https://repo.maven.apache.org/maven2"
//!
//! [exports.runtime]
//! path = "META-INF/dependencies/runtime.json"
//! artifacts = "build/resolution/runtime.json"
//! exclude_classifiers = ["sources"]
//!
//! [exports.runtime.constraints.natives-linux]
//! systems = ["linux"]
//! archs = ["x64"]
//! ```

use crate::constraint::ConstraintTable;
use crate::digest::{DigestError, NamedAlgorithm};
use crate::repository::{InvalidRepositoryUrl, MavenRepository};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use log::warn;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Configuration file name looked up when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "depexport.toml";

/// Output directory used when the configuration does not set one.
pub const DEFAULT_OUTPUT_DIR: &str = "build/generated/dependencyExport";

/// Errors arising while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Read {
        /// The configuration file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or has unexpected keys.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required job setting is missing.
    #[error("export \"{job}\" does not set `{field}`")]
    MissingField {
        /// The job name.
        job: String,
        /// The missing key.
        field: &'static str,
    },

    /// The destination path of a job is unusable.
    #[error("export \"{job}\" has invalid path \"{path}\": {reason}")]
    InvalidPath {
        /// The job name.
        job: String,
        /// The rejected path.
        path: String,
        /// Why the path was rejected.
        reason: &'static str,
    },

    /// A job names a digest algorithm this build cannot compute.
    #[error("export \"{job}\": {source}")]
    Algorithm {
        /// The job name.
        job: String,
        /// The digest error.
        #[source]
        source: DigestError,
    },

    /// A repository URL is malformed.
    #[error(transparent)]
    Repository(#[from] InvalidRepositoryUrl),
}

/// Result type alias using [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The layout a declared repository uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryLayout {
    /// Standard Maven layout; the only layout probed.
    #[default]
    Maven,
    /// Ivy pattern layout.
    Ivy,
    /// Flat directory of files.
    Flat,
}

impl fmt::Display for RepositoryLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Maven => f.write_str("maven"),
            Self::Ivy => f.write_str("ivy"),
            Self::Flat => f.write_str("flat"),
        }
    }
}

/// A repository declaration as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Base URL of the repository.
    pub url: String,
    /// Repository layout; defaults to Maven.
    #[serde(default)]
    pub layout: RepositoryLayout,
}

/// Classifiers excluded from an export.
///
/// `None` is the bucket of unclassified artifacts and is only excluded when
/// added explicitly.
///
/// # Examples
///
/// ```
/// use depexport::config::ExcludedClassifiers;
///
/// let mut excluded = ExcludedClassifiers::default();
/// excluded.insert(Some("sources"));
/// assert!(excluded.contains(Some("sources")));
/// assert!(!excluded.contains(None));
///
/// excluded.insert(None);
/// assert!(excluded.contains(None));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludedClassifiers(BTreeSet<Option<String>>);

impl ExcludedClassifiers {
    /// Exclude a classifier bucket.
    pub fn insert(&mut self, classifier: Option<&str>) {
        self.0.insert(classifier.map(str::to_owned));
    }

    /// Return true if artifacts with `classifier` are excluded.
    #[must_use]
    pub fn contains(&self, classifier: Option<&str>) -> bool {
        self.0.contains(&classifier.map(str::to_owned))
    }

    /// Return true when nothing is excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<Option<&'a str>> for ExcludedClassifiers {
    fn from_iter<I: IntoIterator<Item = Option<&'a str>>>(iter: I) -> Self {
        Self(iter.into_iter().map(|c| c.map(str::to_owned)).collect())
    }
}

/// One export job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Job name, unique within a configuration.
    pub name: String,
    /// Destination relative to the output directory.
    pub path: Utf8PathBuf,
    /// Resolution report listing the job's resolved artifacts.
    pub artifacts: Utf8PathBuf,
    /// Algorithm used for the `digest` field.
    pub digest_algorithm: NamedAlgorithm,
    /// Remove the destination instead of writing `[]` when nothing remains.
    pub skip_when_empty: bool,
    /// Emit the `digestAlgorithm` field on every entry.
    pub write_digest_algorithm: bool,
    /// Classifier buckets left out of the manifest.
    pub excluded_classifiers: ExcludedClassifiers,
    /// Platform annotations keyed by classifier.
    pub constraints: ConstraintTable,
}

impl ExportConfig {
    /// Create a job with default settings.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        path: impl Into<Utf8PathBuf>,
        artifacts: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            artifacts: artifacts.into(),
            digest_algorithm: NamedAlgorithm::default(),
            skip_when_empty: false,
            write_digest_algorithm: false,
            excluded_classifiers: ExcludedClassifiers::default(),
            constraints: ConstraintTable::default(),
        }
    }

    /// Return the manifest destination under `output_dir`.
    #[must_use]
    pub fn destination(&self, output_dir: &Utf8Path) -> Utf8PathBuf {
        output_dir.join(&self.path)
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    /// Directory manifests are written under.
    pub output_dir: Utf8PathBuf,
    /// Maven repositories, in probe order.
    pub repositories: Vec<MavenRepository>,
    /// Export jobs keyed by name; iterated in name order.
    pub exports: BTreeMap<String, ExportConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    output_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    repositories: Vec<RepositoryConfig>,
    #[serde(default)]
    exports: BTreeMap<String, RawExportConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExportConfig {
    path: Option<String>,
    artifacts: Option<Utf8PathBuf>,
    digest_algorithm: Option<String>,
    #[serde(default)]
    skip_when_empty: bool,
    #[serde(default)]
    write_digest_algorithm: bool,
    #[serde(default)]
    exclude_classifiers: Vec<String>,
    #[serde(default)]
    exclude_unclassified: bool,
    #[serde(default)]
    constraints: ConstraintTable,
}

impl ExporterConfig {
    /// Load and validate the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, does not parse,
    /// or fails validation.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Utf8Path::new(""));
        Self::from_toml_str(&contents, base_dir)
    }

    /// Parse configuration text, anchoring relative paths at `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the text does not parse or fails
    /// validation.
    pub fn from_toml_str(contents: &str, base_dir: &Utf8Path) -> Result<Self> {
        let raw: RawConfig = toml::from_str(contents)?;

        let output_dir = raw
            .output_dir
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_DIR));
        let repositories = maven_repositories(&raw.repositories)?;
        let exports = raw
            .exports
            .into_iter()
            .map(|(name, job)| {
                let config = job.into_export_config(&name, base_dir)?;
                Ok((name, config))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            output_dir: anchor(base_dir, output_dir),
            repositories,
            exports,
        })
    }
}

impl RawExportConfig {
    fn into_export_config(self, name: &str, base_dir: &Utf8Path) -> Result<ExportConfig> {
        let missing = |field| ConfigError::MissingField {
            job: name.to_owned(),
            field,
        };
        let path = self.path.ok_or_else(|| missing("path"))?;
        let artifacts = self.artifacts.ok_or_else(|| missing("artifacts"))?;
        validate_destination(name, &path)?;

        let digest_algorithm = match self.digest_algorithm.as_deref() {
            Some(algorithm) => {
                NamedAlgorithm::parse(algorithm).map_err(|source| ConfigError::Algorithm {
                    job: name.to_owned(),
                    source,
                })?
            }
            None => NamedAlgorithm::default(),
        };

        let mut excluded_classifiers: ExcludedClassifiers = self
            .exclude_classifiers
            .iter()
            .map(|classifier| Some(classifier.as_str()))
            .collect();
        if self.exclude_unclassified {
            excluded_classifiers.insert(None);
        }

        Ok(ExportConfig {
            name: name.to_owned(),
            path: Utf8PathBuf::from(path),
            artifacts: anchor(base_dir, artifacts),
            digest_algorithm,
            skip_when_empty: self.skip_when_empty,
            write_digest_algorithm: self.write_digest_algorithm,
            excluded_classifiers,
            constraints: self.constraints,
        })
    }
}

fn validate_destination(job: &str, path: &str) -> Result<()> {
    let invalid = |reason| ConfigError::InvalidPath {
        job: job.to_owned(),
        path: path.to_owned(),
        reason,
    };
    if path.trim().is_empty() {
        return Err(invalid("path is empty"));
    }
    let relative = Utf8Path::new(path);
    if relative.is_absolute() {
        return Err(invalid("path must be relative to the output directory"));
    }
    if relative
        .components()
        .any(|component| component == Utf8Component::ParentDir)
    {
        return Err(invalid("path must stay inside the output directory"));
    }
    Ok(())
}

/// Keep Maven repositories in declaration order, skipping other layouts.
fn maven_repositories(declared: &[RepositoryConfig]) -> Result<Vec<MavenRepository>> {
    let mut repositories = Vec::with_capacity(declared.len());
    for repository in declared {
        if repository.layout != RepositoryLayout::Maven {
            warn!(
                "Skipping {} repository {}: only Maven layouts are probed.",
                repository.layout, repository.url
            );
            continue;
        }
        repositories.push(MavenRepository::parse(&repository.url)?);
    }
    Ok(repositories)
}

fn anchor(base_dir: &Utf8Path, path: Utf8PathBuf) -> Utf8PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
