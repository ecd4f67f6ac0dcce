//! Manifest generation.
//!
//! A manifest is a JSON array with one object per module artifact:
//!
//! ```json
//! [
//!   {
//!     "name": "org.lwjgl:lwjgl:3.3.1:natives-linux",
//!     "url": "https://repo.maven.apache.org/maven2/org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1-natives-linux.jar",
//!     "size": 131072,
//!     "digest": "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08",
//!     "systems": [
//!       "linux"
//!     ]
//!   }
//! ]
//! ```
//!
//! Entries are serialized as soon as they are built, so memory use does not
//! grow with the number of artifacts. The document is streamed into a
//! temporary file beside the destination and only persisted over it once the
//! closing bracket has been written; a failed job leaves the previous
//! manifest in place.

use crate::config::ExportConfig;
use crate::constraint::ConstraintTable;
use crate::coordinate::{ModuleCoordinate, ResolvedArtifact};
use crate::digest::{DigestError, NamedAlgorithm, hex_digest_file};
use crate::error::{ExportError, Result};
use crate::repository::RepositoryResolver;
use camino::Utf8Path;
use log::{debug, warn};
use serde::Serialize;
use serde::ser::{SerializeSeq, Serializer as _};
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::{BufWriter, Write};
use tempfile::NamedTempFile;

/// Indentation used for manifest output.
const INDENT: &[u8] = b"  ";

/// Per-job settings that shape manifest entries.
#[derive(Debug, Clone, Copy)]
pub struct ManifestSettings<'a> {
    /// Algorithm for the `digest` field, with its configured name.
    pub digest_algorithm: &'a NamedAlgorithm,
    /// Whether to emit `digestAlgorithm` on every entry.
    pub write_digest_algorithm: bool,
    /// Platform annotations keyed by classifier.
    pub constraints: &'a ConstraintTable,
}

impl<'a> ManifestSettings<'a> {
    /// Borrow the manifest settings of an export job.
    #[must_use]
    pub fn for_job(job: &'a ExportConfig) -> Self {
        Self {
            digest_algorithm: &job.digest_algorithm,
            write_digest_algorithm: job.write_digest_algorithm,
            constraints: &job.constraints,
        }
    }
}

/// One manifest object. Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry<'a> {
    /// `group:module:version[:classifier]`.
    pub name: String,
    /// Download URL, absent when no repository serves the artifact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Local file length in bytes.
    pub size: u64,
    /// Lowercase hex digest of the local file.
    pub digest: String,
    /// Configured algorithm name, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest_algorithm: Option<&'a str>,
    /// Operating systems declared for the classifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systems: Option<&'a [String]>,
    /// Architectures declared for the classifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archs: Option<&'a [String]>,
}

/// Counts reported after a manifest has been written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifestReport {
    /// Number of entries written.
    pub entries: usize,
    /// Number of entries written without a `url`.
    pub missing_urls: usize,
}

/// Build the manifest entry for one artifact.
///
/// Returns `Ok(None)` for artifacts without a module coordinate. A missing
/// URL is logged and yields an entry without `url`.
///
/// # Errors
///
/// Returns [`ExportError::Probe`] when a repository probe fails and
/// [`ExportError::Digest`] when the local file cannot be read.
pub fn build_entry<'a>(
    artifact: &ResolvedArtifact,
    resolver: &RepositoryResolver<'_>,
    settings: &ManifestSettings<'a>,
) -> Result<Option<ManifestEntry<'a>>> {
    let Some(coordinate) = artifact.coordinate() else {
        debug!(
            "Skipping non-module artifact {}",
            artifact.file().display()
        );
        return Ok(None);
    };
    let name = coordinate.name();
    let url = locate(&coordinate, &name, resolver)?;

    let file = artifact.file();
    let size = fs::metadata(file)
        .map_err(|source| DigestError::Io {
            path: file.to_path_buf(),
            source,
        })?
        .len();
    let digest = hex_digest_file(file, settings.digest_algorithm.algorithm())?;

    let constraint = settings.constraints.find(coordinate.classifier());
    Ok(Some(ManifestEntry {
        name,
        url,
        size,
        digest,
        digest_algorithm: settings
            .write_digest_algorithm
            .then(|| settings.digest_algorithm.name()),
        systems: constraint.and_then(|c| c.systems()),
        archs: constraint.and_then(|c| c.archs()),
    }))
}

fn locate(
    coordinate: &ModuleCoordinate<'_>,
    name: &str,
    resolver: &RepositoryResolver<'_>,
) -> Result<Option<String>> {
    let path = coordinate.repository_path();
    let url = resolver.resolve(&path)?;
    if url.is_none() {
        warn!("Artifact URL not found.");
        warn!("Name: {name}");
        warn!("Path: {path}");
    }
    Ok(url)
}

/// Write the manifest for `artifacts` to `destination`.
///
/// Parent directories are created as needed. Artifacts are processed in
/// order and non-module artifacts are skipped.
///
/// # Errors
///
/// Returns an [`ExportError`] if a probe, digest or write fails; the
/// destination is left untouched in that case.
pub fn generate(
    artifacts: &[ResolvedArtifact],
    resolver: &RepositoryResolver<'_>,
    destination: &Utf8Path,
    settings: &ManifestSettings<'_>,
) -> Result<ManifestReport> {
    let parent = destination
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    fs::create_dir_all(parent).map_err(|source| ExportError::CreateDirectory {
        path: parent.to_owned(),
        source,
    })?;

    let write_error = |source| ExportError::Write {
        path: destination.to_owned(),
        source,
    };
    let temp = NamedTempFile::new_in(parent).map_err(write_error)?;
    let mut writer = BufWriter::new(temp);
    let report = write_entries(&mut writer, artifacts, resolver, destination, settings)?;

    let temp = writer
        .into_inner()
        .map_err(|err| write_error(err.into_error()))?;
    set_readable(&temp).map_err(write_error)?;
    temp.persist(destination)
        .map_err(|err| write_error(err.error))?;
    Ok(report)
}

fn write_entries<W: Write>(
    writer: W,
    artifacts: &[ResolvedArtifact],
    resolver: &RepositoryResolver<'_>,
    destination: &Utf8Path,
    settings: &ManifestSettings<'_>,
) -> Result<ManifestReport> {
    let json_error = |source: serde_json::Error| {
        if source.is_io() {
            ExportError::Write {
                path: destination.to_owned(),
                source: source.into(),
            }
        } else {
            ExportError::Serialize {
                path: destination.to_owned(),
                source,
            }
        }
    };

    let mut serializer =
        serde_json::Serializer::with_formatter(writer, PrettyFormatter::with_indent(INDENT));
    let mut seq = serializer.serialize_seq(None).map_err(json_error)?;
    let mut report = ManifestReport::default();
    for artifact in artifacts {
        let Some(entry) = build_entry(artifact, resolver, settings)? else {
            continue;
        };
        if entry.url.is_none() {
            report.missing_urls += 1;
        }
        seq.serialize_element(&entry).map_err(json_error)?;
        report.entries += 1;
    }
    seq.end().map_err(json_error)?;
    Ok(report)
}

/// Temporary files are created owner-only; manifests are ordinary files.
#[cfg(unix)]
fn set_readable(temp: &NamedTempFile) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    temp.as_file()
        .set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_readable(_temp: &NamedTempFile) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
