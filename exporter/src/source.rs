//! Sources of resolved artifacts.
//!
//! Dependency resolution belongs to the host build. The exporter only
//! consumes its result through [`ArtifactSource`]; the shipped
//! [`ReportArtifactSource`] reads the JSON resolution report the build writes
//! for each export job.

use crate::config::ExportConfig;
use crate::coordinate::ResolvedArtifact;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;

/// Errors raised while obtaining resolved artifacts.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The resolution report could not be read.
    #[error("failed to read resolution report {path}: {source}")]
    Read {
        /// The report path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The resolution report is not a valid artifact list.
    #[error("invalid resolution report {path}: {source}")]
    Parse {
        /// The report path.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Supplies the resolved artifacts of an export job, in resolution order.
#[cfg_attr(test, mockall::automock)]
pub trait ArtifactSource {
    /// Return the artifacts resolved for `job`.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the artifacts cannot be obtained.
    fn resolved_artifacts(&self, job: &ExportConfig) -> Result<Vec<ResolvedArtifact>, SourceError>;
}

/// Reads the resolution report named by a job's `artifacts` setting.
///
/// Relative artifact files are resolved against the report's directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportArtifactSource;

impl ReportArtifactSource {
    /// Read and parse the report at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the file cannot be read or parsed.
    pub fn read_report(path: &Utf8Path) -> Result<Vec<ResolvedArtifact>, SourceError> {
        let contents = std::fs::read(path).map_err(|source| SourceError::Read {
            path: path.to_owned(),
            source,
        })?;
        let mut artifacts: Vec<ResolvedArtifact> =
            serde_json::from_slice(&contents).map_err(|source| SourceError::Parse {
                path: path.to_owned(),
                source,
            })?;

        let base = path.parent().unwrap_or_else(|| Utf8Path::new(""));
        for artifact in &mut artifacts {
            artifact.rebase_file(base.as_std_path());
        }
        debug!("Read {} resolved artifacts from {path}", artifacts.len());
        Ok(artifacts)
    }
}

impl ArtifactSource for ReportArtifactSource {
    fn resolved_artifacts(&self, job: &ExportConfig) -> Result<Vec<ResolvedArtifact>, SourceError> {
        Self::read_report(&job.artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Component;
    use std::path::Path;

    fn write_report(dir: &Utf8Path, contents: &str) -> Utf8PathBuf {
        let path = dir.join("runtime.json");
        std::fs::write(&path, contents).expect("write report");
        path
    }

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        (dir, root)
    }

    #[test]
    fn reads_artifacts_in_order_and_rebases_relative_files() {
        let (_dir, root) = temp_root();
        let report = write_report(
            &root,
            r#"[
                { "component": { "kind": "module", "group": "com.example", "module": "lib",
                                 "version": "1.0-SNAPSHOT",
                                 "timestampedVersion": "1.0-20230101.120000-1" },
                  "classifier": null, "extension": "jar", "file": "cache/lib.jar" },
                { "component": { "kind": "local", "name": "libs/vendored.jar" },
                  "extension": "jar", "file": "libs/vendored.jar" },
                { "component": { "kind": "module", "group": "org.lwjgl", "module": "lwjgl",
                                 "version": "3.3.1" },
                  "classifier": "natives-linux", "extension": "jar",
                  "file": "/abs/lwjgl-natives-linux.jar" }
            ]"#,
        );
        let job = ExportConfig::new("runtime", "runtime.json", report);

        let artifacts = ReportArtifactSource
            .resolved_artifacts(&job)
            .expect("valid report");

        assert_eq!(artifacts.len(), 3);
        let first = artifacts.first().expect("first");
        assert_eq!(first.file(), root.join("cache/lib.jar").as_std_path());
        let name = first.coordinate().map(|c| c.name());
        assert_eq!(name.as_deref(), Some("com.example:lib:1.0-SNAPSHOT"));

        let second = artifacts.get(1).expect("second");
        assert!(matches!(second.component(), Component::Local { .. }));

        let third = artifacts.get(2).expect("third");
        assert_eq!(third.classifier(), Some("natives-linux"));
        assert_eq!(third.file(), Path::new("/abs/lwjgl-natives-linux.jar"));
    }

    #[test]
    fn empty_report_yields_no_artifacts() {
        let (_dir, root) = temp_root();
        let report = write_report(&root, "[]");
        let artifacts = ReportArtifactSource::read_report(&report).expect("empty report");
        assert!(artifacts.is_empty());
    }

    #[test]
    fn missing_report_is_a_read_error() {
        let (_dir, root) = temp_root();
        let missing = root.join("absent.json");
        let err = ReportArtifactSource::read_report(&missing).expect_err("missing report");
        assert!(matches!(err, SourceError::Read { ref path, .. } if *path == missing));
    }

    #[test]
    fn malformed_report_is_a_parse_error() {
        let (_dir, root) = temp_root();
        let report = write_report(
            &root,
            r#"[{ "component": { "kind": "module", "group": "", "module": "m", "version": "1" },
                  "extension": "jar", "file": "m.jar" }]"#,
        );
        let err = ReportArtifactSource::read_report(&report).expect_err("blank group");
        assert!(matches!(err, SourceError::Parse { .. }));
    }
}
