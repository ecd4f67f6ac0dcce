//! Test support utilities shared by the exporter integration tests.
//!
//! Artifacts are described with Gradle-style coordinate strings
//! (`group:module:version[:classifier]`) and backed by small files written
//! into a temporary directory.

use camino::{Utf8Path, Utf8PathBuf};
use depexport::config::ExportConfig;
use depexport::coordinate::{ModuleComponent, ResolvedArtifact};
use depexport::source::{ArtifactSource, SourceError};
use std::fs;

/// Artifact source returning a fixed list for every job.
pub struct FixedSource(pub Vec<ResolvedArtifact>);

impl ArtifactSource for FixedSource {
    fn resolved_artifacts(&self, _job: &ExportConfig) -> Result<Vec<ResolvedArtifact>, SourceError> {
        Ok(self.0.clone())
    }
}

/// Return a UTF-8 view of a temporary directory.
pub fn utf8_root(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir")
}

/// Write a local file for `coordinate` under `root` and return the artifact.
///
/// The file content is the coordinate text, so every artifact has a distinct
/// digest.
pub fn module_artifact(root: &Utf8Path, coordinate: &str) -> ResolvedArtifact {
    let mut parts = coordinate.split(':');
    let group = parts.next().expect("group");
    let module = parts.next().expect("module");
    let version = parts.next().expect("version");
    let classifier = parts.next();

    let file_name = match classifier {
        Some(classifier) => format!("{module}-{version}-{classifier}.jar"),
        None => format!("{module}-{version}.jar"),
    };
    let file = write_file(root, &file_name, coordinate.as_bytes());
    let component = ModuleComponent::new(group, module, version).expect("component");
    let artifact = ResolvedArtifact::module(component, "jar", file.as_std_path());
    match classifier {
        Some(classifier) => artifact.with_classifier(classifier),
        None => artifact,
    }
}

/// Write `contents` to `root/cache/name`.
pub fn write_file(root: &Utf8Path, name: &str, contents: &[u8]) -> Utf8PathBuf {
    let dir = root.join("cache");
    fs::create_dir_all(&dir).expect("create cache dir");
    let path = dir.join(name);
    fs::write(&path, contents).expect("write artifact file");
    path
}

/// Read and parse a manifest.
pub fn read_manifest(path: &Utf8Path) -> serde_json::Value {
    let text = fs::read_to_string(path).expect("read manifest");
    serde_json::from_str(&text).expect("manifest is valid JSON")
}
