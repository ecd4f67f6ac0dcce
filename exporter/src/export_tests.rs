//! Unit tests for export job orchestration.

use super::*;
use crate::coordinate::ModuleComponent;
use crate::repository::{MockRepositoryProber, ProbeOutcome};
use crate::source::{MockArtifactSource, SourceError};
use rstest::{fixture, rstest};
use std::fs;

struct Harness {
    _dir: tempfile::TempDir,
    root: Utf8PathBuf,
    repositories: Vec<MavenRepository>,
    prober: MockRepositoryProber,
}

impl Harness {
    fn artifact(&self, module: &str, classifier: Option<&str>) -> ResolvedArtifact {
        let file = self.root.join(format!("{module}.jar"));
        fs::write(&file, module).expect("write artifact");
        let component = ModuleComponent::new("com.example", module, "1.0").expect("component");
        let artifact = ResolvedArtifact::module(component, "jar", file.as_std_path());
        match classifier {
            Some(classifier) => artifact.with_classifier(classifier),
            None => artifact,
        }
    }

    fn context<'a>(&'a self, source: &'a MockArtifactSource) -> ExportContext<'a> {
        ExportContext {
            output_dir: &self.root,
            repositories: &self.repositories,
            source,
            prober: &self.prober,
        }
    }
}

#[fixture]
fn harness() -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
    let mut prober = MockRepositoryProber::new();
    prober
        .expect_probe()
        .returning(|_| Ok(ProbeOutcome::Found));
    Harness {
        _dir: dir,
        root,
        repositories: vec![MavenRepository::parse("https://repo.example.com/").expect("repo")],
        prober,
    }
}

fn source_returning(artifacts: Vec<ResolvedArtifact>) -> MockArtifactSource {
    let mut source = MockArtifactSource::new();
    source
        .expect_resolved_artifacts()
        .returning(move |_| Ok(artifacts.clone()));
    source
}

fn manifest_names(path: &Utf8Path) -> Vec<String> {
    let text = fs::read_to_string(path).expect("read manifest");
    let json: serde_json::Value = serde_json::from_str(&text).expect("valid JSON");
    json.as_array()
        .expect("array")
        .iter()
        .filter_map(|entry| entry.get("name").and_then(serde_json::Value::as_str))
        .map(str::to_owned)
        .collect()
}

#[rstest]
fn excluded_classifiers_never_reach_the_manifest(harness: Harness) {
    let source = source_returning(vec![
        harness.artifact("core", None),
        harness.artifact("core", Some("sources")),
        harness.artifact("native", Some("natives-linux")),
    ]);
    let mut job = ExportConfig::new("runtime", "runtime.json", "report.json");
    job.excluded_classifiers.insert(Some("sources"));

    let outcome = run_job(&harness.context(&source), &job).expect("job");

    let destination = harness.root.join("runtime.json");
    assert_eq!(
        outcome,
        JobOutcome::Written {
            destination: destination.clone(),
            entries: 2,
            missing_urls: 0,
        }
    );
    assert_eq!(
        manifest_names(&destination),
        ["com.example:core:1.0", "com.example:native:1.0:natives-linux"]
    );
}

#[rstest]
fn unclassified_bucket_can_be_excluded(harness: Harness) {
    let source = source_returning(vec![
        harness.artifact("core", None),
        harness.artifact("native", Some("natives-linux")),
    ]);
    let mut job = ExportConfig::new("natives", "natives.json", "report.json");
    job.excluded_classifiers.insert(None);

    run_job(&harness.context(&source), &job).expect("job");

    assert_eq!(
        manifest_names(&harness.root.join("natives.json")),
        ["com.example:native:1.0:natives-linux"]
    );
}

#[rstest]
#[case::stale_file(true)]
#[case::no_file(false)]
fn skip_when_empty_removes_destination(harness: Harness, #[case] stale: bool) {
    let destination = harness.root.join("empty.json");
    if stale {
        fs::write(&destination, "[{}]").expect("seed stale manifest");
    }
    let source = source_returning(vec![harness.artifact("core", Some("sources"))]);
    let mut job = ExportConfig::new("empty", "empty.json", "report.json");
    job.skip_when_empty = true;
    job.excluded_classifiers.insert(Some("sources"));

    let outcome = run_job(&harness.context(&source), &job).expect("job");

    assert_eq!(
        outcome,
        JobOutcome::Removed {
            destination: destination.clone(),
            existed: stale,
        }
    );
    assert!(!destination.exists());
}

#[rstest]
fn empty_job_without_skip_writes_empty_array(harness: Harness) {
    let source = source_returning(Vec::new());
    let job = ExportConfig::new("empty", "nested/empty.json", "report.json");

    let outcome = run_job(&harness.context(&source), &job).expect("job");

    let destination = harness.root.join("nested/empty.json");
    assert_eq!(outcome.destination(), destination.as_path());
    assert_eq!(fs::read_to_string(&destination).expect("read"), "[]");
}

#[rstest]
fn source_failure_aborts_job(harness: Harness) {
    let mut source = MockArtifactSource::new();
    source.expect_resolved_artifacts().returning(|job| {
        Err(SourceError::Read {
            path: job.artifacts.clone(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    });
    let job = ExportConfig::new("runtime", "runtime.json", "missing.json");

    let err = run_job(&harness.context(&source), &job).expect_err("missing report");

    assert!(matches!(err, ExportError::Source(SourceError::Read { .. })));
    assert!(!harness.root.join("runtime.json").exists());
}

#[rstest]
fn run_exports_stops_at_first_failure(harness: Harness) {
    let core = harness.artifact("core", None);
    let mut source = MockArtifactSource::new();
    source
        .expect_resolved_artifacts()
        .returning(move |job| match job.name.as_str() {
            "alpha" => Ok(vec![core.clone()]),
            _ => Err(SourceError::Read {
                path: job.artifacts.clone(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            }),
        });
    let alpha = ExportConfig::new("alpha", "alpha.json", "alpha-report.json");
    let beta = ExportConfig::new("beta", "beta.json", "beta-report.json");

    let err = run_exports(&harness.context(&source), &[&alpha, &beta]).expect_err("beta fails");

    assert!(matches!(err, ExportError::Source(_)));
    assert!(harness.root.join("alpha.json").exists());
}

#[rstest]
fn run_exports_reports_each_job_in_order(harness: Harness) {
    let core = harness.artifact("core", None);
    let source = source_returning(vec![core]);
    let alpha = ExportConfig::new("alpha", "alpha.json", "report.json");
    let mut beta = ExportConfig::new("beta", "beta.json", "report.json");
    beta.excluded_classifiers.insert(None);
    beta.skip_when_empty = true;

    let summary = run_exports(&harness.context(&source), &[&alpha, &beta]).expect("run");

    let jobs: Vec<&str> = summary.reports().iter().map(|r| r.job.as_str()).collect();
    assert_eq!(jobs, ["alpha", "beta"]);
    assert!(matches!(
        summary.get("alpha"),
        Some(JobOutcome::Written { entries: 1, .. })
    ));
    assert!(matches!(
        summary.get("beta"),
        Some(JobOutcome::Removed { existed: false, .. })
    ));
    assert_eq!(summary.missing_urls(), 0);
}

#[test]
fn select_jobs_defaults_to_all_in_name_order() {
    let config = ExporterConfig::from_toml_str(
        r#"
            [exports.zeta]
            path = "z.json"
            artifacts = "z.json"

            [exports.alpha]
            path = "a.json"
            artifacts = "a.json"
        "#,
        Utf8Path::new("/project"),
    )
    .expect("config");

    let all: Vec<&str> = select_jobs(&config, &[])
        .expect("all jobs")
        .iter()
        .map(|job| job.name.as_str())
        .collect();
    assert_eq!(all, ["alpha", "zeta"]);

    let picked = select_jobs(&config, &["zeta".to_owned()]).expect("zeta");
    assert_eq!(picked.len(), 1);

    let err = select_jobs(&config, &["gamma".to_owned()]).expect_err("unknown job");
    assert!(matches!(err, ExportError::UnknownJob { ref name } if name == "gamma"));
}

#[rstest]
#[case::written(
    JobOutcome::Written { destination: "out/a.json".into(), entries: 1, missing_urls: 0 },
    "wrote 1 entry to out/a.json"
)]
#[case::written_missing(
    JobOutcome::Written { destination: "out/a.json".into(), entries: 3, missing_urls: 2 },
    "wrote 3 entries to out/a.json (2 without URL)"
)]
#[case::removed(
    JobOutcome::Removed { destination: "out/a.json".into(), existed: true },
    "nothing to export; removed out/a.json"
)]
#[case::absent(
    JobOutcome::Removed { destination: "out/a.json".into(), existed: false },
    "nothing to export; out/a.json not written"
)]
fn job_outcome_display(#[case] outcome: JobOutcome, #[case] expected: &str) {
    assert_eq!(outcome.to_string(), expected);
}
