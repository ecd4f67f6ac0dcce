//! Export job orchestration.
//!
//! A job reads its resolved artifacts, drops the excluded classifier
//! buckets and either writes a manifest or, when nothing is left and the job
//! asks for it, removes the stale one. Jobs run one at a time in name order
//! and the first failure stops the run; manifests written by earlier jobs
//! stay on disk.

use crate::config::{ExcludedClassifiers, ExportConfig, ExporterConfig};
use crate::coordinate::ResolvedArtifact;
use crate::error::{ExportError, Result};
use crate::manifest::{ManifestSettings, generate};
use crate::repository::{MavenRepository, RepositoryProber, RepositoryResolver};
use crate::source::ArtifactSource;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fmt;
use std::io::ErrorKind;

/// Collaborators and locations shared by every job of a run.
#[derive(Clone, Copy)]
pub struct ExportContext<'a> {
    /// Directory manifests are written under.
    pub output_dir: &'a Utf8Path,
    /// Maven repositories, in probe order.
    pub repositories: &'a [MavenRepository],
    /// Supplies each job's resolved artifacts.
    pub source: &'a dyn ArtifactSource,
    /// Checks whether a repository serves an artifact.
    pub prober: &'a dyn RepositoryProber,
}

/// What a job did to its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// A manifest was written.
    Written {
        /// The manifest path.
        destination: Utf8PathBuf,
        /// Number of entries in the manifest.
        entries: usize,
        /// Number of entries without a download URL.
        missing_urls: usize,
    },
    /// Nothing remained to export and the destination was cleared.
    Removed {
        /// The manifest path.
        destination: Utf8PathBuf,
        /// Whether a stale manifest existed.
        existed: bool,
    },
}

impl JobOutcome {
    /// Return the manifest path the job targeted.
    #[must_use]
    pub fn destination(&self) -> &Utf8Path {
        match self {
            Self::Written { destination, .. } | Self::Removed { destination, .. } => destination,
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written {
                destination,
                entries,
                missing_urls,
            } => {
                let noun = if *entries == 1 { "entry" } else { "entries" };
                write!(f, "wrote {entries} {noun} to {destination}")?;
                if *missing_urls > 0 {
                    write!(f, " ({missing_urls} without URL)")?;
                }
                Ok(())
            }
            Self::Removed {
                destination,
                existed: true,
            } => write!(f, "nothing to export; removed {destination}"),
            Self::Removed {
                destination,
                existed: false,
            } => write!(f, "nothing to export; {destination} not written"),
        }
    }
}

/// The outcome of one named job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    /// The job name.
    pub job: String,
    /// What the job did.
    pub outcome: JobOutcome,
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.job, self.outcome)
    }
}

/// Outcomes of a run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    reports: Vec<JobReport>,
}

impl ExportSummary {
    /// Return the job reports in execution order.
    #[must_use]
    pub fn reports(&self) -> &[JobReport] {
        &self.reports
    }

    /// Return the report for `job`, if it ran.
    #[must_use]
    pub fn get(&self, job: &str) -> Option<&JobOutcome> {
        self.reports
            .iter()
            .find(|report| report.job == job)
            .map(|report| &report.outcome)
    }

    /// Return the number of entries written without a URL across all jobs.
    #[must_use]
    pub fn missing_urls(&self) -> usize {
        self.reports
            .iter()
            .map(|report| match report.outcome {
                JobOutcome::Written { missing_urls, .. } => missing_urls,
                JobOutcome::Removed { .. } => 0,
            })
            .sum()
    }
}

/// Pick the jobs to run.
///
/// An empty `names` selects every job. Selected jobs are returned in name
/// order regardless of the order requested.
///
/// # Errors
///
/// Returns [`ExportError::UnknownJob`] for a name that is not configured.
pub fn select_jobs<'a>(
    config: &'a ExporterConfig,
    names: &[String],
) -> Result<Vec<&'a ExportConfig>> {
    if let Some(unknown) = names.iter().find(|name| !config.exports.contains_key(*name)) {
        return Err(ExportError::UnknownJob {
            name: unknown.clone(),
        });
    }
    Ok(config
        .exports
        .values()
        .filter(|job| names.is_empty() || names.contains(&job.name))
        .collect())
}

/// Run `jobs` in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the first job's [`ExportError`].
pub fn run_exports(context: &ExportContext<'_>, jobs: &[&ExportConfig]) -> Result<ExportSummary> {
    let mut summary = ExportSummary::default();
    for job in jobs {
        let outcome = run_job(context, job)?;
        info!("{}: {outcome}", job.name);
        summary.reports.push(JobReport {
            job: job.name.clone(),
            outcome,
        });
    }
    Ok(summary)
}

/// Run a single export job.
///
/// # Errors
///
/// Returns an [`ExportError`] if the artifacts cannot be obtained, a probe
/// or digest fails, or the destination cannot be written or removed.
pub fn run_job(context: &ExportContext<'_>, job: &ExportConfig) -> Result<JobOutcome> {
    let destination = job.destination(context.output_dir);
    let resolved = context.source.resolved_artifacts(job)?;
    let artifacts = retain_included(resolved, &job.excluded_classifiers);

    if artifacts.is_empty() && job.skip_when_empty {
        let existed = remove_stale(&destination)?;
        return Ok(JobOutcome::Removed {
            destination,
            existed,
        });
    }

    let resolver = RepositoryResolver::new(context.repositories, context.prober);
    let report = generate(
        &artifacts,
        &resolver,
        &destination,
        &ManifestSettings::for_job(job),
    )?;
    Ok(JobOutcome::Written {
        destination,
        entries: report.entries,
        missing_urls: report.missing_urls,
    })
}

/// Drop artifacts whose classifier bucket is excluded, keeping order.
#[must_use]
pub fn retain_included(
    artifacts: Vec<ResolvedArtifact>,
    excluded: &ExcludedClassifiers,
) -> Vec<ResolvedArtifact> {
    if excluded.is_empty() {
        return artifacts;
    }
    artifacts
        .into_iter()
        .filter(|artifact| {
            let keep = !excluded.contains(artifact.classifier());
            if !keep {
                debug!(
                    "Excluding {} (classifier {:?})",
                    artifact.file().display(),
                    artifact.classifier()
                );
            }
            keep
        })
        .collect()
}

/// Delete `destination`, reporting whether it existed.
fn remove_stale(destination: &Utf8Path) -> Result<bool> {
    match std::fs::remove_file(destination) {
        Ok(()) => {
            debug!("Removed stale manifest {destination}");
            Ok(true)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(ExportError::RemoveStale {
            path: destination.to_owned(),
            source,
        }),
    }
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
