//! Text written to the terminal by the `depexport` binary.

use crate::config::ExportConfig;
use crate::export::ExportSummary;
use crate::repository::MavenRepository;
use camino::Utf8Path;
use std::io::Write;

/// Write one line to `stderr`, ignoring failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; nothing sensible to do on failure.
    }
}

/// Format the per-job summary lines of a finished run.
#[must_use]
pub fn summary_lines(summary: &ExportSummary) -> Vec<String> {
    summary.reports().iter().map(ToString::to_string).collect()
}

/// The resolved plan shown by `--dry-run`.
///
/// # Example
///
/// ```
/// use camino::Utf8Path;
/// use depexport::config::ExportConfig;
/// use depexport::output::DryRunPlan;
/// use depexport::repository::MavenRepository;
///
/// let repositories = vec![MavenRepository::parse("https://repo.example.com/maven").expect("url")];
/// let job = ExportConfig::new("runtime", "runtime.json", "reports/runtime.json");
/// let jobs = vec![&job];
///
/// let plan = DryRunPlan {
///     output_dir: Utf8Path::new("build/generated/dependencyExport"),
///     repositories: &repositories,
///     jobs: &jobs,
/// };
///
/// let text = plan.display_text();
/// assert!(text.contains("https://repo.example.com/maven/"));
/// assert!(text.contains("build/generated/dependencyExport/runtime.json"));
/// ```
#[derive(Debug)]
pub struct DryRunPlan<'a> {
    /// Directory manifests would be written under.
    pub output_dir: &'a Utf8Path,
    /// Repositories in probe order.
    pub repositories: &'a [MavenRepository],
    /// Jobs that would run, in order.
    pub jobs: &'a [&'a ExportConfig],
}

impl DryRunPlan<'_> {
    /// Format the plan for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - no repositories probed, no files written".to_owned(),
            String::new(),
            format!("Output directory: {}", self.output_dir),
            String::new(),
            "Repositories:".to_owned(),
        ];
        if self.repositories.is_empty() {
            lines.push("  (none; entries will have no url)".to_owned());
        }
        for repository in self.repositories {
            lines.push(format!("  - {repository}"));
        }

        lines.push(String::new());
        lines.push("Exports:".to_owned());
        for job in self.jobs {
            lines.push(format!(
                "  - {} -> {} (from {}, {})",
                job.name,
                job.destination(self.output_dir),
                job.artifacts,
                job.digest_algorithm.name(),
            ));
        }
        lines.join("\n")
    }
}
