//! `depexport` CLI entrypoint.
//!
//! Loads the export configuration, runs the selected jobs and prints one
//! summary line per job.

use clap::Parser;
use depexport::cli::Cli;
use depexport::config::ExporterConfig;
use depexport::error::Result;
use depexport::export::{ExportContext, run_exports, select_jobs};
use depexport::output::{DryRunPlan, summary_lines, write_stderr_line};
use depexport::repository::UrlProber;
use depexport::source::ReportArtifactSource;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Installs the log backend; `RUST_LOG` takes precedence over `-v`/`-q`.
fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(cli.log_level())
        .format_timestamp(None)
        .format_target(false)
        .parse_default_env();
    if builder.try_init().is_err() {
        // A logger is already installed.
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let mut config = ExporterConfig::load(&cli.config)?;
    if let Some(output_dir) = &cli.output_dir {
        config.output_dir.clone_from(output_dir);
    }
    let jobs = select_jobs(&config, &cli.jobs)?;

    if cli.dry_run {
        let plan = DryRunPlan {
            output_dir: &config.output_dir,
            repositories: &config.repositories,
            jobs: &jobs,
        };
        write_stderr_line(stderr, plan.display_text());
        return Ok(());
    }

    let context = ExportContext {
        output_dir: &config.output_dir,
        repositories: &config.repositories,
        source: &ReportArtifactSource,
        prober: &UrlProber,
    };
    let summary = run_exports(&context, &jobs)?;
    if !cli.quiet {
        for line in summary_lines(&summary) {
            write_stderr_line(stderr, line);
        }
    }
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format_args!("error: {err}"));
            1
        }
    }
}
