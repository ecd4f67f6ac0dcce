//! CLI argument definitions for `depexport`.
//!
//! Kept apart from the entrypoint so the argument surface can be tested
//! without running an export.

use crate::config::DEFAULT_CONFIG_FILE;
use camino::Utf8PathBuf;
use clap::Parser;
use log::LevelFilter;

/// Export dependency manifests with download URLs and digests.
#[derive(Parser, Debug, Clone)]
#[command(name = "depexport")]
#[command(version, about)]
#[command(long_about = concat!(
    "Export dependency manifests with download URLs and digests.\n\n",
    "For each export job in the configuration, depexport reads the resolved ",
    "artifacts reported by the build, probes the configured Maven repositories ",
    "for a download URL, and writes a JSON manifest listing each artifact's ",
    "name, URL, size and digest.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Export every job in ./depexport.toml:\n",
    "    $ depexport\n\n",
    "  Export one job into a different directory:\n",
    "    $ depexport --job runtime --output-dir dist/manifests\n\n",
    "  Show the plan without probing or writing:\n",
    "    $ depexport --dry-run\n\n",
    "Set RUST_LOG to override the log level chosen by -v/-q.",
))]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: Utf8PathBuf,

    /// Override the configured output directory.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<Utf8PathBuf>,

    /// Run only the named export (can be repeated).
    #[arg(short, long = "job", value_name = "NAME")]
    pub jobs: Vec<String>,

    /// Show the resolved plan and exit without probing or writing.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only report errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Return the log level selected by `-v`/`-q`.
    ///
    /// Missing artifact URLs are warnings, so they show by default.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["depexport"]);
        assert_eq!(cli.config, Utf8PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(cli.output_dir.is_none());
        assert!(cli.jobs.is_empty());
        assert!(!cli.dry_run);
        assert_eq!(cli.verbosity, 0);
        assert!(!cli.quiet);
    }

    #[test]
    fn cli_parses_repeated_jobs_and_overrides() {
        let cli = Cli::parse_from([
            "depexport",
            "--config",
            "build/depexport.toml",
            "-o",
            "dist",
            "--job",
            "runtime",
            "-j",
            "natives",
            "--dry-run",
        ]);
        assert_eq!(cli.config, Utf8PathBuf::from("build/depexport.toml"));
        assert_eq!(cli.output_dir, Some(Utf8PathBuf::from("dist")));
        assert_eq!(cli.jobs, ["runtime", "natives"]);
        assert!(cli.dry_run);
    }

    #[rstest]
    #[case::default(&["depexport"], LevelFilter::Warn)]
    #[case::verbose(&["depexport", "-v"], LevelFilter::Info)]
    #[case::debug(&["depexport", "-vv"], LevelFilter::Debug)]
    #[case::trace(&["depexport", "-vvv"], LevelFilter::Trace)]
    #[case::beyond_trace(&["depexport", "-vvvv"], LevelFilter::Trace)]
    #[case::quiet(&["depexport", "--quiet"], LevelFilter::Error)]
    fn log_level_follows_flags(#[case] args: &[&str], #[case] expected: LevelFilter) {
        let cli = Cli::parse_from(args);
        assert_eq!(cli.log_level(), expected);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["depexport", "-v", "-q"]).is_err());
    }
}
