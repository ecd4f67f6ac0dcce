//! Repository probing for artifact download URLs.
//!
//! Provides a trait-based abstraction over the existence check issued for
//! each candidate URL, so that the resolver's ordering and stop-at-first-hit
//! behaviour can be tested without network access.

use log::debug;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

/// The `User-Agent` header sent with every probe.
pub const USER_AGENT: &str = "DependencyExporter";

/// Network timeout for a single probe request.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// URL schemes a repository base may use.
const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "file"];

/// Result of probing one candidate URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The repository serves the resource.
    Found,
    /// The repository answered that the resource does not exist.
    NotFound,
}

/// Errors arising from a probe other than "not found".
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The request failed or the server answered with an error status.
    #[error("probe failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// A candidate URL could not be mapped to a request.
    #[error("cannot probe {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why the URL cannot be probed.
        reason: String,
    },

    /// A local repository could not be inspected.
    #[error("I/O error probing {path}: {source}")]
    Io {
        /// The local file that was checked.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A repository base URL is malformed or uses an unsupported scheme.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid repository URL \"{url}\": {reason}")]
pub struct InvalidRepositoryUrl {
    /// The rejected URL.
    pub url: String,
    /// Why the URL was rejected.
    pub reason: String,
}

/// Trait for checking whether a URL serves a resource.
///
/// # Examples
///
/// ```
/// use depexport::repository::{ProbeOutcome, RepositoryProber, UrlProber};
///
/// let prober = UrlProber;
/// let missing = std::env::temp_dir().join("depexport-doc-missing.jar");
/// let url = url::Url::from_file_path(&missing).expect("absolute path");
/// assert_eq!(prober.probe(url.as_str()).expect("probe"), ProbeOutcome::NotFound);
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait RepositoryProber {
    /// Probe `url` for existence.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than "not found".
    fn probe(&self, url: &str) -> Result<ProbeOutcome, ProbeError>;
}

/// A Maven-layout repository base URL, normalized to end with `/`.
///
/// # Examples
///
/// ```
/// use depexport::repository::MavenRepository;
///
/// let repo = MavenRepository::parse("https://repo.maven.apache.org/maven2")
///     .expect("valid URL");
/// assert_eq!(repo.as_str(), "https://repo.maven.apache.org/maven2/");
/// assert!(MavenRepository::parse("ftp://example.com/repo").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MavenRepository(String);

impl MavenRepository {
    /// Validate and normalize a repository base URL.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRepositoryUrl`] if the URL does not parse or its
    /// scheme is not `http`, `https` or `file`.
    pub fn parse(raw: &str) -> Result<Self, InvalidRepositoryUrl> {
        let invalid = |reason: String| InvalidRepositoryUrl {
            url: raw.to_owned(),
            reason,
        };
        let parsed = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
        if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
            return Err(invalid(format!(
                "unsupported scheme \"{}\"; expected one of: {}",
                parsed.scheme(),
                SUPPORTED_SCHEMES.join(", ")
            )));
        }
        let mut base = String::from(parsed);
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self(base))
    }

    /// Return the normalized base URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join a repository-relative artifact path onto this base.
    #[must_use]
    pub fn artifact_url(&self, relative_path: &str) -> String {
        format!("{}{relative_path}", self.0)
    }
}

impl fmt::Display for MavenRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Finds the first repository that serves an artifact path.
pub struct RepositoryResolver<'a> {
    repositories: &'a [MavenRepository],
    prober: &'a dyn RepositoryProber,
}

impl<'a> RepositoryResolver<'a> {
    /// Create a resolver over `repositories`, probed in order.
    #[must_use]
    pub fn new(repositories: &'a [MavenRepository], prober: &'a dyn RepositoryProber) -> Self {
        Self {
            repositories,
            prober,
        }
    }

    /// Return the download URL of `relative_path` from the first repository
    /// that serves it, or `None` when every repository reports "not found".
    ///
    /// Probing stops at the first hit.
    ///
    /// # Errors
    ///
    /// Propagates the first [`ProbeError`]; later repositories are not tried.
    pub fn resolve(&self, relative_path: &str) -> Result<Option<String>, ProbeError> {
        for repository in self.repositories {
            let url = repository.artifact_url(relative_path);
            match self.prober.probe(&url)? {
                ProbeOutcome::Found => {
                    debug!("found {url}");
                    return Ok(Some(url));
                }
                ProbeOutcome::NotFound => debug!("not found: {url}"),
            }
        }
        Ok(None)
    }
}

/// Production prober: HTTP(S) via `ureq`, `file:` via the filesystem.
///
/// HTTP probes issue `HEAD` and retry once with `GET` when the server does
/// not implement `HEAD`. Response bodies are never read.
pub struct UrlProber;

impl RepositoryProber for UrlProber {
    fn probe(&self, url: &str) -> Result<ProbeOutcome, ProbeError> {
        let parsed = Url::parse(url).map_err(|e| ProbeError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.scheme() == "file" {
            probe_file(url, &parsed)
        } else {
            probe_http(url)
        }
    }
}

/// Check a `file:` URL by looking for a regular file at its path.
fn probe_file(url: &str, parsed: &Url) -> Result<ProbeOutcome, ProbeError> {
    let path = parsed.to_file_path().map_err(|()| ProbeError::InvalidUrl {
        url: url.to_owned(),
        reason: "not a local file path".to_owned(),
    })?;
    match std::fs::metadata(&path) {
        Ok(metadata) if metadata.is_file() => Ok(ProbeOutcome::Found),
        Ok(_) => Ok(ProbeOutcome::NotFound),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ProbeOutcome::NotFound),
        Err(source) => Err(ProbeError::Io { path, source }),
    }
}

fn probe_http(url: &str) -> Result<ProbeOutcome, ProbeError> {
    debug!("probing {url}");
    let head = http_agent()
        .head(url)
        .header("User-Agent", USER_AGENT)
        .call();
    match head {
        Ok(_) => Ok(ProbeOutcome::Found),
        Err(ureq::Error::StatusCode(405 | 501)) => {
            debug!("HEAD unsupported, retrying with GET: {url}");
            let get = http_agent()
                .get(url)
                .header("User-Agent", USER_AGENT)
                .call();
            match get {
                Ok(_) => Ok(ProbeOutcome::Found),
                Err(err) => classify_error(url, &err),
            }
        }
        Err(err) => classify_error(url, &err),
    }
}

/// Shared `ureq` agent with request timeout configuration.
///
/// Idle connections are not pooled: every probe attempt opens its own
/// connection and closes it once the response status is known.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(PROBE_TIMEOUT))
            .max_idle_connections(0)
            .max_idle_connections_per_host(0)
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a `ureq` error to a probe outcome: 404 and 410 mean "not found",
/// anything else is a hard failure.
fn classify_error(url: &str, err: &ureq::Error) -> Result<ProbeOutcome, ProbeError> {
    match err {
        ureq::Error::StatusCode(404 | 410) => Ok(ProbeOutcome::NotFound),
        ureq::Error::StatusCode(status) => Err(ProbeError::Http {
            url: url.to_owned(),
            reason: format!("HTTP status {status}"),
        }),
        other => Err(ProbeError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        }),
    }
}
