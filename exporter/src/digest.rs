//! Content digests for exported artifacts.
//!
//! Files are hashed in fixed-size chunks so that arbitrarily large artifacts
//! never have to fit in memory. Algorithm names follow the standard spelling
//! used by Maven tooling (`SHA-256`, `SHA-1`, `MD5`, ...).

use log::trace;
use sha2::digest::DynDigest;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Size of the read buffer used while hashing a file.
const CHUNK_SIZE: usize = 8192;

/// Errors arising while computing a file digest.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// The algorithm name is not one this build can compute.
    #[error("unsupported digest algorithm \"{name}\"")]
    UnsupportedAlgorithm {
        /// The rejected algorithm name.
        name: String,
    },

    /// The file could not be opened or read.
    #[error("failed to read {path} for hashing: {source}")]
    Io {
        /// The file being hashed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A supported digest algorithm.
///
/// # Examples
///
/// ```
/// use depexport::digest::DigestAlgorithm;
///
/// let algorithm: DigestAlgorithm = "sha256".parse().expect("known algorithm");
/// assert_eq!(algorithm, DigestAlgorithm::Sha256);
/// assert_eq!(algorithm.to_string(), "SHA-256");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    /// MD5 (128 bits).
    Md5,
    /// SHA-1 (160 bits).
    Sha1,
    /// SHA-224 (224 bits).
    Sha224,
    /// SHA-256 (256 bits), the default for export jobs.
    #[default]
    Sha256,
    /// SHA-384 (384 bits).
    Sha384,
    /// SHA-512 (512 bits).
    Sha512,
}

impl DigestAlgorithm {
    /// Return the canonical hyphenated name, e.g. `SHA-256`.
    #[must_use]
    pub const fn canonical_name(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA-1",
            Self::Sha224 => "SHA-224",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /// Return the digest length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    fn hasher(self) -> Box<dyn DynDigest> {
        match self {
            Self::Md5 => Box::new(md5::Md5::default()),
            Self::Sha1 => Box::new(sha1::Sha1::default()),
            Self::Sha224 => Box::new(sha2::Sha224::default()),
            Self::Sha256 => Box::new(sha2::Sha256::default()),
            Self::Sha384 => Box::new(sha2::Sha384::default()),
            Self::Sha512 => Box::new(sha2::Sha512::default()),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = DigestError;

    /// Parse an algorithm name, ignoring case and an optional hyphen.
    ///
    /// `SHA` is accepted as an alias of SHA-1.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalised: String = name
            .trim()
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match normalised.as_str() {
            "MD5" => Ok(Self::Md5),
            "SHA" | "SHA1" => Ok(Self::Sha1),
            "SHA224" => Ok(Self::Sha224),
            "SHA256" => Ok(Self::Sha256),
            "SHA384" => Ok(Self::Sha384),
            "SHA512" => Ok(Self::Sha512),
            _ => Err(DigestError::UnsupportedAlgorithm {
                name: name.to_owned(),
            }),
        }
    }
}

/// A digest algorithm together with the name it was configured under.
///
/// The manifest's `digestAlgorithm` field echoes the configured spelling,
/// so `sha256` stays `sha256` rather than becoming `SHA-256`.
///
/// # Examples
///
/// ```
/// use depexport::digest::{DigestAlgorithm, NamedAlgorithm};
///
/// let named = NamedAlgorithm::parse("sha1").expect("known algorithm");
/// assert_eq!(named.algorithm(), DigestAlgorithm::Sha1);
/// assert_eq!(named.name(), "sha1");
/// assert_eq!(NamedAlgorithm::default().name(), "SHA-256");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedAlgorithm {
    algorithm: DigestAlgorithm,
    name: String,
}

impl NamedAlgorithm {
    /// Parse `name`, keeping its spelling.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::UnsupportedAlgorithm`] for unknown names.
    pub fn parse(name: &str) -> Result<Self, DigestError> {
        let algorithm = name.parse()?;
        Ok(Self {
            algorithm,
            name: name.trim().to_owned(),
        })
    }

    /// Return the parsed algorithm.
    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Return the configured name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for NamedAlgorithm {
    fn default() -> Self {
        let algorithm = DigestAlgorithm::default();
        Self {
            algorithm,
            name: algorithm.canonical_name().to_owned(),
        }
    }
}

impl From<DigestAlgorithm> for NamedAlgorithm {
    fn from(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            name: algorithm.canonical_name().to_owned(),
        }
    }
}

/// Compute the digest of the file at `path`.
///
/// # Errors
///
/// Returns [`DigestError::Io`] if the file cannot be opened or a read fails
/// part-way through.
pub fn digest_file(path: &Path, algorithm: DigestAlgorithm) -> Result<Vec<u8>, DigestError> {
    let io_error = |source| DigestError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_error)?;
    let mut hasher = algorithm.hasher();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let bytes_read = file.read(&mut buffer).map_err(io_error)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    trace!("computed {algorithm} digest of {}", path.display());
    Ok(hasher.finalize().into_vec())
}

/// Render bytes as lowercase hex, two characters per byte, no separators.
///
/// # Examples
///
/// ```
/// use depexport::digest::to_hex;
///
/// assert_eq!(to_hex(&[0x00, 0x0f, 0xa5, 0xff]), "000fa5ff");
/// ```
#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Compute the digest of `path` and render it as lowercase hex.
///
/// # Errors
///
/// Propagates [`digest_file`] failures.
pub fn hex_digest_file(path: &Path, algorithm: DigestAlgorithm) -> Result<String, DigestError> {
    digest_file(path, algorithm).map(|bytes| to_hex(&bytes))
}
