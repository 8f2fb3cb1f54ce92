//! Policy error types.

use thiserror::Error;

/// Policy errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A malformed resource identifier was supplied to the evaluator or differ.
    ///
    /// The core recovers from this locally (deny, or no suppression) and only
    /// surfaces it through the `try_*` entry points.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A provider was asked about a domain it does not know.
    #[error("unknown domain: {0}")]
    UnknownDomain(String),

    /// The gating configuration is invalid.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Failed to parse a configuration file.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// An I/O error occurred while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the domain is not configured at all.
    pub fn is_unknown_domain(&self) -> bool {
        matches!(self, Error::UnknownDomain(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
