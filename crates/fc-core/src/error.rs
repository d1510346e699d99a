//! Error types for the fc-core crate.
//!
//! This module provides the [`ConfigError`] type for configuration-related errors
//! that can occur while the agent starts up.

use camino::Utf8PathBuf;

/// Errors that can occur during configuration loading and validation.
///
/// Every variant is fatal at startup: the agent refuses to enter its run
/// loop with a configuration it cannot trust.
///
/// # Examples
///
/// ```
/// use fc_core::ConfigError;
/// use camino::Utf8PathBuf;
///
/// let error = ConfigError::MissingDirectory {
///     label: "watch",
///     path: Utf8PathBuf::from("/some/path"),
/// };
/// assert!(error.to_string().contains("/some/path"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// The configuration file path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON or is missing required fields.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required directory does not exist.
    #[error("{label} directory does not exist: {path}")]
    MissingDirectory {
        /// Which configured directory this is (`watch` or `target`).
        label: &'static str,
        /// The missing path.
        path: Utf8PathBuf,
    },

    /// A configured directory path exists but is not a directory.
    #[error("{label} path is not a directory: {path}")]
    NotADirectory {
        /// Which configured directory this is (`watch` or `target`).
        label: &'static str,
        /// The offending path.
        path: Utf8PathBuf,
    },

    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },
}

impl ConfigError {
    /// Creates a new [`ConfigError::InvalidOption`] error.
    #[inline]
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Returns the filesystem path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Read { path, .. }
            | Self::MissingDirectory { path, .. }
            | Self::NotADirectory { path, .. } => Some(path),
            Self::Parse(_) | Self::InvalidOption { .. } => None,
        }
    }
}
