//! Configuration structures for the file-courier agent.
//!
//! This module provides configuration types for all components of the agent:
//!
//! - [`AgentConfig`] - Root configuration, loaded from a JSON file
//! - [`TransferConfig`] - Stabilization and copy retry timing
//! - [`WatchConfig`] - Directory watcher channel sizing
//!
//! Only `watch_directory`, `target_directory` and `file_extensions` are
//! required. The tuning sections default to the agent's standard timing:
//! poll every 500ms, give up stabilizing after 10s, make at most 5 copy
//! attempts 2s apart.

use std::fmt;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Timing and capacity settings for the stabilize-then-copy pipeline.
///
/// # Examples
///
/// ```
/// use fc_core::TransferConfig;
/// use std::time::Duration;
///
/// let config = TransferConfig::default();
/// assert_eq!(config.poll_interval(), Duration::from_millis(500));
/// assert_eq!(config.max_attempts, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Interval between two size reads while waiting for a file to stabilize.
    pub poll_interval_ms: u64,

    /// How long to wait for two consecutive equal size reads before giving up.
    pub stabilization_timeout_ms: u64,

    /// Total number of copy attempts, including the first.
    pub max_attempts: u32,

    /// Fixed delay between two failed copy attempts.
    pub retry_delay_ms: u64,

    /// Upper bound on transfer tasks alive at once.
    ///
    /// Events arriving while this many transfers are pending are dropped.
    pub max_pending_transfers: usize,
}

impl TransferConfig {
    /// Returns the stabilization poll interval.
    #[inline]
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the stabilization timeout.
    #[inline]
    #[must_use]
    pub const fn stabilization_timeout(&self) -> Duration {
        Duration::from_millis(self.stabilization_timeout_ms)
    }

    /// Returns the delay between copy attempts.
    #[inline]
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::invalid_option(
                "transfer.poll_interval_ms",
                "must be greater than zero",
            ));
        }
        if self.stabilization_timeout_ms == 0 {
            return Err(ConfigError::invalid_option(
                "transfer.stabilization_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid_option(
                "transfer.max_attempts",
                "must be at least 1",
            ));
        }
        if self.max_pending_transfers == 0 {
            return Err(ConfigError::invalid_option(
                "transfer.max_pending_transfers",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            stabilization_timeout_ms: 10_000,
            max_attempts: 5,
            retry_delay_ms: 2_000,
            max_pending_transfers: 1_024,
        }
    }
}

/// Configuration for the directory watcher.
///
/// # Examples
///
/// ```
/// use fc_core::WatchConfig;
///
/// let config = WatchConfig::default();
/// assert_eq!(config.channel_capacity, 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Capacity of the bounded change-event channel.
    pub channel_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

/// Credentials for mounting a network share at the target directory.
///
/// The password is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    /// Account name passed to the mount command.
    pub user: String,
    /// Account password passed to the mount command.
    pub password: String,
}

impl fmt::Debug for RemoteCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Root configuration for the file-courier agent.
///
/// Loaded once at startup and shared read-only for the lifetime of a run.
///
/// # Examples
///
/// ```
/// use fc_core::AgentConfig;
///
/// let config = AgentConfig::from_json(r#"{
///     "watch_directory": "/in",
///     "target_directory": "/out",
///     "file_extensions": [".csv"]
/// }"#).unwrap();
///
/// assert_eq!(config.watch_directory, "/in");
/// assert_eq!(config.transfer.max_attempts, 5);
/// assert!(config.remote_credentials().is_none());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Directory watched (non-recursively) for new files.
    pub watch_directory: Utf8PathBuf,

    /// Directory new files are copied into.
    pub target_directory: Utf8PathBuf,

    /// File name suffixes to copy, matched case-sensitively in order.
    pub file_extensions: Vec<String>,

    /// Network share user, when the target is a remote mount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_user: Option<String>,

    /// Network share password, when the target is a remote mount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_password: Option<String>,

    /// Stabilization and retry tuning.
    #[serde(default)]
    pub transfer: TransferConfig,

    /// Watcher tuning.
    #[serde(default)]
    pub watch: WatchConfig,
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("watch_directory", &self.watch_directory)
            .field("target_directory", &self.target_directory)
            .field("file_extensions", &self.file_extensions)
            .field("network_user", &self.network_user)
            .field(
                "network_password",
                &self.network_password.as_ref().map(|_| "<redacted>"),
            )
            .field("transfer", &self.transfer)
            .field("watch", &self.watch)
            .finish()
    }
}

impl AgentConfig {
    /// Creates a configuration with default tuning and no remote mount.
    #[must_use]
    pub fn new(
        watch_directory: impl Into<Utf8PathBuf>,
        target_directory: impl Into<Utf8PathBuf>,
        file_extensions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            watch_directory: watch_directory.into(),
            target_directory: target_directory.into(),
            file_extensions: file_extensions.into_iter().map(Into::into).collect(),
            network_user: None,
            network_password: None,
            transfer: TransferConfig::default(),
            watch: WatchConfig::default(),
        }
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// Only parsing happens here; call [`validate`](Self::validate) and
    /// [`validate_directories`](Self::validate_directories) before use.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parses a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks option values without touching the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watch_directory.as_str().is_empty() {
            return Err(ConfigError::invalid_option(
                "watch_directory",
                "must not be empty",
            ));
        }
        if self.target_directory.as_str().is_empty() {
            return Err(ConfigError::invalid_option(
                "target_directory",
                "must not be empty",
            ));
        }
        match (&self.network_user, &self.network_password) {
            (Some(_), None) => {
                return Err(ConfigError::invalid_option(
                    "network_password",
                    "required when network_user is set",
                ));
            }
            (None, Some(_)) => {
                return Err(ConfigError::invalid_option(
                    "network_user",
                    "required when network_password is set",
                ));
            }
            _ => {}
        }
        if self.watch.channel_capacity == 0 {
            return Err(ConfigError::invalid_option(
                "watch.channel_capacity",
                "must be at least 1",
            ));
        }
        self.transfer.validate()
    }

    /// Checks that the watch and target directories exist and are directories.
    ///
    /// When the target is a network share this must run after mounting.
    pub fn validate_directories(&self) -> Result<(), ConfigError> {
        check_dir("watch", &self.watch_directory)?;
        check_dir("target", &self.target_directory)
    }

    /// Returns the network share credentials, if both are configured.
    #[must_use]
    pub fn remote_credentials(&self) -> Option<RemoteCredentials> {
        match (&self.network_user, &self.network_password) {
            (Some(user), Some(password)) => Some(RemoteCredentials {
                user: user.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

fn check_dir(label: &'static str, path: &Utf8Path) -> Result<(), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingDirectory {
            label,
            path: path.to_owned(),
        });
    }
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory {
            label,
            path: path.to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "watch_directory": "/in",
        "target_directory": "/out",
        "file_extensions": [".csv", ".txt"]
    }"#;

    #[test]
    fn test_transfer_config_defaults() {
        let config = TransferConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.stabilization_timeout(), Duration::from_secs(10));
        assert_eq!(config.retry_delay(), Duration::from_secs(2));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.max_pending_transfers, 1024);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = AgentConfig::from_json(MINIMAL).unwrap();
        assert_eq!(config.watch_directory, "/in");
        assert_eq!(config.target_directory, "/out");
        assert_eq!(config.file_extensions, vec![".csv", ".txt"]);
        assert_eq!(config.transfer, TransferConfig::default());
        assert_eq!(config.watch, WatchConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_tuning_section() {
        let json = r#"{
            "watch_directory": "/in",
            "target_directory": "/out",
            "file_extensions": [".csv"],
            "transfer": { "max_attempts": 2 }
        }"#;
        let config = AgentConfig::from_json(json).unwrap();
        assert_eq!(config.transfer.max_attempts, 2);
        assert_eq!(config.transfer.poll_interval_ms, 500);
    }

    #[test]
    fn test_missing_required_field_is_parse_error() {
        let json = r#"{ "watch_directory": "/in", "file_extensions": [] }"#;
        let result = AgentConfig::from_json(json);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let result = AgentConfig::from_json("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = AgentConfig::load(Utf8Path::new("/nonexistent/config.json"));
        match result {
            Err(ConfigError::Read { path, .. }) => assert_eq!(path, "/nonexistent/config.json"),
            other => panic!("Expected Read error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("config.json")).unwrap();
        std::fs::write(&path, MINIMAL).unwrap();

        let config = AgentConfig::load(&path).unwrap();
        assert_eq!(config.file_extensions.len(), 2);
    }

    #[test]
    fn test_credentials_must_be_paired() {
        let mut config = AgentConfig::new("/in", "/out", [".csv"]);
        config.network_user = Some("svc".to_owned());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOption { ref option, .. }) if option == "network_password"
        ));
        assert!(config.remote_credentials().is_none());

        config.network_password = Some("hunter2".to_owned());
        assert!(config.validate().is_ok());
        let creds = config.remote_credentials().unwrap();
        assert_eq!(creds.user, "svc");
        assert_eq!(creds.password, "hunter2");
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut config = AgentConfig::new("/in", "/out", [".csv"]);
        config.network_user = Some("svc".to_owned());
        config.network_password = Some("hunter2".to_owned());

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));

        let creds = config.remote_credentials().unwrap();
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = AgentConfig::new("/in", "/out", [".csv"]);
        config.transfer.max_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOption { ref option, .. }) if option == "transfer.max_attempts"
        ));
    }

    #[test]
    fn test_empty_directory_rejected() {
        let config = AgentConfig::new("", "/out", [".csv"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_directories() {
        let watch = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        let watch_path = Utf8PathBuf::from_path_buf(watch.path().to_path_buf()).unwrap();
        let target_path = Utf8PathBuf::from_path_buf(target.path().to_path_buf()).unwrap();

        let config = AgentConfig::new(watch_path.clone(), target_path.clone(), [".csv"]);
        assert!(config.validate_directories().is_ok());

        let missing = AgentConfig::new(watch_path.clone(), target_path.join("nope"), [".csv"]);
        assert!(matches!(
            missing.validate_directories(),
            Err(ConfigError::MissingDirectory { label: "target", .. })
        ));

        let file_path = watch_path.join("plain.txt");
        std::fs::write(&file_path, b"x").unwrap();
        let not_dir = AgentConfig::new(file_path, target_path, [".csv"]);
        assert!(matches!(
            not_dir.validate_directories(),
            Err(ConfigError::NotADirectory { label: "watch", .. })
        ));
    }

    #[test]
    fn test_config_serialization_roundtrip_omits_absent_credentials() {
        let config = AgentConfig::new("/in", "/out", [".csv"]);
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("network_user"));
        let parsed = AgentConfig::from_json(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
