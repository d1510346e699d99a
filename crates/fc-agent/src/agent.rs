//! Agent startup, run loop and shutdown.

use std::sync::Arc;

use camino::Utf8Path;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use fc_core::AgentConfig;
use fc_transfer::{
    FileCopier, FsCopier, StatsSnapshot, TransferGate, TransferPipeline, TransferReport,
    TransferStats,
};
use fc_watcher::{DirectoryWatcher, ExtensionFilter};

use crate::dispatcher::EventDispatcher;
use crate::error::AgentError;
use crate::mount::{MountError, NetUseMounter, RemoteMounter};

/// A configured, not yet started agent.
///
/// # Examples
///
/// ```no_run
/// use fc_agent::Agent;
/// use fc_core::AgentConfig;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), fc_agent::AgentError> {
/// let config = AgentConfig::new("/in", "/out", [".csv"]);
/// let running = Agent::new(config).start().await?;
///
/// let shutdown = CancellationToken::new();
/// let summary = running.run(shutdown).await;
/// println!("copied {} file(s)", summary.succeeded);
/// # Ok(())
/// # }
/// ```
pub struct Agent<C = FsCopier> {
    config: Arc<AgentConfig>,
    copier: C,
    mounter: Arc<dyn RemoteMounter>,
    reports: Option<mpsc::UnboundedSender<TransferReport>>,
}

impl<C> std::fmt::Debug for Agent<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .field("reports", &self.reports.is_some())
            .finish_non_exhaustive()
    }
}

impl Agent<FsCopier> {
    /// Creates an agent copying with [`FsCopier`] and mounting with
    /// [`NetUseMounter`].
    #[must_use]
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config: Arc::new(config),
            copier: FsCopier,
            mounter: Arc::new(NetUseMounter::new()),
            reports: None,
        }
    }
}

impl<C: FileCopier> Agent<C> {
    /// Replaces the copy capability.
    #[must_use]
    pub fn with_copier<D: FileCopier>(self, copier: D) -> Agent<D> {
        Agent {
            config: self.config,
            copier,
            mounter: self.mounter,
            reports: self.reports,
        }
    }

    /// Replaces the remote mounter.
    #[must_use]
    pub fn with_mounter(mut self, mounter: impl RemoteMounter + 'static) -> Self {
        self.mounter = Arc::new(mounter);
        self
    }

    /// Sends every settled transfer's report to `reports`.
    #[must_use]
    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<TransferReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Returns the agent's configuration.
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Validates, mounts if configured, and opens the watch subscription.
    ///
    /// # Errors
    ///
    /// Every failure here is fatal: an invalid configuration, a failed
    /// mount, a missing watch or target directory, or a watcher that could
    /// not be started.
    pub async fn start(self) -> Result<RunningAgent<C>, AgentError> {
        let config = self.config;
        config.validate()?;

        if let Some(credentials) = config.remote_credentials() {
            let mounter = Arc::clone(&self.mounter);
            let target = config.target_directory.clone();
            tracing::info!(target_dir = %target, user = %credentials.user, "Mounting network share");
            tokio::task::spawn_blocking(move || mounter.mount(&target, &credentials))
                .await
                .map_err(|join_error| MountError::Spawn {
                    command: "mount".to_owned(),
                    source: std::io::Error::other(join_error),
                })??;
        }

        config.validate_directories()?;

        let watcher = DirectoryWatcher::subscribe(&config.watch_directory, &config.watch)?;

        let filter = ExtensionFilter::new(config.file_extensions.iter().cloned());
        if filter.is_empty() {
            tracing::warn!("No file extensions configured, nothing will be copied");
        } else if filter.accepts_all() {
            tracing::warn!("An empty file extension is configured, every new file will be copied");
        }

        let stats = Arc::new(TransferStats::new());
        let mut pipeline = TransferPipeline::new(
            &config.target_directory,
            &config.transfer,
            self.copier,
            TransferGate::new(),
            Arc::clone(&stats),
        );
        if let Some(reports) = self.reports {
            pipeline = pipeline.with_reports(reports);
        }

        let dispatcher = EventDispatcher::new(
            filter,
            pipeline,
            config.transfer.max_pending_transfers,
        );

        tracing::info!(
            watch = %watcher.watch_path(),
            target_dir = %config.target_directory,
            extensions = ?config.file_extensions,
            "Agent started"
        );

        Ok(RunningAgent {
            config,
            watcher,
            dispatcher,
            stats,
        })
    }
}

/// A started agent, ready to run its consumer loop.
#[derive(Debug)]
pub struct RunningAgent<C = FsCopier> {
    config: Arc<AgentConfig>,
    watcher: DirectoryWatcher,
    dispatcher: EventDispatcher<ExtensionFilter, C>,
    stats: Arc<TransferStats>,
}

impl<C: FileCopier> RunningAgent<C> {
    /// Returns the resolved directory being watched.
    #[must_use]
    pub fn watch_path(&self) -> &Utf8Path {
        self.watcher.watch_path()
    }

    /// Returns the agent's configuration.
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Returns the current transfer counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Consumes events until `shutdown` is cancelled or the watcher stops.
    ///
    /// On exit the watcher is closed and in-flight transfers are allowed to
    /// finish before the final counters are returned.
    pub async fn run(mut self, shutdown: CancellationToken) -> StatsSnapshot {
        let mut errors_open = true;

        loop {
            let (events, errors) = self.watcher.streams();
            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::warn!("Watcher event stream ended");
                        break;
                    };
                    self.dispatcher.dispatch(event);
                }
                error = errors.recv(), if errors_open => {
                    match error {
                        Some(error) => tracing::warn!(error = %error, "Watcher error"),
                        None => errors_open = false,
                    }
                }
            }
        }

        self.watcher.close();
        self.dispatcher.drain().await;

        let summary = self.stats.snapshot();
        tracing::info!(
            detected = summary.detected,
            succeeded = summary.succeeded,
            failed = summary.failed,
            unstable = summary.unstable,
            dropped = summary.dropped,
            bytes_copied = summary.bytes_copied,
            "Agent stopped"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use fc_core::{ConfigError, RemoteCredentials};
    use parking_lot::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Dirs {
        _tmp: TempDir,
        root: Utf8PathBuf,
        watch: Utf8PathBuf,
        target: Utf8PathBuf,
    }

    fn dirs() -> Dirs {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        let watch = root.join("in");
        let target = root.join("out");
        std::fs::create_dir(&watch).unwrap();
        std::fs::create_dir(&target).unwrap();
        Dirs {
            _tmp: tmp,
            root,
            watch,
            target,
        }
    }

    /// Records mount calls; creates the target when `creates` is set.
    #[derive(Default)]
    struct RecordingMounter {
        calls: Arc<Mutex<Vec<(Utf8PathBuf, String)>>>,
        creates: bool,
        fails: bool,
    }

    impl RemoteMounter for RecordingMounter {
        fn mount(&self, target: &Utf8Path, credentials: &RemoteCredentials) -> Result<(), MountError> {
            self.calls
                .lock()
                .push((target.to_owned(), credentials.user.clone()));
            if self.fails {
                return Err(MountError::Unsupported);
            }
            if self.creates {
                std::fs::create_dir_all(target).map_err(|source| MountError::Spawn {
                    command: "mkdir".into(),
                    source,
                })?;
            }
            Ok(())
        }
    }

    fn with_credentials(mut config: AgentConfig) -> AgentConfig {
        config.network_user = Some("svc".into());
        config.network_password = Some("secret".into());
        config
    }

    #[tokio::test]
    async fn test_start_without_credentials_skips_mount() {
        let d = dirs();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mounter = RecordingMounter {
            calls: Arc::clone(&calls),
            ..RecordingMounter::default()
        };

        let running = Agent::new(AgentConfig::new(&d.watch, &d.target, [".csv"]))
            .with_mounter(mounter)
            .start()
            .await
            .unwrap();

        assert!(calls.lock().is_empty());
        assert_eq!(running.stats(), StatsSnapshot::default());
    }

    #[tokio::test]
    async fn test_mount_runs_before_directory_checks() {
        let d = dirs();
        let share = d.root.join("share");
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mounter = RecordingMounter {
            calls: Arc::clone(&calls),
            creates: true,
            fails: false,
        };

        let config = with_credentials(AgentConfig::new(&d.watch, &share, [".csv"]));
        let result = Agent::new(config).with_mounter(mounter).start().await;

        assert!(result.is_ok(), "start failed: {:?}", result.err());
        assert_eq!(calls.lock().as_slice(), [(share, "svc".to_owned())]);
    }

    #[tokio::test]
    async fn test_mount_failure_is_fatal() {
        let d = dirs();
        let mounter = RecordingMounter {
            fails: true,
            ..RecordingMounter::default()
        };
        let config = with_credentials(AgentConfig::new(&d.watch, &d.target, [".csv"]));

        let err = Agent::new(config)
            .with_mounter(mounter)
            .start()
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Mount(MountError::Unsupported)));
    }

    #[tokio::test]
    async fn test_missing_target_is_fatal() {
        let d = dirs();
        let config = AgentConfig::new(&d.watch, d.root.join("nowhere"), [".csv"]);

        let err = Agent::new(config).start().await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::Config(ConfigError::MissingDirectory { label: "target", .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_mount() {
        let d = dirs();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mounter = RecordingMounter {
            calls: Arc::clone(&calls),
            ..RecordingMounter::default()
        };
        let mut config = with_credentials(AgentConfig::new(&d.watch, &d.target, [".csv"]));
        config.transfer.max_attempts = 0;

        let err = Agent::new(config)
            .with_mounter(mounter)
            .start()
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Config(ConfigError::InvalidOption { .. })));
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_stops_run_loop() {
        let d = dirs();
        let running = Agent::new(AgentConfig::new(&d.watch, &d.target, [".csv"]))
            .start()
            .await
            .unwrap();

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(running.run(shutdown.clone()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();

        let summary = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary, StatsSnapshot::default());
    }

    #[tokio::test]
    async fn test_empty_extensions_still_start() {
        let d = dirs();
        let running = Agent::new(AgentConfig::new(&d.watch, &d.target, Vec::<String>::new()))
            .start()
            .await
            .unwrap();
        assert!(running.config().file_extensions.is_empty());
    }
}
