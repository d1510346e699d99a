//! Directory watcher bridging `notify` callbacks to tokio channels.
//!
//! [`DirectoryWatcher`] owns a `notify::RecommendedWatcher` subscribed to one
//! directory in non-recursive mode. The backend invokes our callback on its
//! own thread; the callback classifies each notification and forwards it
//! with `blocking_send`, so a slow consumer applies backpressure to the
//! backend thread instead of growing memory without bound.
//!
//! Two channels leave the callback: one for [`ChangeEvent`]s and one for
//! [`WatchError`]s. The consumer selects over both, see
//! [`DirectoryWatcher::streams`].

use camino::{Utf8Path, Utf8PathBuf};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use fc_core::WatchConfig;

use crate::error::WatchError;
use crate::events::{ChangeEvent, classify};

/// Capacity of the error channel. Errors beyond this are logged and dropped.
const ERROR_CHANNEL_CAPACITY: usize = 32;

/// A non-recursive subscription to a directory's change notifications.
///
/// # Lifecycle
///
/// 1. **Subscription**: [`subscribe`](Self::subscribe) validates the path,
///    starts the backend and begins watching. Any failure here is returned
///    immediately.
///
/// 2. **Reception**: [`next_event`](Self::next_event) and
///    [`next_error`](Self::next_error) receive from one stream each;
///    [`streams`](Self::streams) hands out both receivers for `tokio::select!`.
///
/// 3. **Close**: [`close`](Self::close) stops the backend and empties both
///    streams. It is idempotent; dropping the watcher has the same effect.
///
/// # Examples
///
/// ```no_run
/// use fc_watcher::DirectoryWatcher;
/// use fc_core::WatchConfig;
/// use camino::Utf8Path;
///
/// # async fn example() -> Result<(), fc_watcher::WatchError> {
/// let mut watcher = DirectoryWatcher::subscribe(Utf8Path::new("/in"), &WatchConfig::default())?;
///
/// while let Some(event) = watcher.next_event().await {
///     println!("{} {}", event.kind.label(), event.path);
/// }
/// # Ok(())
/// # }
/// ```
pub struct DirectoryWatcher {
    /// The notify backend. `None` once closed.
    watcher: Option<RecommendedWatcher>,

    /// Change events, one per affected path.
    event_rx: mpsc::Receiver<ChangeEvent>,

    /// Backend errors and skipped events.
    error_rx: mpsc::Receiver<WatchError>,

    /// The canonical path being watched.
    watch_path: Utf8PathBuf,
}

impl std::fmt::Debug for DirectoryWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryWatcher")
            .field("watch_path", &self.watch_path)
            .field("is_closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl DirectoryWatcher {
    /// Subscribes to change notifications for entries directly under `path`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::PathNotFound`] if the path doesn't exist,
    /// [`WatchError::NotADirectory`] if it isn't a directory, and
    /// [`WatchError::Notify`] if the backend cannot be started or refuses
    /// the path (for example, on permission errors).
    pub fn subscribe(path: &Utf8Path, config: &WatchConfig) -> Result<Self, WatchError> {
        if !path.exists() {
            return Err(WatchError::path_not_found(path));
        }
        if !path.is_dir() {
            return Err(WatchError::NotADirectory(path.to_owned()));
        }

        let watch_path = path.canonicalize_utf8()?;

        let (event_tx, event_rx) = mpsc::channel(config.channel_capacity.max(1));
        let (error_tx, error_rx) = mpsc::channel(ERROR_CHANNEL_CAPACITY);

        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => forward_event(event, &event_tx, &error_tx),
                Err(error) => forward_error(WatchError::Notify(error), &error_tx),
            })?;

        watcher.watch(watch_path.as_std_path(), RecursiveMode::NonRecursive)?;

        tracing::info!(path = %watch_path, "Directory watcher started");

        Ok(Self {
            watcher: Some(watcher),
            event_rx,
            error_rx,
            watch_path,
        })
    }

    /// Receives the next change event.
    ///
    /// Returns `None` once the watcher is closed.
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        self.event_rx.recv().await
    }

    /// Receives the next watcher-level error.
    ///
    /// Returns `None` once the watcher is closed.
    pub async fn next_error(&mut self) -> Option<WatchError> {
        self.error_rx.recv().await
    }

    /// Returns both receivers for use with `tokio::select!`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use fc_watcher::DirectoryWatcher;
    /// # use fc_core::WatchConfig;
    /// # use camino::Utf8Path;
    /// # async fn example() -> Result<(), fc_watcher::WatchError> {
    /// let mut watcher = DirectoryWatcher::subscribe(Utf8Path::new("/in"), &WatchConfig::default())?;
    /// let (events, errors) = watcher.streams();
    /// tokio::select! {
    ///     Some(event) = events.recv() => println!("event: {}", event.path),
    ///     Some(error) = errors.recv() => eprintln!("error: {error}"),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn streams(
        &mut self,
    ) -> (
        &mut mpsc::Receiver<ChangeEvent>,
        &mut mpsc::Receiver<WatchError>,
    ) {
        (&mut self.event_rx, &mut self.error_rx)
    }

    /// Returns the canonical path being watched.
    #[must_use]
    pub fn watch_path(&self) -> &Utf8Path {
        &self.watch_path
    }

    /// Returns `true` once [`close`](Self::close) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.watcher.is_none()
    }

    /// Stops the backend and terminates both streams.
    ///
    /// Buffered but unreceived items are discarded, so after this returns
    /// both `next_event` and `next_error` yield `None`. Calling `close`
    /// again is a no-op.
    pub fn close(&mut self) {
        let Some(watcher) = self.watcher.take() else {
            return;
        };

        // Close receivers first so a backend thread blocked in
        // `blocking_send` is released before the backend is torn down.
        self.event_rx.close();
        self.error_rx.close();
        drop(watcher);

        let mut discarded = 0_usize;
        while self.event_rx.try_recv().is_ok() {
            discarded += 1;
        }
        while self.error_rx.try_recv().is_ok() {}

        tracing::info!(path = %self.watch_path, discarded, "Directory watcher closed");
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.close();
    }
}

/// Forwards every path of a notify event as a [`ChangeEvent`].
fn forward_event(
    event: notify::Event,
    event_tx: &mpsc::Sender<ChangeEvent>,
    error_tx: &mpsc::Sender<WatchError>,
) {
    for (path, kind) in classify(&event.kind, event.paths) {
        let path = match Utf8PathBuf::from_path_buf(path) {
            Ok(path) => path,
            Err(invalid_path) => {
                tracing::warn!(
                    path = %invalid_path.display(),
                    "Skipping non-UTF-8 path in change event"
                );
                forward_error(WatchError::non_utf8_path(invalid_path), error_tx);
                continue;
            }
        };

        tracing::trace!(path = %path, kind = kind.label(), "Change event");

        // Send via blocking_send for sync context
        if event_tx.blocking_send(ChangeEvent::new(path, kind)).is_err() {
            tracing::debug!("Event channel closed, dropping change event");
            return;
        }
    }
}

/// Forwards an error without blocking the backend thread.
fn forward_error(error: WatchError, error_tx: &mpsc::Sender<WatchError>) {
    match error_tx.try_send(error) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(error)) => {
            tracing::warn!(error = %error, "Error channel full, dropping watcher error");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChangeKind;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn create_temp_dir() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).expect("Invalid path");
        (temp_dir, path)
    }

    /// Waits for a `Created` event for `name`, skipping unrelated events.
    async fn wait_for_created(watcher: &mut DirectoryWatcher, name: &str) -> Option<ChangeEvent> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, watcher.next_event()).await {
                Ok(Some(event)) if event.is_created() && event.file_name() == Some(name) => {
                    return Some(event);
                }
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => return None,
            }
        }
    }

    #[tokio::test]
    async fn test_subscribe_path_not_found() {
        let result = DirectoryWatcher::subscribe(
            Utf8Path::new("/nonexistent/path/that/does/not/exist"),
            &WatchConfig::default(),
        );
        match result {
            Err(WatchError::PathNotFound(_)) => {}
            other => panic!("Expected PathNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_subscribe_rejects_file() {
        let (_guard, dir) = create_temp_dir();
        let file = dir.join("plain.csv");
        fs::write(&file, b"x").expect("write");

        let result = DirectoryWatcher::subscribe(&file, &WatchConfig::default());
        assert!(matches!(result, Err(WatchError::NotADirectory(_))));
    }

    #[tokio::test]
    async fn test_watcher_reports_created_file() {
        let (_guard, dir) = create_temp_dir();
        let mut watcher =
            DirectoryWatcher::subscribe(&dir, &WatchConfig::default()).expect("subscribe");
        assert!(!watcher.is_closed());
        assert!(!watcher.watch_path().as_str().is_empty());

        fs::write(dir.join("report.csv"), b"a,b\n1,2\n").expect("write");

        let event = wait_for_created(&mut watcher, "report.csv").await;
        let event = event.expect("expected a created event for report.csv");
        assert_eq!(event.kind, ChangeKind::Created);
        assert!(event.path.as_str().ends_with("report.csv"));
    }

    #[tokio::test]
    async fn test_watcher_is_not_recursive() {
        let (_guard, dir) = create_temp_dir();
        let nested = dir.join("nested");
        fs::create_dir(&nested).expect("mkdir");

        let mut watcher =
            DirectoryWatcher::subscribe(&dir, &WatchConfig::default()).expect("subscribe");

        fs::write(nested.join("deep.csv"), b"x").expect("write nested");
        fs::write(dir.join("marker.csv"), b"x").expect("write marker");

        // Everything before the marker must not mention the nested file.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let event = tokio::time::timeout(remaining, watcher.next_event())
                .await
                .expect("timed out waiting for marker")
                .expect("stream ended early");
            assert_ne!(event.file_name(), Some("deep.csv"));
            if event.is_created() && event.file_name() == Some("marker.csv") {
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_close_terminates_both_streams() {
        let (_guard, dir) = create_temp_dir();
        let mut watcher =
            DirectoryWatcher::subscribe(&dir, &WatchConfig::default()).expect("subscribe");

        fs::write(dir.join("buffered.csv"), b"x").expect("write");
        tokio::time::sleep(Duration::from_millis(100)).await;

        watcher.close();
        assert!(watcher.is_closed());

        fs::write(dir.join("after.csv"), b"x").expect("write");

        assert!(watcher.next_event().await.is_none());
        assert!(watcher.next_error().await.is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (_guard, dir) = create_temp_dir();
        let mut watcher =
            DirectoryWatcher::subscribe(&dir, &WatchConfig::default()).expect("subscribe");

        watcher.close();
        watcher.close();
        assert!(watcher.is_closed());
        drop(watcher);
    }

    #[tokio::test]
    async fn test_streams_select() {
        let (_guard, dir) = create_temp_dir();
        let mut watcher =
            DirectoryWatcher::subscribe(&dir, &WatchConfig::default()).expect("subscribe");

        fs::write(dir.join("selected.csv"), b"x").expect("write");

        let (events, errors) = watcher.streams();
        let got = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                tokio::select! {
                    Some(event) = events.recv() => {
                        if event.file_name() == Some("selected.csv") {
                            return true;
                        }
                    }
                    Some(_error) = errors.recv() => {}
                    else => return false,
                }
            }
        })
        .await;

        assert_eq!(got.ok(), Some(true));
    }

    #[test]
    fn test_forward_error_drops_when_full() {
        let (error_tx, mut error_rx) = mpsc::channel(1);
        forward_error(WatchError::path_not_found("/a"), &error_tx);
        forward_error(WatchError::path_not_found("/b"), &error_tx);

        let first = error_rx.try_recv().expect("first error");
        assert_eq!(first.path().map(|p| p.as_str()), Some("/a"));
        assert!(error_rx.try_recv().is_err());
    }
}
