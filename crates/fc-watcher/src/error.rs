//! Error types for the fc-watcher crate.
//!
//! This module provides the [`WatchError`] type for errors that can occur
//! while subscribing to or receiving directory change notifications.

use camino::Utf8PathBuf;

/// Errors that can occur during directory watching.
///
/// Errors returned by [`DirectoryWatcher::subscribe`] prevent watching
/// altogether and are fatal at startup. Errors delivered on the watcher's
/// error stream afterwards do not stop the watcher; the consumer logs them
/// and keeps going.
///
/// # Error Recovery Strategy
///
/// - **Notify errors** ([`WatchError::Notify`]): fatal from `subscribe`, logged when streamed
/// - **Path not found** ([`WatchError::PathNotFound`]): fatal - path must exist
/// - **Not a directory** ([`WatchError::NotADirectory`]): fatal - only directories are watched
/// - **Non-UTF-8 path** ([`WatchError::NonUtf8Path`]): recoverable - event skipped
/// - **I/O errors** ([`WatchError::Io`]): fatal - path could not be resolved
///
/// [`DirectoryWatcher::subscribe`]: crate::DirectoryWatcher::subscribe
///
/// # Examples
///
/// ```
/// use fc_watcher::WatchError;
///
/// fn handle_error(err: WatchError) {
///     match err {
///         WatchError::Notify(e) => eprintln!("Notify error: {e}"),
///         WatchError::PathNotFound(p) => eprintln!("Path not found: {p}"),
///         WatchError::NotADirectory(p) => eprintln!("Not a directory: {p}"),
///         WatchError::NonUtf8Path(p) => eprintln!("Invalid path: {}", p.display()),
///         WatchError::Io(e) => eprintln!("I/O error: {e}"),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The notify backend failed to initialize or reported a runtime error.
    #[error("notify watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// The specified path does not exist.
    #[error("path does not exist: {0}")]
    PathNotFound(Utf8PathBuf),

    /// The specified path exists but is not a directory.
    #[error("path is not a directory: {0}")]
    NotADirectory(Utf8PathBuf),

    /// A path in a change notification is not valid UTF-8.
    ///
    /// The event is skipped; watching continues.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// An I/O error occurred while resolving the watch path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatchError {
    /// Creates a new [`WatchError::PathNotFound`] error.
    #[inline]
    pub fn path_not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Creates a new [`WatchError::NonUtf8Path`] error.
    #[inline]
    pub fn non_utf8_path(path: impl Into<std::path::PathBuf>) -> Self {
        Self::NonUtf8Path(path.into())
    }

    /// Returns `true` if this error only affects a single event.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NonUtf8Path(_))
    }

    /// Returns `true` if this error prevents watching when returned from `subscribe`.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the watch path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::PathNotFound(path) | Self::NotADirectory(path) => Some(path),
            Self::Notify(_) | Self::NonUtf8Path(_) | Self::Io(_) => None,
        }
    }
}
