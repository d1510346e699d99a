//! Change events emitted by the directory watcher.
//!
//! # Event Flow
//!
//! ```text
//! notify::Event (kind + N paths)
//!        │
//!        ▼
//!   classify kind ──► ChangeKind
//!        │
//!        ▼
//!   one ChangeEvent per path
//!        │
//!        ▼
//!   mpsc channel ──► dispatcher (acts on Created only)
//! ```

use std::time::Instant;

use camino::Utf8PathBuf;
use notify::EventKind;
use notify::event::{ModifyKind, RenameMode};
use smallvec::SmallVec;

/// The operation a change notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ChangeKind {
    /// A new entry appeared in the directory.
    ///
    /// Includes entries renamed or moved into the directory.
    Created,
    /// An existing entry's content or metadata changed.
    Modified,
    /// An entry was removed.
    Removed,
    /// An entry was renamed away from its old name.
    Renamed,
    /// Access notifications and anything the backend could not classify.
    Other,
}

impl ChangeKind {
    /// Returns a short lowercase label for logging.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
            Self::Renamed => "renamed",
            Self::Other => "other",
        }
    }
}

/// A single change to a directory entry.
///
/// # Examples
///
/// ```
/// use fc_watcher::{ChangeEvent, ChangeKind};
/// use camino::Utf8PathBuf;
///
/// let event = ChangeEvent::new(Utf8PathBuf::from("/in/report.csv"), ChangeKind::Created);
/// assert!(event.is_created());
/// assert_eq!(event.file_name(), Some("report.csv"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The path of the affected entry, as reported by the backend.
    pub path: Utf8PathBuf,

    /// The operation that was observed.
    pub kind: ChangeKind,

    /// When the watcher received the notification.
    pub received_at: Instant,
}

impl ChangeEvent {
    /// Creates a new change event stamped with the current instant.
    #[inline]
    #[must_use]
    pub fn new(path: Utf8PathBuf, kind: ChangeKind) -> Self {
        Self {
            path,
            kind,
            received_at: Instant::now(),
        }
    }

    /// Returns `true` if this event reports a new directory entry.
    #[inline]
    #[must_use]
    pub fn is_created(&self) -> bool {
        self.kind == ChangeKind::Created
    }

    /// Returns the file name without the directory path.
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name()
    }
}

/// Maps a notify event to `(path, kind)` pairs, one per affected path.
///
/// A two-path rename reports its destination as created and its source as
/// renamed away.
pub(crate) fn classify(
    kind: &EventKind,
    paths: Vec<std::path::PathBuf>,
) -> SmallVec<[(std::path::PathBuf, ChangeKind); 2]> {
    match kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut out = SmallVec::new();
            let mut iter = paths.into_iter();
            if let Some(from) = iter.next() {
                out.push((from, ChangeKind::Renamed));
            }
            if let Some(to) = iter.next() {
                out.push((to, ChangeKind::Created));
            }
            out
        }
        other => {
            let change = kind_of(other);
            paths.into_iter().map(|path| (path, change)).collect()
        }
    }
}

fn kind_of(kind: &EventKind) -> ChangeKind {
    match kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            ChangeKind::Created
        }
        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Renamed,
        EventKind::Modify(_) => ChangeKind::Modified,
        EventKind::Remove(_) => ChangeKind::Removed,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => ChangeKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind};
    use std::path::PathBuf;

    #[test]
    fn test_change_event_new() {
        let event = ChangeEvent::new(Utf8PathBuf::from("/in/a.csv"), ChangeKind::Created);
        assert!(event.is_created());
        assert_eq!(event.file_name(), Some("a.csv"));

        let modified = ChangeEvent::new(Utf8PathBuf::from("/in/a.csv"), ChangeKind::Modified);
        assert!(!modified.is_created());
    }

    #[test]
    fn test_classify_create() {
        let out = classify(
            &EventKind::Create(CreateKind::File),
            vec![PathBuf::from("/in/a.csv")],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1, ChangeKind::Created);
    }

    #[test]
    fn test_classify_rename_into_directory_is_created() {
        let out = classify(
            &EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            vec![PathBuf::from("/in/moved.csv")],
        );
        assert_eq!(out[0].1, ChangeKind::Created);
    }

    #[test]
    fn test_classify_rename_both() {
        let out = classify(
            &EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            vec![PathBuf::from("/in/a.tmp"), PathBuf::from("/in/a.csv")],
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], (PathBuf::from("/in/a.tmp"), ChangeKind::Renamed));
        assert_eq!(out[1], (PathBuf::from("/in/a.csv"), ChangeKind::Created));
    }

    #[test]
    fn test_classify_other_kinds() {
        let paths = || vec![PathBuf::from("/in/a.csv")];
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Data(DataChange::Any)), paths())[0].1,
            ChangeKind::Modified
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::From)), paths())[0].1,
            ChangeKind::Renamed
        );
        assert_eq!(
            classify(&EventKind::Remove(RemoveKind::File), paths())[0].1,
            ChangeKind::Removed
        );
        assert_eq!(
            classify(&EventKind::Access(AccessKind::Any), paths())[0].1,
            ChangeKind::Other
        );
    }

    #[test]
    fn test_classify_splits_multiple_paths() {
        let out = classify(
            &EventKind::Create(CreateKind::Any),
            vec![PathBuf::from("/in/a.csv"), PathBuf::from("/in/b.csv")],
        );
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|(_, kind)| *kind == ChangeKind::Created));
    }

    #[test]
    fn test_change_kind_label() {
        assert_eq!(ChangeKind::Created.label(), "created");
        assert_eq!(ChangeKind::Removed.label(), "removed");
    }
}
