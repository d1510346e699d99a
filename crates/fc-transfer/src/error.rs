//! Error types for the fc-transfer crate.

use camino::Utf8PathBuf;

/// Errors that can end a single file's transfer.
///
/// None of these affect other transfers or the agent itself: the pipeline
/// logs them, records the outcome and moves on.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Every copy attempt failed.
    ///
    /// Carries the error from the last attempt.
    #[error("failed to copy {source_path} to {destination} after {attempts} attempt(s): {source}")]
    CopyFailed {
        /// The file being copied.
        source_path: Utf8PathBuf,
        /// Where it was being copied to.
        destination: Utf8PathBuf,
        /// How many attempts were made.
        attempts: u32,
        /// The last underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The source path has no file name, so no destination can be derived.
    #[error("cannot derive a destination for {0}: path has no file name")]
    NoFileName(Utf8PathBuf),
}

impl TransferError {
    /// Returns the source path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Utf8PathBuf {
        match self {
            Self::CopyFailed { source_path, .. } => source_path,
            Self::NoFileName(path) => path,
        }
    }

    /// Returns an equivalent error. The I/O source keeps its kind and
    /// message but loses any inner error chain.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        match self {
            Self::CopyFailed {
                source_path,
                destination,
                attempts,
                source,
            } => Self::CopyFailed {
                source_path: source_path.clone(),
                destination: destination.clone(),
                attempts: *attempts,
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
            Self::NoFileName(path) => Self::NoFileName(path.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_copy_failed_display() {
        let err = TransferError::CopyFailed {
            source_path: Utf8PathBuf::from("/in/a.csv"),
            destination: Utf8PathBuf::from("/out/a.csv"),
            attempts: 5,
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/in/a.csv"));
        assert!(msg.contains("/out/a.csv"));
        assert!(msg.contains("5 attempt(s)"));
        assert!(msg.contains("denied"));
        assert_eq!(err.path().as_str(), "/in/a.csv");
    }

    #[test]
    fn test_duplicate_keeps_kind_and_message() {
        let err = TransferError::CopyFailed {
            source_path: Utf8PathBuf::from("/in/a.csv"),
            destination: Utf8PathBuf::from("/out/a.csv"),
            attempts: 2,
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        let copy = err.duplicate();
        assert_eq!(copy.to_string(), err.to_string());
        match copy {
            TransferError::CopyFailed { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            TransferError::NoFileName(_) => unreachable!(),
        }
    }

    #[test]
    fn test_no_file_name_display() {
        let err = TransferError::NoFileName(Utf8PathBuf::from("/"));
        assert!(err.to_string().contains("no file name"));
    }
}
