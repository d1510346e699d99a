//! File name filtering for change events.
//!
//! The [`FileFilter`] trait is the seam the dispatcher uses to decide which
//! new files are worth copying. [`ExtensionFilter`] is the configured
//! implementation: a case-sensitive suffix match against an ordered list.
//!
//! # Examples
//!
//! ```
//! use fc_watcher::{FileFilter, ExtensionFilter};
//! use camino::Utf8Path;
//!
//! let filter = ExtensionFilter::new([".csv", ".tar.gz"]);
//!
//! assert!(filter.should_process(Utf8Path::new("/in/report.csv")));
//! assert!(filter.should_process(Utf8Path::new("/in/backup.tar.gz")));
//!
//! // Case-sensitive, and only the file name is considered
//! assert!(!filter.should_process(Utf8Path::new("/in/REPORT.CSV")));
//! assert!(!filter.should_process(Utf8Path::new("/in/data.csv.partial")));
//! ```

use camino::Utf8Path;
use smallvec::SmallVec;

/// A predicate deciding whether a file should be transferred.
///
/// Filters must be [`Send`] and [`Sync`] so a single instance can be shared
/// by the dispatcher across tasks.
pub trait FileFilter: Send + Sync + 'static {
    /// Returns `true` if the file at the given path should be processed.
    fn should_process(&self, path: &Utf8Path) -> bool;
}

/// Returns the first extension in `extensions` that `file_name` ends with.
///
/// Matching is a plain case-sensitive suffix test, so multi-part suffixes
/// such as `.tar.gz` work and the leading dot is part of the suffix. An
/// empty string is a suffix of every name, so it matches everything.
///
/// # Examples
///
/// ```
/// use fc_watcher::matching_extension;
///
/// let extensions = [".gz", ".tar.gz"];
/// assert_eq!(matching_extension("a.tar.gz", &extensions), Some(".gz"));
/// assert_eq!(matching_extension("a.zip", &extensions), None);
/// ```
#[must_use]
pub fn matching_extension<'a, S: AsRef<str>>(file_name: &str, extensions: &'a [S]) -> Option<&'a str> {
    extensions
        .iter()
        .map(AsRef::as_ref)
        .find(|ext| file_name.ends_with(ext))
}

/// A filter accepting file names that end with one of the configured suffixes.
///
/// The order of the suffixes only decides which one short-circuits the
/// scan; it never changes whether a name is accepted.
#[derive(Debug, Clone, Default)]
pub struct ExtensionFilter {
    extensions: SmallVec<[String; 4]>,
}

impl ExtensionFilter {
    /// Creates a new extension filter.
    ///
    /// # Arguments
    ///
    /// * `extensions` - The suffixes to accept, usually including the leading dot
    #[must_use]
    pub fn new(extensions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the configured suffixes in priority order.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Returns `true` if no suffixes are configured, so nothing can match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Returns `true` if an empty suffix is configured, so everything matches.
    #[must_use]
    pub fn accepts_all(&self) -> bool {
        self.extensions.iter().any(String::is_empty)
    }

    /// Returns the suffix that accepts `path`, if any.
    #[must_use]
    pub fn matched_extension(&self, path: &Utf8Path) -> Option<&str> {
        path.file_name()
            .and_then(|name| matching_extension(name, &self.extensions))
    }
}

impl FileFilter for ExtensionFilter {
    #[inline]
    fn should_process(&self, path: &Utf8Path) -> bool {
        self.matched_extension(path).is_some()
    }
}

// Implement FileFilter for Arc-wrapped filters (useful for shared filters)
impl<F: FileFilter + ?Sized> FileFilter for std::sync::Arc<F> {
    fn should_process(&self, path: &Utf8Path) -> bool {
        (**self).should_process(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_extension_first_match_wins() {
        let extensions = vec![".csv".to_owned(), ".v.csv".to_owned()];
        assert_eq!(matching_extension("a.v.csv", &extensions), Some(".csv"));
        assert_eq!(matching_extension("a.txt", &extensions), None);
    }

    #[test]
    fn test_matching_extension_is_case_sensitive() {
        assert_eq!(matching_extension("REPORT.CSV", &[".csv"]), None);
        assert_eq!(matching_extension("REPORT.CSV", &[".CSV"]), Some(".CSV"));
    }

    #[test]
    fn test_matching_extension_empty_suffix_matches_everything() {
        assert_eq!(matching_extension("report.csv", &[""]), Some(""));
        assert_eq!(matching_extension("anything", &["", ".csv"]), Some(""));
        assert_eq!(matching_extension("x.csv", &[".csv", ""]), Some(".csv"));
    }

    #[test]
    fn test_suffix_without_dot_matches_plain_ending() {
        // Matches the suffix-only semantics of the configured list.
        assert_eq!(matching_extension("reportcsv", &["csv"]), Some("csv"));
    }

    #[test]
    fn test_extension_filter() {
        let filter = ExtensionFilter::new([".csv", ".xml"]);

        assert!(filter.should_process(Utf8Path::new("/in/a.csv")));
        assert!(filter.should_process(Utf8Path::new("relative/b.xml")));
        assert!(!filter.should_process(Utf8Path::new("/in/c.json")));
        assert!(!filter.should_process(Utf8Path::new("/in/a.csv.tmp")));
    }

    #[test]
    fn test_extension_filter_uses_file_name_only() {
        let filter = ExtensionFilter::new([".d"]);
        assert!(filter.should_process(Utf8Path::new("/in/conf.d")));
        assert!(!filter.should_process(Utf8Path::new("/in.d/file")));
        assert!(!filter.should_process(Utf8Path::new("/")));
    }

    #[test]
    fn test_extension_filter_matched_extension() {
        let filter = ExtensionFilter::new([".csv", ".gz"]);
        assert_eq!(
            filter.matched_extension(Utf8Path::new("/in/x.csv")),
            Some(".csv")
        );
        assert_eq!(filter.matched_extension(Utf8Path::new("/in/x")), None);
    }

    #[test]
    fn test_empty_filter_rejects_everything() {
        let filter = ExtensionFilter::new(Vec::<String>::new());
        assert!(filter.is_empty());
        assert!(!filter.accepts_all());
        assert!(!filter.should_process(Utf8Path::new("/in/a.csv")));
    }

    #[test]
    fn test_blank_suffix_accepts_everything() {
        let blank = ExtensionFilter::new([""]);
        assert!(!blank.is_empty());
        assert!(blank.accepts_all());
        assert!(blank.should_process(Utf8Path::new("/in/a.csv")));
        assert!(blank.should_process(Utf8Path::new("/in/README")));
        assert!(!blank.should_process(Utf8Path::new("/")));
    }

    #[test]
    fn test_arc_filter() {
        let filter = std::sync::Arc::new(ExtensionFilter::new([".csv"]));
        assert!(filter.should_process(Utf8Path::new("a.csv")));
        assert_eq!(filter.extensions(), [".csv".to_owned()]);
    }
}
