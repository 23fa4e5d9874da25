//! # foldersearch
//!
//! Background keyword search across several folder trees.
//!
//! A search walks every root recursively, scans files whose names end in an
//! allowed extension, and streams one event per matching line while the
//! caller stays free to do other work. Unreadable files are reported as
//! events and never stop the search; unreadable directories are skipped.
//!
//! # Quick Start
//!
//! ```rust
//! use std::fs;
//! use foldersearch::SearchOutcome;
//!
//! let dir = tempfile::tempdir().unwrap();
//! fs::write(dir.path().join("a.txt"), "hello\nHello World\nbye\n").unwrap();
//!
//! let mut handle = foldersearch::search()
//!     .keyword("hello")
//!     .root(dir.path())
//!     .start()
//!     .unwrap();
//!
//! let lines: Vec<usize> = handle
//!     .events()
//!     .filter_map(|e| e.as_match().map(|m| m.line_number))
//!     .collect();
//! assert_eq!(lines, vec![1, 2]);
//! assert!(matches!(handle.outcome(), Some(SearchOutcome::Completed(_))));
//! ```
//!
//! # Ordering
//!
//! Matches from one file arrive in ascending line order. Files and roots are
//! walked in parallel, so nothing is promised about ordering across files.
//!
//! # Cancellation
//!
//! [`SearchHandle::cancel`] is cooperative: no new directory is listed and
//! no new file or line is read after it is observed. The search still ends
//! with [`SearchOutcome::Completed`], with `cancelled` set in its summary.

#![forbid(unsafe_code)]

mod builder;
mod engine;
mod error;
mod event;
mod filter;
mod handle;
mod request;
mod results;
mod scanner;
mod walker;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use builder::{SearchBuilder, DEFAULT_CHANNEL_CAPACITY};
pub use error::SearchError;
pub use event::{no_results_message, FileErrorEvent, MatchEvent, SearchEvent};
pub use filter::{EntryClass, FileFilter, DEFAULT_EXTENSIONS};
pub use handle::{CancelToken, Events, SearchHandle};
pub use request::{RootSet, SearchRequest};
pub use results::{ScanStats, SearchOutcome, SearchSummary};
pub use scanner::{scan_file, LineScanner};

// ── Entry points ──────────────────────────────────────────────────────────────

/// Create a new [`SearchBuilder`] to configure and start a search.
pub fn search() -> SearchBuilder {
    SearchBuilder::default()
}

/// Start a search with the default configuration.
///
/// Fails synchronously, without walking anything, if `keyword` is blank or
/// `roots` is empty. Duplicate roots are walked once.
///
/// # Example
///
/// ```rust
/// use foldersearch::SearchError;
///
/// let err = foldersearch::start_search("  ", ["."]).unwrap_err();
/// assert!(matches!(err, SearchError::EmptyKeyword));
/// ```
pub fn start_search<I, P>(keyword: &str, roots: I) -> Result<SearchHandle, SearchError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<std::path::Path>,
{
    search().keyword(keyword).roots(roots).start()
}

/// Start a search for an already validated [`SearchRequest`] with the
/// default configuration.
///
/// # Example
///
/// ```rust
/// use foldersearch::{RootSet, SearchRequest};
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("todo.txt"), "buy milk\n").unwrap();
///
/// let roots: RootSet = [dir.path()].into_iter().collect();
/// let request = SearchRequest::new("MILK", roots).unwrap();
/// let outcome = foldersearch::start_request(request).unwrap().wait();
/// assert_eq!(outcome.summary().unwrap().matches, 1);
/// ```
pub fn start_request(request: SearchRequest) -> Result<SearchHandle, SearchError> {
    search().request(request).start()
}
