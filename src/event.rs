use std::fmt;
use std::path::PathBuf;

use crate::results::SearchOutcome;

/// One line of one file that contains the keyword.
///
/// A file with N matching lines produces N events, in ascending
/// `line_number` order. Nothing is promised about ordering across files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEvent {
    /// Absolute path of the file.
    pub path: PathBuf,

    /// 1-based line number.
    pub line_number: usize,

    /// The matching line, trimmed of surrounding whitespace.
    pub line_text: String,
}

/// A candidate file that could not be opened or read.
///
/// Reported at most once per file. Does not stop the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileErrorEvent {
    pub path: PathBuf,
    pub message: String,
}

/// An item on the search event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    Match(MatchEvent),
    FileError(FileErrorEvent),
}

impl SearchEvent {
    /// The file this event was produced for.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Match(m) => &m.path,
            Self::FileError(e) => &e.path,
        }
    }

    pub fn as_match(&self) -> Option<&MatchEvent> {
        match self {
            Self::Match(m) => Some(m),
            Self::FileError(_) => None,
        }
    }

    pub fn as_file_error(&self) -> Option<&FileErrorEvent> {
        match self {
            Self::FileError(e) => Some(e),
            Self::Match(_) => None,
        }
    }
}

/// What travels over the channel from the background search to the handle.
/// `Finished` is always the last message and is sent exactly once.
#[derive(Debug)]
pub(crate) enum SearchMessage {
    Event(SearchEvent),
    Finished(SearchOutcome),
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Line {}): {}",
            self.path.display(),
            self.line_number,
            self.line_text
        )
    }
}

impl fmt::Display for FileErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error reading file {}: {}", self.path.display(), self.message)
    }
}

impl fmt::Display for SearchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match(m) => m.fmt(f),
            Self::FileError(e) => e.fmt(f),
        }
    }
}

/// Message shown once a search completes without a single match.
pub fn no_results_message(keyword: &str) -> String {
    format!("No results found for keyword: '{keyword}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_match_line() {
        let m = MatchEvent {
            path: PathBuf::from("/notes/a.txt"),
            line_number: 2,
            line_text: "Hello World".into(),
        };
        assert_eq!(m.to_string(), "/notes/a.txt (Line 2): Hello World");
    }

    #[test]
    fn renders_file_error_line() {
        let e = SearchEvent::FileError(FileErrorEvent {
            path: PathBuf::from("/notes/b.log"),
            message: "Permission denied".into(),
        });
        assert_eq!(
            e.to_string(),
            "Error reading file /notes/b.log: Permission denied"
        );
        assert!(e.as_match().is_none());
    }

    #[test]
    fn renders_no_results() {
        assert_eq!(
            no_results_message("needle"),
            "No results found for keyword: 'needle'"
        );
    }
}
