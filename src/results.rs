use std::time::Duration;

/// Terminal state of a search. Delivered exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Every root was walked, or the walk stopped because it was cancelled.
    /// File-level errors do not prevent completion.
    Completed(SearchSummary),

    /// The engine itself failed (e.g. the background thread could not be
    /// started). Always carries a diagnostic message.
    Failed(String),
}

impl SearchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn summary(&self) -> Option<&SearchSummary> {
        match self {
            Self::Completed(s) => Some(s),
            Self::Failed(_) => None,
        }
    }
}

/// Totals for a completed search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSummary {
    /// Match events emitted.
    pub matches: usize,

    /// File error events emitted.
    pub file_errors: usize,

    /// Whether the search stopped early because it was cancelled.
    pub cancelled: bool,

    /// Traversal statistics.
    pub stats: ScanStats,
}

/// Performance statistics for a completed scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanStats {
    /// Eligible files handed to the line scanner.
    pub files: usize,

    /// Directories entered, roots included.
    pub dirs: usize,

    /// Wall-clock time from search start to completion.
    pub duration: Duration,

    /// Total entries scanned per second. Convenience field, equal to
    /// `(files + dirs) / duration.as_secs_f64()`, clamped to 0 on
    /// zero-duration runs.
    pub entries_per_sec: usize,
}

impl ScanStats {
    /// Compute `entries_per_sec` from raw counts and duration.
    pub(crate) fn compute(files: usize, dirs: usize, duration: Duration) -> Self {
        let total = files + dirs;
        let eps = if duration.as_secs_f64() > 0.0 {
            (total as f64 / duration.as_secs_f64()) as usize
        } else {
            0
        };
        Self {
            files,
            dirs,
            duration,
            entries_per_sec: eps,
        }
    }
}
