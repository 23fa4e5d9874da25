use std::path::{Path, PathBuf};

use crate::engine::{spawn, CompletionCallback, EngineOptions};
use crate::error::SearchError;
use crate::filter::FileFilter;
use crate::handle::SearchHandle;
use crate::request::{RootSet, SearchRequest};
use crate::results::SearchOutcome;
use crate::walker::WalkConfig;

/// Default number of events buffered ahead of the consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

// ---------------------------------------------------------------------------
// SearchBuilder
// ---------------------------------------------------------------------------

/// Entry point for configuring and starting a search.
///
/// Created via [`foldersearch::search()`](crate::search). Configure with
/// chained builder methods, then call [`start()`](SearchBuilder::start).
///
/// # Example
///
/// ```rust,no_run
/// let mut handle = foldersearch::search()
///     .keyword("timeout")
///     .root("/var/log/app")
///     .root("/srv/projects")
///     .extensions(["log", "txt"])
///     .start()?;
///
/// for event in handle.events() {
///     println!("{event}");
/// }
/// # Ok::<(), foldersearch::SearchError>(())
/// ```
pub struct SearchBuilder {
    keyword:      String,
    roots:        Vec<PathBuf>,
    extensions:   Option<Vec<String>>,
    threads:      usize,
    follow_links: bool,
    capacity:     usize,
    on_complete:  Option<CompletionCallback>,
}

impl Default for SearchBuilder {
    fn default() -> Self {
        Self {
            keyword:      String::new(),
            roots:        Vec::new(),
            extensions:   None,
            threads:      num_cpus(),
            follow_links: true,
            capacity:     DEFAULT_CHANNEL_CAPACITY,
            on_complete:  None,
        }
    }
}

impl SearchBuilder {
    // ── Request ───────────────────────────────────────────────────────────

    /// The keyword to look for. Trimmed before use; matching is
    /// case-insensitive.
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = keyword.into();
        self
    }

    /// Add a folder to search. The same folder added twice is walked once.
    pub fn root(mut self, path: impl AsRef<Path>) -> Self {
        self.roots.push(path.as_ref().to_path_buf());
        self
    }

    /// Add several folders to search.
    pub fn roots<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.roots
            .extend(paths.into_iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    /// Use an already validated request: its keyword and roots replace
    /// anything set so far.
    pub fn request(mut self, request: SearchRequest) -> Self {
        self.keyword = request.keyword().to_string();
        self.roots = request.roots().iter().map(Path::to_path_buf).collect();
        self
    }

    // ── Options ───────────────────────────────────────────────────────────

    /// Replace the extension allow-list.
    ///
    /// Defaults to [`DEFAULT_EXTENSIONS`](crate::DEFAULT_EXTENSIONS). A
    /// missing leading dot is added.
    pub fn extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(exts.into_iter().map(Into::into).collect());
        self
    }

    /// Number of walker threads.
    ///
    /// Defaults to the number of logical CPU cores. `1` walks all roots
    /// sequentially on the single background thread.
    pub fn threads(mut self, n: usize) -> Self {
        self.threads = n;
        self
    }

    /// Follow symbolic links to directories. On by default, so a linked
    /// folder is searched like any other.
    ///
    /// Symlink cycles are detected and skipped. When disabled, linked
    /// directories are skipped.
    pub fn follow_links(mut self, yes: bool) -> Self {
        self.follow_links = yes;
        self
    }

    /// Number of events buffered between the walkers and the consumer.
    ///
    /// Once the buffer is full, walkers wait until the consumer reads more,
    /// so a slow consumer bounds memory instead of queueing every match.
    /// Defaults to [`DEFAULT_CHANNEL_CAPACITY`]; `0` is rejected.
    pub fn channel_capacity(mut self, n: usize) -> Self {
        self.capacity = n;
        self
    }

    /// Run `f` once with the outcome when the search ends.
    ///
    /// Runs on the search thread, before the outcome reaches the handle.
    pub fn on_complete(mut self, f: impl FnOnce(&SearchOutcome) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    // ── Execute ───────────────────────────────────────────────────────────

    /// Validate the configuration and start the search in the background.
    ///
    /// Returns immediately. Events and the outcome are read from the
    /// returned [`SearchHandle`].
    ///
    /// # Errors
    ///
    /// Only validation errors: empty keyword, no roots, a bad extension, or a
    /// zero thread count or channel capacity. Nothing has been walked when these are returned.
    /// Engine faults are reported as [`SearchOutcome::Failed`] on the handle.
    pub fn start(self) -> Result<SearchHandle, SearchError> {
        if self.threads == 0 {
            return Err(SearchError::InvalidThreadCount(0));
        }
        if self.capacity == 0 {
            return Err(SearchError::InvalidCapacity(0));
        }

        let filter = match self.extensions {
            Some(exts) => FileFilter::with_extensions(exts)?,
            None       => FileFilter::default(),
        };

        let roots: RootSet = self.roots.iter().collect();
        let request = SearchRequest::new(&self.keyword, roots)?;

        Ok(spawn(EngineOptions {
            request,
            filter,
            config: WalkConfig {
                threads:      self.threads,
                follow_links: self.follow_links,
            },
            on_complete: self.on_complete,
            capacity:    self.capacity,
        }))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Get the logical CPU count, with a safe fallback.
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
