use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use log::{debug, error};

use crate::error::SearchError;
use crate::event::SearchMessage;
use crate::filter::FileFilter;
use crate::handle::{CancelToken, SearchHandle};
use crate::request::SearchRequest;
use crate::results::{ScanStats, SearchOutcome, SearchSummary};
use crate::walker::{walk_roots, WalkConfig};

/// Callback fired once with the terminal outcome.
pub(crate) type CompletionCallback = Box<dyn FnOnce(&SearchOutcome) + Send + 'static>;

// ---------------------------------------------------------------------------
// Engine options
// ---------------------------------------------------------------------------

/// Internal options passed from the builder to `spawn()`.
pub(crate) struct EngineOptions {
    pub request:     SearchRequest,
    pub filter:      FileFilter,
    pub config:      WalkConfig,
    pub on_complete: Option<CompletionCallback>,
    /// Events buffered before walkers wait for the consumer. At least 1.
    pub capacity:    usize,
}

// ---------------------------------------------------------------------------
// spawn()
// ---------------------------------------------------------------------------

/// Start a search on a background thread and return its handle at once.
///
/// Called by `SearchBuilder::start()` after validating inputs. The handle's
/// stream always ends with exactly one outcome, including when the thread
/// cannot be started at all.
pub(crate) fn spawn(opts: EngineOptions) -> SearchHandle {
    let (tx, rx) = mpsc::sync_channel(opts.capacity);
    let cancel = CancelToken::new();
    let handle = SearchHandle::new(rx, cancel.clone());

    let finisher = Finisher::new(tx.clone(), opts.on_complete);
    let request = opts.request;
    let filter = opts.filter;
    let config = opts.config;

    let spawned = thread::Builder::new()
        .name("foldersearch".into())
        .spawn({
            let finisher = finisher.clone_handle();
            move || {
                let outcome = run(&request, &filter, &config, &cancel, &tx);
                finisher.finish(outcome);
            }
        });

    if let Err(e) = spawned {
        let err = SearchError::Spawn(e.to_string());
        error!("{err}");
        finisher.finish(SearchOutcome::Failed(err.to_string()));
    }

    handle
}

// ---------------------------------------------------------------------------
// run()
// ---------------------------------------------------------------------------

/// Walk all roots and decide the outcome. Runs on the search thread.
fn run(
    request: &SearchRequest,
    filter:  &FileFilter,
    config:  &WalkConfig,
    cancel:  &CancelToken,
    tx:      &SyncSender<SearchMessage>,
) -> SearchOutcome {
    debug!(
        "searching {} root(s) for {:?} with {} thread(s)",
        request.roots().len(),
        request.keyword(),
        config.threads
    );
    let start = Instant::now();

    let walked = panic::catch_unwind(AssertUnwindSafe(|| {
        walk_roots(request.roots(), request.keyword(), filter, config, cancel, tx)
    }));

    match walked {
        Ok(totals) => {
            let summary = SearchSummary {
                matches:     totals.matches,
                file_errors: totals.file_errors,
                cancelled:   cancel.is_cancelled(),
                stats:       ScanStats::compute(totals.files, totals.dirs, start.elapsed()),
            };
            debug!(
                "search for {:?} finished: {} match(es), {} file error(s), {} file(s) in {:.3}s{}",
                request.keyword(),
                summary.matches,
                summary.file_errors,
                summary.stats.files,
                summary.stats.duration.as_secs_f64(),
                if summary.cancelled { " (cancelled)" } else { "" }
            );
            SearchOutcome::Completed(summary)
        }
        Err(payload) => {
            let reason = format!("search worker panicked: {}", panic_message(&*payload));
            error!("{reason}");
            SearchOutcome::Failed(reason)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

// ---------------------------------------------------------------------------
// Finisher
// ---------------------------------------------------------------------------

/// Delivers the outcome exactly once: callback first, then the terminal
/// message on the channel.
struct Finisher {
    tx:          SyncSender<SearchMessage>,
    on_complete: Arc<Mutex<Option<CompletionCallback>>>,
}

impl Finisher {
    fn new(tx: SyncSender<SearchMessage>, on_complete: Option<CompletionCallback>) -> Self {
        Self {
            tx,
            on_complete: Arc::new(Mutex::new(on_complete)),
        }
    }

    fn clone_handle(&self) -> Self {
        Self {
            tx:          self.tx.clone(),
            on_complete: Arc::clone(&self.on_complete),
        }
    }

    fn finish(self, outcome: SearchOutcome) {
        let callback = match self.on_complete.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(callback) = callback {
            callback(&outcome);
        }
        // The receiver may already be gone; nobody is left to tell.
        let _ = self.tx.send(SearchMessage::Finished(outcome));
    }
}
