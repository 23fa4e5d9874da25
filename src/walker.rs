//! Tree Walker: recursive traversal of the roots of one search.
//!
//! All roots are handed to a single `ignore` parallel walker, so each root is
//! traversed exactly once and worker threads share the load across roots.
//! Every worker owns its own traversal state; the only shared pieces are the
//! cancel token, the event channel and the counters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::fs;
use std::path::Path;
use std::sync::mpsc::SyncSender;
use std::sync::Arc;

use ignore::{DirEntry, WalkBuilder, WalkState};
use log::{debug, trace, warn};

use crate::event::{SearchEvent, SearchMessage};
use crate::filter::{EntryClass, FileFilter};
use crate::handle::CancelToken;
use crate::request::RootSet;
use crate::scanner::scan_file;

// ---------------------------------------------------------------------------
// WalkConfig
// ---------------------------------------------------------------------------

/// Traversal parameters passed from the builder to the walker.
#[derive(Debug, Clone)]
pub(crate) struct WalkConfig {
    pub threads:      usize,
    pub follow_links: bool,
}

/// Raw counts gathered during one walk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WalkTotals {
    pub files:       usize,
    pub dirs:        usize,
    pub matches:     usize,
    pub file_errors: usize,
}

#[derive(Default)]
struct Counters {
    files:       AtomicUsize,
    dirs:        AtomicUsize,
    matches:     AtomicUsize,
    file_errors: AtomicUsize,
}

// ---------------------------------------------------------------------------
// walk_roots()
// ---------------------------------------------------------------------------

/// Walk every root, scanning eligible files and sending their events to `tx`.
///
/// Blocks until the traversal is exhausted or `cancel` is observed. A send
/// failure means the consumer is gone and is treated as cancellation.
///
/// Directories that cannot be listed, missing roots and symlink loops are
/// skipped without an event. Linked directories are entered only when
/// `follow_links` is set.
pub(crate) fn walk_roots(
    roots:   &RootSet,
    keyword: &str,
    filter:  &FileFilter,
    config:  &WalkConfig,
    cancel:  &CancelToken,
    tx:      &SyncSender<SearchMessage>,
) -> WalkTotals {
    let mut paths = roots.iter();
    let Some(first) = paths.next() else {
        return WalkTotals::default();
    };

    let mut builder = WalkBuilder::new(first);
    for root in paths {
        builder.add(root);
    }
    builder
        .standard_filters(false)
        .ignore(false)
        .parents(false)
        .hidden(false)
        .follow_links(config.follow_links)
        .same_file_system(false)
        .threads(config.threads);

    let walker = builder.build_parallel();
    let counters = Arc::new(Counters::default());

    walker.run(|| {
        let keyword  = keyword.to_string();
        let filter   = filter.clone();
        let cancel   = cancel.clone();
        let tx       = tx.clone();
        let counters = Arc::clone(&counters);

        Box::new(move |res: Result<DirEntry, ignore::Error>| -> WalkState {
            // Checked before every directory listing and every file scan.
            if cancel.is_cancelled() {
                return WalkState::Quit;
            }

            let entry = match res {
                Ok(e) => e,
                Err(e) => {
                    log_walk_error(&e);
                    // A dangling link with an eligible name is still a file
                    // the user expects to hear about.
                    return match dangling_eligible_link(&e, &filter) {
                        Some(path) => {
                            counters.files.fetch_add(1, Ordering::Relaxed);
                            scan_path(path, &keyword, &cancel, &tx, &counters)
                        }
                        None => WalkState::Continue,
                    };
                }
            };

            let ft = match entry.file_type() {
                Some(ft) => ft,
                None     => return WalkState::Continue,
            };

            // A root that is not a directory has no children to search.
            if entry.depth() == 0 && !ft.is_dir() {
                debug!("root {} is not a directory, skipping", entry.path().display());
                return WalkState::Continue;
            }

            // Only seen when links are not followed: classify by target, but
            // a linked directory is not entered.
            let is_dir = ft.is_dir() || (ft.is_symlink() && target_is_dir(entry.path()));
            if is_dir && !ft.is_dir() {
                debug!("not following linked directory {}", entry.path().display());
                return WalkState::Continue;
            }

            match filter.classify(is_dir, entry.file_name()) {
                EntryClass::Directory => {
                    counters.dirs.fetch_add(1, Ordering::Relaxed);
                    WalkState::Continue
                }
                EntryClass::IgnoredFile => WalkState::Continue,
                EntryClass::EligibleFile => {
                    counters.files.fetch_add(1, Ordering::Relaxed);
                    scan_path(entry.path(), &keyword, &cancel, &tx, &counters)
                }
            }
        })
    });

    WalkTotals {
        files:       counters.files.load(Ordering::Relaxed),
        dirs:        counters.dirs.load(Ordering::Relaxed),
        matches:     counters.matches.load(Ordering::Relaxed),
        file_errors: counters.file_errors.load(Ordering::Relaxed),
    }
}

/// Scan one file and forward its events in line order.
fn scan_path(
    path:     &Path,
    keyword:  &str,
    cancel:   &CancelToken,
    tx:       &SyncSender<SearchMessage>,
    counters: &Counters,
) -> WalkState {
    trace!("scanning {}", path.display());

    for event in scan_file(path, keyword).with_cancel(cancel.clone()) {
        let counter = match &event {
            SearchEvent::Match(_) => &counters.matches,
            SearchEvent::FileError(e) => {
                warn!("error reading {}: {}", e.path.display(), e.message);
                &counters.file_errors
            }
        };

        if tx.send(SearchMessage::Event(event)).is_err() {
            debug!("event receiver dropped, stopping search");
            cancel.cancel();
            return WalkState::Quit;
        }
        counter.fetch_add(1, Ordering::Relaxed);
    }

    if cancel.is_cancelled() {
        WalkState::Quit
    } else {
        WalkState::Continue
    }
}

fn target_is_dir(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// The path of a below-root symlink whose target is missing, if its name
/// passes the filter.
fn dangling_eligible_link<'e>(err: &'e ignore::Error, filter: &FileFilter) -> Option<&'e Path> {
    let (depth, path) = error_location(err, None)?;
    if depth == Some(0) {
        return None;
    }
    let is_link = fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    if !is_link || fs::metadata(path).is_ok() {
        return None;
    }
    let name = path.file_name()?;
    (filter.classify(false, name) == EntryClass::EligibleFile).then_some(path)
}

fn error_location(err: &ignore::Error, depth: Option<usize>) -> Option<(Option<usize>, &Path)> {
    match err {
        ignore::Error::WithDepth { depth, err } => error_location(err, Some(*depth)),
        ignore::Error::WithPath { path, .. } => Some((depth, path.as_path())),
        _ => None,
    }
}

fn log_walk_error(err: &ignore::Error) {
    match err {
        ignore::Error::WithDepth { err, .. } => log_walk_error(err),
        ignore::Error::Loop { child, .. } => {
            debug!("skipping symlink loop at {}", child.display())
        }
        ignore::Error::WithPath { path, err } => {
            debug!("skipping unreadable {}: {}", path.display(), err)
        }
        other => debug!("skipping unreadable entry: {}", other),
    }
}
