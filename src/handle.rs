use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;

use crate::event::{SearchEvent, SearchMessage};
use crate::results::SearchOutcome;

/// Shared, monotonic stop signal.
///
/// Cheap to clone; every clone observes the same flag. Once cancelled it
/// stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Control and output of one running search.
///
/// Returned immediately by [`SearchBuilder::start`](crate::SearchBuilder::start);
/// all walking happens on a background thread. Events arrive through
/// [`events()`](SearchHandle::events) or [`try_event()`](SearchHandle::try_event)
/// and the stream always ends with exactly one [`SearchOutcome`].
///
/// Events travel through a bounded buffer (see
/// [`SearchBuilder::channel_capacity`](crate::SearchBuilder::channel_capacity)).
/// When it is full the walkers wait, so a consumer that stops reading
/// without cancelling or dropping the handle stalls the search.
///
/// Dropping the handle cancels the search.
#[derive(Debug)]
pub struct SearchHandle {
    rx: Receiver<SearchMessage>,
    cancel: CancelToken,
    outcome: Option<SearchOutcome>,
}

impl SearchHandle {
    pub(crate) fn new(rx: Receiver<SearchMessage>, cancel: CancelToken) -> Self {
        Self {
            rx,
            cancel,
            outcome: None,
        }
    }

    /// Ask the walkers to stop. Idempotent, and a no-op after completion.
    ///
    /// Work already in flight (one line read, one directory listing) may
    /// still finish and deliver its events.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A clone of the token, for cancelling from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Blocking iterator over the remaining events.
    ///
    /// Ends when the search finishes; [`outcome()`](SearchHandle::outcome)
    /// is populated from then on. Not restartable: events already taken are
    /// gone.
    pub fn events(&mut self) -> Events<'_> {
        Events { handle: self }
    }

    /// Non-blocking poll, for consumers running their own update loop.
    ///
    /// `None` means nothing is ready right now, or the search is over; check
    /// [`outcome()`](SearchHandle::outcome) to tell the two apart.
    pub fn try_event(&mut self) -> Option<SearchEvent> {
        if self.outcome.is_some() {
            return None;
        }
        match self.rx.try_recv() {
            Ok(msg) => self.accept(msg),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.lost_sender();
                None
            }
        }
    }

    /// The terminal state, once the search has finished.
    pub fn outcome(&self) -> Option<&SearchOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Drain all remaining events and return the outcome.
    pub fn wait(mut self) -> SearchOutcome {
        self.events().for_each(drop);
        self.outcome
            .take()
            .unwrap_or_else(|| SearchOutcome::Failed("search ended without an outcome".into()))
    }

    fn recv_blocking(&mut self) -> Option<SearchEvent> {
        while self.outcome.is_none() {
            match self.rx.recv() {
                Ok(msg) => {
                    if let Some(event) = self.accept(msg) {
                        return Some(event);
                    }
                }
                Err(_) => self.lost_sender(),
            }
        }
        None
    }

    fn accept(&mut self, msg: SearchMessage) -> Option<SearchEvent> {
        match msg {
            SearchMessage::Event(event) => Some(event),
            SearchMessage::Finished(outcome) => {
                self.outcome = Some(outcome);
                None
            }
        }
    }

    // The background thread always sends `Finished` before exiting, so this
    // only happens if it died without unwinding through the coordinator.
    fn lost_sender(&mut self) {
        log::error!("search thread exited without reporting an outcome");
        self.outcome = Some(SearchOutcome::Failed(
            "search thread exited without reporting an outcome".into(),
        ));
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        if self.outcome.is_none() {
            self.cancel.cancel();
        }
    }
}

/// Iterator returned by [`SearchHandle::events`].
pub struct Events<'a> {
    handle: &'a mut SearchHandle,
}

impl Iterator for Events<'_> {
    type Item = SearchEvent;

    fn next(&mut self) -> Option<SearchEvent> {
        self.handle.recv_blocking()
    }
}
