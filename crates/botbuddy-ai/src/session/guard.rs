//! Drop guards that keep the session state machine settled when a future
//! is cancelled mid-call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::Message;

use super::events::{EventBus, SessionEvent};
use super::state::{SessionError, SessionState, SessionStatus, SEND_FAILURE_NOTICE};

/// Lock the state, recovering it if a previous holder panicked.
pub(crate) fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds `pending = true` for the lifetime of one exchange.
///
/// Dropping the guard always clears `pending`. If it is dropped before
/// [`PendingGuard::settle`] ran (the submit future was cancelled or the
/// service panicked) the fallback notice is appended first, so the user
/// message still gets exactly one assistant reply.
pub(crate) struct PendingGuard<'a> {
    state: &'a Mutex<SessionState>,
    events: &'a EventBus,
    settled: bool,
}

impl<'a> PendingGuard<'a> {
    pub(crate) fn engage(state: &'a Mutex<SessionState>, events: &'a EventBus) -> Self {
        {
            let mut state = lock(state);
            state.pending = true;
            state.last_error = None;
        }
        events.publish(SessionEvent::PendingChanged(true));
        Self {
            state,
            events,
            settled: false,
        }
    }

    /// Append the assistant reply for this exchange and record its error, if any.
    pub(crate) fn settle(&mut self, reply: Message, error: Option<SessionError>) {
        {
            let mut state = lock(self.state);
            state.messages.push(reply.clone());
            state.last_error = error.clone();
        }
        self.settled = true;
        self.events.publish(SessionEvent::MessageAppended(reply));
        if let Some(error) = error {
            self.events.publish(SessionEvent::ErrorRaised(error));
        }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("exchange abandoned before a reply arrived");
            self.settle(
                Message::assistant(SEND_FAILURE_NOTICE),
                Some(SessionError::Send {
                    cause: "request cancelled before a reply arrived".into(),
                }),
            );
        }
        lock(self.state).pending = false;
        self.events.publish(SessionEvent::PendingChanged(false));
    }
}

/// Tracks one initialization attempt while `create_session` is awaited.
///
/// If the attempt is dropped before [`InitGuard::complete`] and no newer
/// attempt has started, the status leaves `Initializing`: `Ready` when a
/// previous handle is still in place, otherwise `Uninitialized`.
pub(crate) struct InitGuard<'a> {
    state: &'a Mutex<SessionState>,
    events: &'a EventBus,
    latest: &'a AtomicU64,
    attempt: u64,
    completed: bool,
}

impl<'a> InitGuard<'a> {
    pub(crate) fn arm(
        state: &'a Mutex<SessionState>,
        events: &'a EventBus,
        latest: &'a AtomicU64,
        attempt: u64,
    ) -> Self {
        Self {
            state,
            events,
            latest,
            attempt,
            completed: false,
        }
    }

    fn is_latest(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.attempt
    }

    /// Mark the attempt as finished. Returns whether it is still the
    /// latest one, i.e. whether its result may be stored.
    pub(crate) fn complete(mut self) -> bool {
        self.completed = true;
        self.is_latest()
    }
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        if self.completed || !self.is_latest() {
            return;
        }
        warn!("chat initialization abandoned before the service answered");
        let status = {
            let mut state = lock(self.state);
            state.status = if state.handle.is_some() {
                SessionStatus::Ready
            } else {
                SessionStatus::Uninitialized
            };
            state.status
        };
        self.events.publish(SessionEvent::StatusChanged(status));
    }
}
