//! Chat session management.
//!
//! A `SessionController` owns one chat's `SessionState` (transcript,
//! pending flag, last error, remote handle) and is the only writer of it.

mod controller;
mod events;
mod guard;
mod handle;
mod state;


pub use controller::SessionController;
pub use events::{EventBus, SessionEvent};
pub use handle::SessionHandle;
pub use state::{
    SessionError, SessionState, SessionStatus, SubmitOutcome, NOT_INITIALIZED_NOTICE,
    SEND_FAILURE_NOTICE,
};
