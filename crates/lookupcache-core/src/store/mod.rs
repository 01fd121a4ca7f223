//! Lookup cache store: actions, transitions and the workers between them.
//!
//! Data flow: UI code dispatches an intent action, the store applies it and
//! spawns a worker, the worker calls the remote API and dispatches a result
//! action, and the store applies that too.

pub mod action;
pub mod orchestrator;
pub mod runtime;
pub mod state;

pub use action::{Action, Channel};
pub use orchestrator::Job;
pub use runtime::{Dispatcher, LookupStore, StoreError};
pub use state::{reduce, ChannelStatus, LookupState};
