//! Client-side cache of lookup (reference) tables.
//!
//! Keeps small reference tables in sync with a remote backend while UI code
//! issues concurrent reads and writes:
//!
//! - [`store`]: action vocabulary, reducer, workers and the store actor
//! - [`api`]: the remote API seam and its HTTP client
//! - [`models`]: table keys, record ids and table snapshots
//! - [`config`], [`auth`]: configuration and keychain-held API tokens

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod store;

pub use api::{ApiClient, ApiError, LookupApi};
pub use config::Config;
pub use models::{Record, RecordId, TableKey, TableSnapshot};
pub use store::{Action, Channel, ChannelStatus, Dispatcher, LookupState, LookupStore, StoreError};
