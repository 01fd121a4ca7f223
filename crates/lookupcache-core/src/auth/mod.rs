//! Credential storage for the lookup API's bearer token.
//!
//! Tokens are kept in the OS keychain via `keyring`, keyed by username.
//! Obtaining a token (login) happens outside this crate.

pub mod credentials;

pub use credentials::CredentialStore;
