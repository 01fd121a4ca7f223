use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "lookupcache";

/// API bearer tokens in the OS keychain, one entry per username.
pub struct CredentialStore;

impl CredentialStore {
    fn entry(username: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, username).context("Failed to create keyring entry")
    }

    pub fn store_token(username: &str, token: &str) -> Result<()> {
        Self::entry(username)?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    /// The stored token, or `None` if this user has none.
    pub fn get_token(username: &str) -> Result<Option<String>> {
        match Self::entry(username)?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    /// Remove the user's token. Removing a token that is not there is fine.
    pub fn delete_token(username: &str) -> Result<()> {
        match Self::entry(username)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}
