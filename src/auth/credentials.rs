use anyhow::{Context, Result};
use keyring::Entry;

/// Default keychain service name
const DEFAULT_SERVICE: &str = "booky";

/// OS-keychain storage for the remember-me password, keyed by email.
///
/// Only the password lives here; session state goes through `SessionStore`
/// and the access token is never stored anywhere durable.
pub struct CredentialStore {
    service: String,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE)
    }
}

impl CredentialStore {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, email: &str) -> Result<Entry> {
        Entry::new(&self.service, email).context("Failed to create keyring entry")
    }

    /// Store the password for an email in the OS keychain
    pub fn store(&self, email: &str, password: &str) -> Result<()> {
        self.entry(email)?
            .set_password(password)
            .context("Failed to store password in keychain")
    }

    /// Retrieve the stored password for an email
    pub fn get_password(&self, email: &str) -> Result<String> {
        self.entry(email)?
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Delete the stored password for an email
    pub fn delete(&self, email: &str) -> Result<()> {
        self.entry(email)?
            .delete_credential()
            .context("Failed to delete credential from keychain")
    }

    /// Check whether a password is stored for an email
    pub fn has_credentials(&self, email: &str) -> bool {
        self.entry(email)
            .map(|entry| entry.get_password().is_ok())
            .unwrap_or(false)
    }
}
