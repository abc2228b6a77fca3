use serde::{Deserialize, Serialize};

use crate::models::UserProfile;

/// In-memory authentication state for the current client.
///
/// Owned and mutated exclusively by `SessionManager`; everyone else reads
/// snapshots. `reset` returns every field to its empty default, so
/// `Session::default()` is the Anonymous state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Short-lived bearer token. Memory only, never written to disk.
    pub access_token: Option<String>,
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub last_error: Option<String>,
    /// Anti-forgery token captured from the `csrftoken` cookie, echoed as
    /// `X-CSRFToken` on mutating requests.
    pub csrf_token: Option<String>,
}

impl Session {
    /// Clear every field back to the Anonymous state. Idempotent.
    pub fn reset(&mut self) {
        *self = Session::default();
    }
}

/// The durable subset of the session, written through a `SessionStore`.
///
/// Deliberately excludes the access token: rehydration goes through the
/// cookie-backed refresh endpoint instead of trusting a stored token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub remember_me: bool,
}
