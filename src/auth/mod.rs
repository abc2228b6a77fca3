//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `Session`: the in-memory authentication state
//! - `SessionManager`: sole owner of session mutation (login, logout,
//!   refresh with single-flight coordination, persistence)
//! - `SessionStore`: the persistence seam for the partial session
//! - `CredentialStore`: OS-keychain storage for remember-me credentials
//!
//! Access tokens live in memory only; rehydration after a restart goes
//! through the cookie-backed refresh endpoint.

pub mod credentials;
pub mod manager;
mod refresh;
pub mod session;
pub mod store;

pub use credentials::CredentialStore;
pub use manager::SessionManager;
pub use session::{PersistedSession, Session};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};

/// Backend authentication endpoints (collaborator contract)
pub const LOGIN_PATH: &str = "/auth/login/";
pub const LOGOUT_PATH: &str = "/auth/logout/";
pub const REFRESH_PATH: &str = "/auth/refresh/";
pub const REGISTER_PATH: &str = "/auth/registration/";

/// Anti-forgery cookie name and the header it is echoed on
pub(crate) const CSRF_COOKIE: &str = "csrftoken";
pub(crate) const CSRF_HEADER: &str = "X-CSRFToken";
