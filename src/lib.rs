//! Client library for the Booky book discussion service.
//!
//! The crate centers on two collaborating pieces:
//!
//! - [`ApiClient`]: the single point of egress for backend calls. Its
//!   request hook attaches the bearer token and anti-forgery header; its
//!   response hook recovers from access-token expiry by refreshing the
//!   session once and replaying the failed request. Concurrent 401s
//!   collapse into one refresh call.
//! - [`SessionManager`](auth::SessionManager): sole owner of the in-memory
//!   [`Session`](auth::Session) - login, logout, cookie-backed refresh with
//!   a reentrancy guard, and persistence of the partial session through a
//!   [`SessionStore`](auth::SessionStore). Access tokens never touch disk.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{
    CredentialStore, FileSessionStore, MemorySessionStore, PersistedSession, Session,
    SessionManager, SessionStore,
};
pub use config::Config;
