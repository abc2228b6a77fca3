//! REST API client module for the Booky backend.
//!
//! This module provides the `ApiClient` for communicating with the book
//! and discussion-thread endpoints.
//!
//! Every outbound request passes through the client's request hook (bearer
//! token and anti-forgery header attachment) and every response through its
//! response hook, which transparently recovers from access-token expiry by
//! refreshing the session once and replaying the request.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
