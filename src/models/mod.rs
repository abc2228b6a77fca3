//! Data models for Booky entities.
//!
//! This module contains the data structures used to represent
//! backend data including:
//!
//! - `UserProfile`: the authenticated user's account record
//! - `Book`, `Category`: the book catalog
//! - `Thread`, `NewThread`, `ThreadUpdate`, `LikeStatus`: discussion threads

pub mod book;
pub mod thread;
pub mod user;

pub use book::{Book, Category};
pub use thread::{LikeStatus, NewThread, Thread, ThreadUpdate};
pub use user::UserProfile;
