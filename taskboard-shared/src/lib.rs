//! # Taskboard Shared Library
//!
//! This crate contains the data access layer and identity client used by the
//! Taskboard web server.
//!
//! ## Module Organization
//!
//! - `error`: `RemoteError`, the single error kind surfaced by backend calls
//! - `models`: Table identifiers, typed records and their DTOs
//! - `remote`: Raw table transports (PostgREST and in-memory)
//! - `cache`: Per-table read cache with invalidation
//! - `database`: Typed repositories combining a transport with the cache
//! - `auth`: Identity providers (GoTrue and in-memory) and sessions

pub mod auth;
pub mod cache;
pub mod database;
pub mod error;
pub mod models;
pub mod remote;

pub use database::{DataError, Database, Repository};
pub use error::{RemoteError, RemoteResult};
pub use models::Table;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
