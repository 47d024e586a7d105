//! # Taskboard Shared Library
//!
//! Domain types, persistence and business rules for the Taskboard to-do
//! service. The API crate is a thin HTTP layer over this one.
//!
//! ## Module Organization
//!
//! - `accounts`: Registration, login and logout
//! - `auth`: Password hashing, sessions and ownership checks
//! - `db`: Connection pool and migrations
//! - `models`: Database models and their queries
//! - `store`: Storage traits with PostgreSQL and in-memory backends
//! - `tasks`: Task repository and the per-user query layer
//! - `validation`: Form validation helpers

pub mod accounts;
pub mod auth;
pub mod db;
pub mod models;
pub mod store;
pub mod tasks;
pub mod validation;

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
