/// Database models for Taskboard
///
/// Each model carries its own SQL as associated functions taking a `PgPool`.
/// Application code goes through the [`crate::store`] traits instead of
/// calling these directly.
///
/// # Models
///
/// - `user`: Registered accounts
/// - `task`: To-do items owned by a user
/// - `session`: Server-side login sessions

pub mod session;
pub mod task;
pub mod user;
