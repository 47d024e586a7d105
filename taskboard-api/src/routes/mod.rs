/// Route handlers, by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login, registration and logout
/// - `tasks`: Task list, detail, create, update and delete

pub mod auth;
pub mod health;
pub mod tasks;
