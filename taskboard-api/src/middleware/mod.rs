/// Middleware for the API server
///
/// - `session`: Session cookie loading and the login requirement
/// - `security`: Security response headers

pub mod security;
pub mod session;
