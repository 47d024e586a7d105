/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and registration policy
/// - [`session`]: Session tokens, `AuthContext`, and request authentication
/// - [`authorization`]: Ownership checks for task mutations
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::session::generate_session_token;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let (token, token_hash) = generate_session_token();
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod password;
pub mod session;
