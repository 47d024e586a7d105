/// Registration, login and logout
///
/// Successful registration and login both end with a fresh session; the
/// caller gets back the plaintext session token to put in a cookie.
///
/// # Example
///
/// ```no_run
/// use chrono::Duration;
/// use taskboard_shared::accounts::{login, register, Credentials, Registration};
/// use taskboard_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
///
/// register(&store, Registration {
///     username: "alice".to_string(),
///     password: "plum-Tree-42".to_string(),
///     password_confirm: "plum-Tree-42".to_string(),
/// }, Duration::days(14)).await?;
///
/// let grant = login(&store, Credentials {
///     username: "alice".to_string(),
///     password: "plum-Tree-42".to_string(),
/// }, Duration::days(14)).await?;
/// println!("session cookie: {}", grant.token);
/// # Ok(())
/// # }
/// ```

use chrono::Duration;
use serde::Deserialize;
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use crate::auth::password::{self, PasswordError};
use crate::auth::session::{open_session, AuthContext};
use crate::models::{session::Session, user::CreateUser, user::User};
use crate::store::{SessionStore, StoreError, UserStore};
use crate::validation::{field_errors, FieldError};

/// Error type for account operations
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Username is already registered
    #[error("A user with username '{0}' already exists")]
    DuplicateUser(String),

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Submitted form is invalid
    #[error("Invalid form: {} errors", .0.len())]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Login form
///
/// Missing fields deserialize as empty strings and fail validation.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct Credentials {
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,

    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
}

/// Registration form
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct Registration {
    #[validate(custom(function = "validate_username"))]
    pub username: String,

    pub password: String,

    /// Must repeat `password`
    pub password_confirm: String,
}

/// A newly opened session and its owner
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub user: User,

    /// Plaintext token for the session cookie
    pub token: String,

    pub session: Session,
}

/// Usernames: 1-150 characters of letters, digits and `@ . + - _`
fn validate_username(username: &str) -> Result<(), ValidationError> {
    let message = if username.is_empty() {
        "This field is required."
    } else if username.chars().count() > 150 {
        "Ensure this value has at most 150 characters."
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
    } else {
        return Ok(());
    };

    let mut error = ValidationError::new("username");
    error.message = Some(message.into());
    Err(error)
}

/// Creates an account and logs it in
///
/// # Errors
///
/// - [`AccountError::Validation`] for a bad username, mismatched
///   confirmation, or a password that fails the policy
/// - [`AccountError::DuplicateUser`] if the username is taken
pub async fn register<S>(
    store: &S,
    form: Registration,
    session_ttl: Duration,
) -> Result<SessionGrant, AccountError>
where
    S: UserStore + SessionStore + ?Sized,
{
    let mut errors = match form.validate() {
        Ok(()) => Vec::new(),
        Err(e) => field_errors(&e),
    };

    if form.password != form.password_confirm {
        errors.push(FieldError::new(
            "password_confirm",
            "The two password fields didn't match.",
        ));
    } else if let Err(problems) = password::validate_password_policy(&form.password, &form.username)
    {
        errors.extend(
            problems
                .into_iter()
                .map(|message| FieldError::new("password", message)),
        );
    }

    if !errors.is_empty() {
        return Err(AccountError::Validation(errors));
    }

    if store.find_user_by_username(&form.username).await?.is_some() {
        return Err(AccountError::DuplicateUser(form.username));
    }

    let password_hash = password::hash_password(&form.password)?;

    let user = store
        .insert_user(CreateUser {
            username: form.username.clone(),
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => AccountError::DuplicateUser(form.username.clone()),
            other => AccountError::Store(other),
        })?;

    info!(user_id = user.id, username = %user.username, "User registered");

    let (token, session) = open_session(store, user.id, session_ttl).await?;
    store.touch_last_login(user.id).await?;
    purge_expired_sessions(store).await?;

    Ok(SessionGrant { user, token, session })
}

/// Verifies credentials and opens a session
///
/// Unknown usernames and wrong passwords fail identically with
/// [`AccountError::InvalidCredentials`]. Expired sessions of all users are
/// purged on success.
pub async fn login<S>(
    store: &S,
    form: Credentials,
    session_ttl: Duration,
) -> Result<SessionGrant, AccountError>
where
    S: UserStore + SessionStore + ?Sized,
{
    form.validate()
        .map_err(|e| AccountError::Validation(field_errors(&e)))?;

    // No stored username contains NUL, and PostgreSQL rejects it in a bind
    if form.username.contains('\0') {
        warn!("Login failed: username contains NUL");
        return Err(AccountError::InvalidCredentials);
    }

    let Some(user) = store.find_user_by_username(&form.username).await? else {
        warn!(username = %form.username, "Login failed: unknown user");
        return Err(AccountError::InvalidCredentials);
    };

    if !password::verify_password(&form.password, &user.password_hash)? {
        warn!(user_id = user.id, "Login failed: wrong password");
        return Err(AccountError::InvalidCredentials);
    }

    let (token, session) = open_session(store, user.id, session_ttl).await?;
    store.touch_last_login(user.id).await?;
    purge_expired_sessions(store).await?;

    info!(user_id = user.id, session_id = session.id, "User logged in");
    Ok(SessionGrant { user, token, session })
}

/// Ends the caller's session
pub async fn logout<S>(store: &S, caller: &AuthContext) -> Result<(), AccountError>
where
    S: SessionStore + ?Sized,
{
    store.delete_session(caller.session_id).await?;

    info!(user_id = caller.user_id, session_id = caller.session_id, "User logged out");
    Ok(())
}

/// Removes expired sessions, returning how many were removed
pub async fn purge_expired_sessions<S>(store: &S) -> Result<u64, StoreError>
where
    S: SessionStore + ?Sized,
{
    let removed = store.delete_expired_sessions(chrono::Utc::now()).await?;

    if removed > 0 {
        info!(removed, "Purged expired sessions");
    }
    Ok(removed)
}
