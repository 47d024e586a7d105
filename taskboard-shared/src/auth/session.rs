/// Session tokens and request authentication
///
/// A session token is an opaque random string handed to the browser in the
/// session cookie. Only its SHA-256 hash is stored, so a leaked sessions
/// table cannot be replayed.
///
/// # Token Format
///
/// 43 base62 characters (~256 bits of entropy).
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::session::{generate_session_token, hash_session_token};
///
/// let (token, hash) = generate_session_token();
/// assert_eq!(token.len(), 43);
/// assert_eq!(hash, hash_session_token(&token));
/// ```

use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::models::session::{CreateSession, Session};
use crate::store::{SessionStore, StoreError, UserStore};

/// Length of a session token (characters)
pub const SESSION_TOKEN_LENGTH: usize = 43;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE_NAME: &str = "sessionid";

/// Default session lifetime: two weeks
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 14 * 24 * 60 * 60;

/// The authenticated caller of a request
///
/// Built from a valid session and passed explicitly into every task
/// operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user
    pub user_id: i64,

    /// Authenticated user's login name
    pub username: String,

    /// Session the request was authenticated with
    pub session_id: i64,
}

/// Generates a new session token
///
/// Returns `(plaintext_token, sha256_hex)`.
pub fn generate_session_token() -> (String, String) {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    let token: String = (0..SESSION_TOKEN_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    let hash = hash_session_token(&token);

    (token, hash)
}

/// Hashes a session token with SHA-256, hex encoded (64 chars)
pub fn hash_session_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Checks that a cookie value could be a session token
///
/// Lets obviously bogus cookies skip the database lookup.
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == SESSION_TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Opens a new session for `user_id`
///
/// Returns the plaintext token (for the cookie) and the stored session.
pub async fn open_session<S>(
    store: &S,
    user_id: i64,
    ttl: Duration,
) -> Result<(String, Session), StoreError>
where
    S: SessionStore + ?Sized,
{
    let (token, token_hash) = generate_session_token();

    let session = store
        .insert_session(CreateSession {
            user_id,
            token_hash,
            expires_at: Utc::now() + ttl,
        })
        .await?;

    debug!(user_id, session_id = session.id, "Session opened");
    Ok((token, session))
}

/// Resolves a session token to the caller it belongs to
///
/// Returns `None` for unknown tokens, expired sessions (which are deleted on
/// the spot), and sessions whose user no longer exists.
pub async fn authenticate<S>(store: &S, token: &str) -> Result<Option<AuthContext>, StoreError>
where
    S: SessionStore + UserStore + ?Sized,
{
    if !is_well_formed_token(token) {
        return Ok(None);
    }

    let Some(session) = store
        .find_session_by_token_hash(&hash_session_token(token))
        .await?
    else {
        return Ok(None);
    };

    if session.is_expired_at(Utc::now()) {
        debug!(session_id = session.id, "Session expired");
        store.delete_session(session.id).await?;
        return Ok(None);
    }

    let Some(user) = store.find_user_by_id(session.user_id).await? else {
        return Ok(None);
    };

    Ok(Some(AuthContext {
        user_id: user.id,
        username: user.username,
        session_id: session.id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::CreateUser;
    use crate::store::memory::MemoryStore;

    #[test]
    fn test_generate_session_token() {
        let (token, hash) = generate_session_token();

        assert_eq!(token.len(), SESSION_TOKEN_LENGTH);
        assert!(is_well_formed_token(&token));
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_session_token(&token));
    }

    #[test]
    fn test_tokens_are_unique() {
        let (a, _) = generate_session_token();
        let (b, _) = generate_session_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_is_well_formed_token() {
        assert!(!is_well_formed_token(""));
        assert!(!is_well_formed_token("short"));
        assert!(!is_well_formed_token(&"a".repeat(42)));
        assert!(!is_well_formed_token(&format!("{}!", "a".repeat(42))));
        assert!(is_well_formed_token(&"a".repeat(43)));
    }

    async fn store_with_user() -> (MemoryStore, i64) {
        let store = MemoryStore::new();
        let user = store
            .insert_user(CreateUser {
                username: "alice".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        (store, user.id)
    }

    #[tokio::test]
    async fn test_authenticate_valid_session() {
        let (store, user_id) = store_with_user().await;
        let (token, session) = open_session(&store, user_id, Duration::hours(1))
            .await
            .unwrap();

        let auth = authenticate(&store, &token).await.unwrap().unwrap();

        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.username, "alice");
        assert_eq!(auth.session_id, session.id);
    }

    #[tokio::test]
    async fn test_authenticate_unknown_token() {
        let (store, _) = store_with_user().await;
        let (token, _) = generate_session_token();

        assert!(authenticate(&store, &token).await.unwrap().is_none());
        assert!(authenticate(&store, "garbage").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authenticate_expired_session_is_removed() {
        let (store, user_id) = store_with_user().await;
        let (token, session) = open_session(&store, user_id, Duration::seconds(-1))
            .await
            .unwrap();

        assert!(authenticate(&store, &token).await.unwrap().is_none());
        assert!(!store.delete_session(session.id).await.unwrap());
    }
}
