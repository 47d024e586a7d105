/// Session cookie middleware
///
/// Two layers make up the auth gate:
///
/// - [`load_session`] runs on every request. If the `sessionid` cookie maps
///   to a live session it inserts an [`AuthContext`] into the request
///   extensions. A cookie that maps to nothing is cleared on the response.
/// - [`require_session`] is added with `route_layer` on protected routes and
///   redirects to `/login` when no `AuthContext` was loaded.
///
/// Handlers then take `Extension<AuthContext>` (protected routes) or
/// `Option<Extension<AuthContext>>` (public routes).

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use taskboard_shared::auth::session::{authenticate, AuthContext, SESSION_COOKIE_NAME};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Reads the session token from the `Cookie` header(s)
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
}

/// `Set-Cookie` value carrying a new session token
pub fn session_cookie(token: &str, max_age_seconds: i64, secure: bool) -> ApiResult<HeaderValue> {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE_NAME, token, max_age_seconds
    );
    if secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::InternalError(format!("Invalid session cookie: {}", e)))
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("sessionid=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0; Secure")
    } else {
        HeaderValue::from_static("sessionid=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
    }
}

/// Resolves the session cookie into an `AuthContext` request extension
pub async fn load_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = session_token(req.headers()).map(str::to_owned);
    let mut stale = false;

    if let Some(token) = token {
        let auth = authenticate(state.store.as_ref(), &token).await?;
        match auth {
            Some(auth) => {
                tracing::debug!(user_id = auth.user_id, session_id = auth.session_id, "Session loaded");
                req.extensions_mut().insert(auth);
            }
            None => {
                tracing::debug!("Clearing unknown or expired session cookie");
                stale = true;
            }
        }
    }

    let mut response = next.run(req).await;

    // Login and register set a fresh cookie of their own
    if stale && !response.headers().contains_key(header::SET_COOKIE) {
        response.headers_mut().insert(
            header::SET_COOKIE,
            clear_session_cookie(state.config.api.production),
        );
    }

    Ok(response)
}

/// Rejects requests without a session, redirecting them to `/login`
pub async fn require_session(req: Request, next: Next) -> ApiResult<Response> {
    if req.extensions().get::<AuthContext>().is_none() {
        tracing::debug!(path = %req.uri().path(), "Unauthenticated request redirected to login");
        return Err(ApiError::Unauthenticated);
    }

    Ok(next.run(req).await)
}
