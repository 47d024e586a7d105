/// Authentication endpoints
///
/// # Endpoints
///
/// - `GET  /login`    - Login form (redirects to `/` when signed in)
/// - `POST /login`    - Log in, set the session cookie, redirect to `/`
/// - `GET  /register` - Registration form (redirects to `/` when signed in)
/// - `POST /register` - Create an account, log it in, redirect to `/`
/// - `GET|POST /logout` - End the session, clear the cookie, redirect to `/login`
///
/// Forms are posted as `application/x-www-form-urlencoded`. Missing fields
/// come back as 422 field errors.

use crate::{
    app::AppState,
    error::{ApiResult, LOGIN_PATH},
    extract::ApiForm,
    middleware::session::{clear_session_cookie, session_cookie},
};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use serde::Serialize;
use taskboard_shared::{
    accounts::{self, Credentials, Registration, SessionGrant},
    auth::session::AuthContext,
};

/// Where signed-in users land
pub const HOME_PATH: &str = "/";

/// Describes a form page to the client
#[derive(Debug, Serialize)]
pub struct FormPage {
    /// Page name
    pub page: &'static str,

    /// Where the form posts to
    pub action: &'static str,

    /// Expected form fields
    pub fields: &'static [&'static str],
}

const LOGIN_PAGE: FormPage = FormPage {
    page: "login",
    action: "/login",
    fields: &["username", "password"],
};

const REGISTER_PAGE: FormPage = FormPage {
    page: "register",
    action: "/register",
    fields: &["username", "password", "password_confirm"],
};

/// Redirects to `/` carrying the new session cookie
fn signed_in(state: &AppState, grant: SessionGrant) -> ApiResult<Response> {
    let cookie = session_cookie(
        &grant.token,
        state.config.session.ttl_seconds,
        state.config.api.production,
    )?;

    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(HOME_PATH)).into_response())
}

/// Login form
pub async fn login_page(auth: Option<Extension<AuthContext>>) -> Response {
    if auth.is_some() {
        return Redirect::to(HOME_PATH).into_response();
    }

    Json(LOGIN_PAGE).into_response()
}

/// Log in
///
/// # Errors
///
/// - `400 Bad Request`: Body is not a URL-encoded form
/// - `401 Unauthorized`: Unknown username or wrong password
/// - `422 Unprocessable Entity`: Missing fields
pub async fn login(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    ApiForm(form): ApiForm<Credentials>,
) -> ApiResult<Response> {
    if auth.is_some() {
        return Ok(Redirect::to(HOME_PATH).into_response());
    }

    let grant = accounts::login(state.store.as_ref(), form, state.config.session.ttl()).await?;
    signed_in(&state, grant)
}

/// Registration form
pub async fn register_page(auth: Option<Extension<AuthContext>>) -> Response {
    if auth.is_some() {
        return Redirect::to(HOME_PATH).into_response();
    }

    Json(REGISTER_PAGE).into_response()
}

/// Register and log in
///
/// # Errors
///
/// - `409 Conflict`: Username taken
/// - `422 Unprocessable Entity`: Bad username, mismatched passwords, or a
///   password that fails the policy
pub async fn register(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    ApiForm(form): ApiForm<Registration>,
) -> ApiResult<Response> {
    if auth.is_some() {
        return Ok(Redirect::to(HOME_PATH).into_response());
    }

    let grant = accounts::register(state.store.as_ref(), form, state.config.session.ttl()).await?;
    signed_in(&state, grant)
}

/// Log out
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Response> {
    accounts::logout(state.store.as_ref(), &auth).await?;

    let cookie = clear_session_cookie(state.config.api.production);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(LOGIN_PATH)).into_response())
}
