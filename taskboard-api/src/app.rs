/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_api::{app::{build_router, AppState}, config::Config};
/// use taskboard_shared::store::memory::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{
        security::SecurityHeadersLayer,
        session::{load_session, require_session},
    },
    routes,
};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use std::sync::Arc;
use taskboard_shared::store::Store;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state
///
/// Cloned into each handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Users, tasks and sessions
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /health              GET          public
/// /login               GET, POST    public
/// /register            GET, POST    public
/// /logout              GET, POST    session
/// /                    GET          session
/// /task/:id            GET          session
/// /task-create         GET, POST    session
/// /task-update/:id     GET, POST    session, owner
/// /task-delete/:id     GET, POST    session, owner
/// ```
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Security headers
/// 2. Request tracing (tower-http TraceLayer)
/// 3. Session loading (every route)
/// 4. Session requirement (protected routes only, via `route_layer`)
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/login",
            get(routes::auth::login_page).post(routes::auth::login),
        )
        .route(
            "/register",
            get(routes::auth::register_page).post(routes::auth::register),
        );

    let protected_routes = Router::new()
        .route(
            "/logout",
            get(routes::auth::logout).post(routes::auth::logout),
        )
        .route("/", get(routes::tasks::list_tasks))
        .route("/task/:id", get(routes::tasks::task_detail))
        .route(
            "/task-create",
            get(routes::tasks::create_page).post(routes::tasks::create_task),
        )
        .route(
            "/task-update/:id",
            get(routes::tasks::update_page).post(routes::tasks::update_task),
        )
        .route(
            "/task-delete/:id",
            get(routes::tasks::delete_page).post(routes::tasks::delete_task),
        )
        .route_layer(from_fn(require_session));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(from_fn_with_state(state.clone(), load_session))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
