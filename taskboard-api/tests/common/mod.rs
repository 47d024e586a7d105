//! Common test utilities for integration tests
//!
//! Builds the full router over an in-memory store and drives it with
//! `tower::Service::call`, so no database or socket is needed.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use std::sync::Arc;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::{ApiConfig, Config, DatabaseConfig, SessionConfig};
use taskboard_shared::store::memory::MemoryStore;
use tower::Service as _;

pub const PASSWORD: &str = "plum-Tree-42";

/// Test context containing the router and its store
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: axum::Router,
}

impl TestContext {
    /// Creates a new test context with an empty store
    pub fn new() -> Self {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://unused".to_string(),
                max_connections: 1,
            },
            session: SessionConfig::default(),
        };

        let store = Arc::new(MemoryStore::new());
        let app = build_router(AppState::new(store.clone(), config));

        TestContext { store, app }
    }

    /// Sends a request through the router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().call(request).await.unwrap()
    }

    /// `GET path`, optionally with a session cookie
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// `POST path` with a urlencoded form body
    pub async fn post_form(&self, path: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    /// Registers `username` and returns its `Cookie` header value
    pub async fn register(&self, username: &str) -> String {
        let form = format!(
            "username={}&password={}&password_confirm={}",
            username, PASSWORD, PASSWORD
        );
        let response = self.post_form("/register", &form, None).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("register should set a session cookie")
    }

    /// Creates a task through the form endpoint
    pub async fn create_task(&self, cookie: &str, form: &str) {
        let response = self.post_form("/task-create", form, Some(cookie)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }
}

/// `name=value` part of the response's `Set-Cookie` header
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}

/// Redirect target of the response
pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Parses the response body as JSON
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Titles in a task list page, in order
pub fn titles(page: &serde_json::Value) -> Vec<String> {
    page["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect()
}
