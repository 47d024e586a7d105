/// Integration tests for registration, login, logout and the session gate

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{body_json, location, session_cookie, TestContext, PASSWORD};

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();

    let response = ctx.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"], "connected");
}

#[tokio::test]
async fn test_protected_routes_redirect_to_login() {
    let ctx = TestContext::new();

    for path in [
        "/",
        "/task/1",
        "/task-create",
        "/task-update/1",
        "/task-delete/1",
        "/logout",
    ] {
        let response = ctx.get(path, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "GET {}", path);
        assert_eq!(location(&response), "/login", "GET {}", path);
    }

    for path in ["/task-create", "/task-update/1", "/task-delete/1"] {
        let response = ctx.post_form(path, "title=Sneaky", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "POST {}", path);
        assert_eq!(location(&response), "/login", "POST {}", path);
    }
}

#[tokio::test]
async fn test_unknown_session_cookie_redirects_to_login() {
    let ctx = TestContext::new();
    let bogus = format!("sessionid={}", "x".repeat(43));

    let response = ctx.get("/", Some(&bogus)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.starts_with("sessionid=;"));
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_stale_cookie_cleared_after_logout() {
    let ctx = TestContext::new();
    let cookie = ctx.register("alice").await;
    ctx.post_form("/logout", "", Some(&cookie)).await;

    let response = ctx.get("/login", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    // Logging in over a stale cookie replaces it rather than clearing it
    let response = ctx
        .post_form("/login", &format!("username=alice&password={}", PASSWORD), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let fresh = session_cookie(&response).unwrap();
    assert_ne!(fresh, "sessionid=");
    assert_eq!(ctx.get("/", Some(&fresh)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_valid_session_keeps_cookie() {
    let ctx = TestContext::new();
    let cookie = ctx.register("alice").await;

    let response = ctx.get("/", Some(&cookie)).await;
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_and_register_pages() {
    let ctx = TestContext::new();

    let response = ctx.get("/login", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["page"], "login");

    let response = ctx.get("/register", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["page"], "register");
    assert_eq!(json["fields"][2], "password_confirm");
}

#[tokio::test]
async fn test_register_sets_session_cookie() {
    let ctx = TestContext::new();
    let form = format!(
        "username=alice&password={}&password_confirm={}",
        PASSWORD, PASSWORD
    );

    let response = ctx.post_form("/register", &form, None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("sessionid="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Max-Age=1209600"));
    assert!(!set_cookie.contains("Secure"));

    let cookie = session_cookie(&response).unwrap();
    let response = ctx.get("/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["username"], "alice");
    assert_eq!(json["incomplete_count"], 0);
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let ctx = TestContext::new();
    ctx.register("alice").await;

    let form = format!(
        "username=alice&password={}&password_confirm={}",
        PASSWORD, PASSWORD
    );
    let response = ctx.post_form("/register", &form, None).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "conflict");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let ctx = TestContext::new();

    let response = ctx
        .post_form(
            "/register",
            "username=alice&password=plum-Tree-42&password_confirm=plum-Tree-43",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["details"][0]["field"], "password_confirm");

    let response = ctx
        .post_form("/register", "username=bob&password=123&password_confirm=123", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["details"][0]["field"], "password");

    // Nothing was created
    let response = ctx
        .post_form("/login", &format!("username=alice&password={}", PASSWORD), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_form_fields_are_validation_errors() {
    let ctx = TestContext::new();

    let response = ctx.post_form("/login", "username=alice", None).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "validation_error");
    assert_eq!(json["details"][0]["field"], "password");

    let form = format!("username=alice&password={}", PASSWORD);
    let response = ctx.post_form("/register", &form, None).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["details"][0]["field"], "password_confirm");

    let response = ctx.post_form("/login", "", None).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["details"][0]["field"], "password");
    assert_eq!(json["details"][1]["field"], "username");
}

#[tokio::test]
async fn test_non_form_body_is_json_bad_request() {
    let ctx = TestContext::new();
    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"username":"alice"}"#))
        .unwrap();

    let response = ctx.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_login_flow() {
    let ctx = TestContext::new();
    ctx.register("alice").await;

    let response = ctx
        .post_form("/login", "username=alice&password=wrong-password-1", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let response = ctx
        .post_form("/login", "username=nobody&password=wrong-password-1", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .post_form("/login", &format!("username=alice&password={}", PASSWORD), None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let cookie = session_cookie(&response).unwrap();
    let response = ctx.get("/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signed_in_user_skips_login_and_register() {
    let ctx = TestContext::new();
    let cookie = ctx.register("alice").await;

    for path in ["/login", "/register"] {
        let response = ctx.get(path, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "GET {}", path);
        assert_eq!(location(&response), "/", "GET {}", path);
    }

    let response = ctx
        .post_form("/login", "username=alice&password=anything", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let ctx = TestContext::new();
    let cookie = ctx.register("alice").await;

    let response = ctx.post_form("/logout", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.starts_with("sessionid=;"));
    assert!(cleared.contains("Max-Age=0"));

    let response = ctx.get("/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_logout_via_get() {
    let ctx = TestContext::new();
    let cookie = ctx.register("alice").await;

    let response = ctx.get("/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = ctx.get("/", Some(&cookie)).await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_security_headers_on_responses() {
    let ctx = TestContext::new();

    let response = ctx.get("/login", None).await;

    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
}
