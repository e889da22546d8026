//! Integration tests for authentication middleware

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use folio_api::auth::{auth_middleware, AuthenticatedUser};
use tower::ServiceExt; // for `oneshot`

async fn whoami(
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "userId": user.user_id,
        "username": user.username,
    }))
}

fn create_test_app() -> Router {
    Router::new()
        .route("/protected", get(whoami))
        .layer(middleware::from_fn(auth_middleware))
}

async fn call(headers: &[(&str, &str)]) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().uri("/protected");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let response = create_test_app()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_folio_headers_pass() {
    let (status, json) = call(&[
        ("x-folio-user-id", "u-42"),
        ("x-folio-username", "alice"),
    ])
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["userId"], "u-42");
    assert_eq!(json["username"], "alice");
}

#[tokio::test]
async fn test_dev_headers_pass() {
    let (status, json) = call(&[("x-user-id", "u-7"), ("x-user", "bob")]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["userId"], "u-7");
    assert_eq!(json["username"], "bob");
}

#[tokio::test]
async fn test_folio_headers_take_precedence() {
    let (status, json) = call(&[
        ("x-folio-user-id", "u-1"),
        ("x-user-id", "u-2"),
        ("x-folio-username", "alice"),
        ("x-user", "bob"),
    ])
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["userId"], "u-1");
    assert_eq!(json["username"], "alice");
}

#[tokio::test]
async fn test_username_alone_doubles_as_id() {
    let (status, json) = call(&[("x-user", "carol")]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["userId"], "carol");
    assert_eq!(json["username"], "carol");
}

#[tokio::test]
async fn test_missing_headers_return_401() {
    let (status, _) = call(&[]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_header_returns_401() {
    let (status, _) = call(&[("x-user", "")]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
