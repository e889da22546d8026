//! Integration tests for the health and workspace endpoints

mod common;

use axum::http::StatusCode;
use common::TestClient;
use folio_store::Workspace;
use serde_json::{json, Value};

#[tokio::test]
async fn test_health_needs_no_auth() {
    let client = TestClient::new().await;

    let response = client.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = common::extract_json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "folio-api");

    let response = client.get("/health/ready", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = common::extract_json_body(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["watchedPieces"], 0);
}

#[tokio::test]
async fn test_readiness_fails_without_database() {
    let client = TestClient::new().await;
    client.state.provisioner.pool().close().await;

    let response = client.get("/health/ready", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = common::extract_json_body(response).await;
    assert_eq!(body["status"], "not_ready");

    // Liveness does not depend on the database
    let response = client.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_workspace_endpoint() {
    let client = TestClient::new().await;

    let response = client
        .post(
            "/api/v1/workspaces",
            &json!({ "name": "Docs", "defaultContent": true }),
            Some("alice"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = common::extract_json_body(response).await;
    let id = body["id"].as_str().expect("Response has no id").to_string();

    let workspace = client.state.provisioner.get_workspace(&id).await.unwrap();
    assert_eq!(workspace.name, "Docs");
    assert_eq!(workspace.content_groups.len(), 3);

    let memberships = client.state.provisioner.list_memberships(&id).await.unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].user_id, "alice");
}

#[tokio::test]
async fn test_create_workspace_with_empty_body_uses_defaults() {
    let client = TestClient::new().await;

    let response = client
        .post("/api/v1/workspaces", &json!({}), Some("alice"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = common::extract_json_body(response).await;

    let workspace = client
        .state
        .provisioner
        .get_workspace(body["id"].as_str().unwrap())
        .await
        .unwrap();
    assert_eq!(workspace.name, "alice's workspace");
    assert!(workspace.content_groups.is_empty());
}

#[tokio::test]
async fn test_create_workspace_without_auth_fails() {
    let client = TestClient::new().await;

    let response = client
        .post("/api/v1/workspaces", &json!({ "name": "Docs" }), None)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_workspaces_filters_by_membership() {
    let client = TestClient::new().await;
    let first = common::fixture_workspace(&client.state, "alice", false).await;
    let second = common::fixture_workspace(&client.state, "alice", true).await;
    common::fixture_workspace(&client.state, "bob", false).await;

    let response = client.get("/api/v1/workspaces", Some("alice")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let workspaces: Vec<Workspace> = common::extract_json_body(response).await;

    let mut ids: Vec<String> = workspaces.into_iter().map(|w| w.id).collect();
    ids.sort();
    let mut expected = vec![first, second];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_get_workspace_requires_membership() {
    let client = TestClient::new().await;
    let id = common::fixture_workspace(&client.state, "alice", false).await;
    let uri = format!("/api/v1/workspaces/{}", id);

    let response = client.get(&uri, Some("alice")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let workspace: Workspace = common::extract_json_body(response).await;
    assert_eq!(workspace.id, id);

    let response = client.get(&uri, Some("mallory")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = common::extract_json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("not a member"));
}

#[tokio::test]
async fn test_get_nonexistent_workspace() {
    let client = TestClient::new().await;

    let response = client
        .get("/api/v1/workspaces/nonexistent", Some("alice"))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_workspace_by_admin() {
    let client = TestClient::new().await;
    let id = common::fixture_workspace(&client.state, "alice", true).await;
    let uri = format!("/api/v1/workspaces/{}", id);

    let response = client.delete(&uri, Some("alice")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = common::extract_json_body(response).await;
    assert_eq!(body["message"], "Workspace deleted");

    let response = client.get(&uri, Some("alice")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(client
        .state
        .provisioner
        .list_content_pieces(&id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_delete_workspace_requires_manage_permission() {
    let client = TestClient::new().await;
    let id = common::fixture_workspace(&client.state, "alice", false).await;
    common::fixture_viewer(&client.state, &id, "bob").await;
    let uri = format!("/api/v1/workspaces/{}", id);

    let response = client.delete(&uri, Some("bob")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client.delete(&uri, Some("mallory")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Still there
    let response = client.get(&uri, Some("alice")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_nonexistent_workspace() {
    let client = TestClient::new().await;

    let response = client
        .delete("/api/v1/workspaces/nonexistent", Some("alice"))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
