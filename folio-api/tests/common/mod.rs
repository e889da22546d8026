//! Common test utilities and helpers for folio-api tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use folio_api::{create_app, AppState};
use folio_store::{SequentialIds, User, WorkspaceConfig};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

pub use folio_store::test_utils::create_test_db;

/// App state with predictable identifiers
pub fn create_test_state(pool: SqlitePool) -> AppState {
    AppState::with_ids(pool, Arc::new(SequentialIds::new("id")))
}

/// Fixture: a workspace owned by `user_id`, optionally with starter content
pub async fn fixture_workspace(state: &AppState, user_id: &str, default_content: bool) -> String {
    let user = User {
        id: user_id.to_string(),
        username: user_id.to_string(),
    };
    state
        .provisioner
        .create_workspace(
            &user,
            WorkspaceConfig {
                default_content,
                ..Default::default()
            },
        )
        .await
        .expect("Failed to create fixture workspace")
}

/// Fixture: the starter content piece of a workspace created with default content
pub async fn fixture_content_piece(state: &AppState, workspace_id: &str) -> String {
    state
        .provisioner
        .list_content_pieces(workspace_id)
        .await
        .expect("Failed to list content pieces")
        .remove(0)
        .id
}

/// Fixture: add `user_id` to a workspace with its viewer role
pub async fn fixture_viewer(state: &AppState, workspace_id: &str, user_id: &str) {
    let viewer = state
        .provisioner
        .list_roles(workspace_id)
        .await
        .expect("Failed to list roles")
        .into_iter()
        .find(|r| r.name == "Viewer")
        .expect("Workspace has no viewer role");

    sqlx::query(
        "INSERT INTO workspace_memberships (id, workspace_id, user_id, role_id) VALUES (?, ?, ?, ?)",
    )
    .bind(format!("membership-{}", user_id))
    .bind(workspace_id)
    .bind(user_id)
    .bind(&viewer.id)
    .execute(state.provisioner.pool())
    .await
    .expect("Failed to add viewer");
}

/// Helper to extract JSON body from axum response
pub async fn extract_json_body<T>(response: Response<Body>) -> T
where
    T: serde::de::DeserializeOwned,
{
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");

    serde_json::from_slice(&body).expect("Failed to deserialize JSON")
}

/// TestClient to encapsulate API interaction logic
pub struct TestClient {
    pub app: Router,
    pub state: AppState,
}

impl TestClient {
    /// Create a new TestClient with a new in-memory DB
    pub async fn new() -> Self {
        let state = create_test_state(create_test_db().await);
        Self {
            app: create_app(state.clone()),
            state,
        }
    }

    pub async fn send_request(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    fn builder(method: &str, uri: &str, user: Option<&str>) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match user {
            Some(user) => builder.header("x-user", user),
            None => builder,
        }
    }

    /// Post JSON to an endpoint, as `user` when given
    pub async fn post<T: serde::Serialize>(
        &self,
        uri: &str,
        body: &T,
        user: Option<&str>,
    ) -> Response<Body> {
        let req_body = serde_json::to_string(body).expect("Failed to serialize request body");
        let request = Self::builder("POST", uri, user)
            .header("content-type", "application/json")
            .body(Body::from(req_body))
            .unwrap();
        self.send_request(request).await
    }

    pub async fn get(&self, uri: &str, user: Option<&str>) -> Response<Body> {
        let request = Self::builder("GET", uri, user)
            .body(Body::empty())
            .unwrap();
        self.send_request(request).await
    }

    pub async fn delete(&self, uri: &str, user: Option<&str>) -> Response<Body> {
        let request = Self::builder("DELETE", uri, user)
            .body(Body::empty())
            .unwrap();
        self.send_request(request).await
    }
}
