use crate::{
    auth::{check_workspace_member, check_workspace_permission, AuthenticatedUser},
    error::ApiResult,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use folio_store::{Permission, Workspace, WorkspaceConfig};
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/workspaces",
            get(list_workspaces).post(create_workspace),
        )
        .route(
            "/api/v1/workspaces/{id}",
            get(get_workspace).delete(delete_workspace),
        )
}

async fn create_workspace(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(config): Json<WorkspaceConfig>,
) -> ApiResult<Json<Value>> {
    let id = state
        .provisioner
        .create_workspace(&user.as_user(), config)
        .await?;

    Ok(Json(json!({ "id": id })))
}

async fn list_workspaces(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Vec<Workspace>>> {
    let workspaces = state
        .provisioner
        .list_user_workspaces(&user.user_id)
        .await?;

    Ok(Json(workspaces))
}

async fn get_workspace(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Workspace>> {
    check_workspace_member(&state.provisioner, &id, &user).await?;

    let workspace = state.provisioner.get_workspace(&id).await?;

    Ok(Json(workspace))
}

async fn delete_workspace(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    check_workspace_permission(&state.provisioner, &id, &user, Permission::ManageWorkspace)
        .await?;

    state.provisioner.delete_workspace(&id).await?;

    Ok(Json(json!({ "message": "Workspace deleted" })))
}
