use crate::{
    auth::{check_workspace_member, AuthenticatedUser},
    error::{ApiError, ApiResult},
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use folio_store::{Comment, CommentThread, Permission, Subscription, ThreadChange};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/content-pieces/{id}/threads",
            get(list_threads).post(create_thread),
        )
        .route(
            "/api/v1/content-pieces/{id}/threads/changes",
            get(thread_changes),
        )
        .route("/api/v1/threads/{id}", delete(delete_thread))
        .route("/api/v1/threads/{id}/comments", post(create_comment))
        .route("/api/v1/threads/{id}/resolve", post(resolve_thread))
}

#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    pub fragment: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

async fn list_threads(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(content_piece_id): Path<String>,
) -> ApiResult<Json<Vec<CommentThread>>> {
    let workspace_id = state
        .comments
        .content_piece_workspace(&content_piece_id)
        .await?;
    check_workspace_member(&state.provisioner, &workspace_id, &user).await?;

    let threads = state.comments.list_threads(&content_piece_id).await?;

    Ok(Json(threads))
}

async fn create_thread(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(content_piece_id): Path<String>,
    Json(req): Json<CreateThreadRequest>,
) -> ApiResult<Json<CommentThread>> {
    let workspace_id = state
        .comments
        .content_piece_workspace(&content_piece_id)
        .await?;
    check_workspace_member(&state.provisioner, &workspace_id, &user).await?;

    let thread = state
        .comments
        .create_thread(&user.user_id, &content_piece_id, &req.fragment, &req.content)
        .await?;

    Ok(Json(thread))
}

async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(thread_id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    let thread = state.comments.get_thread(&thread_id).await?;
    check_workspace_member(&state.provisioner, &thread.workspace_id, &user).await?;

    let comment = state
        .comments
        .create_comment(&user.user_id, &thread_id, &req.content)
        .await?;

    Ok(Json(comment))
}

async fn resolve_thread(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Value>> {
    check_thread_moderator(&state, &thread_id, &user).await?;

    state.comments.resolve_thread(&thread_id).await?;

    Ok(Json(json!({ "message": "Thread resolved" })))
}

async fn delete_thread(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Value>> {
    check_thread_moderator(&state, &thread_id, &user).await?;

    state.comments.delete_thread(&thread_id).await?;

    Ok(Json(json!({ "message": "Thread deleted" })))
}

/// Resolving or deleting a thread is open to its author and to members who
/// can edit content.
async fn check_thread_moderator(
    state: &AppState,
    thread_id: &str,
    user: &AuthenticatedUser,
) -> ApiResult<()> {
    let thread = state.comments.get_thread(thread_id).await?;
    let permissions =
        check_workspace_member(&state.provisioner, &thread.workspace_id, user).await?;

    let is_author = thread
        .first_comment
        .as_ref()
        .is_some_and(|c| c.user_id == user.user_id);

    if !is_author && !permissions.contains(&Permission::EditContent) {
        return Err(ApiError::Forbidden(format!(
            "Access denied: only the author or an editor can close thread {}",
            thread_id
        )));
    }

    Ok(())
}

async fn thread_changes(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(content_piece_id): Path<String>,
) -> ApiResult<Response> {
    let workspace_id = state
        .comments
        .content_piece_workspace(&content_piece_id)
        .await?;
    check_workspace_member(&state.provisioner, &workspace_id, &user).await?;

    let changes = state.comments.subscribe(&content_piece_id);

    Ok(ws.on_upgrade(move |socket| stream_changes(socket, changes, content_piece_id)))
}

async fn stream_changes(
    socket: WebSocket,
    mut changes: Subscription,
    content_piece_id: String,
) {
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        loop {
            let change = match changes.recv().await {
                Ok(change) => change,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        "Change stream for {} lagged, dropped {} changes",
                        content_piece_id, skipped
                    );
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let frame = match change_frame(&change) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Failed to encode {}: {}", change.action(), e);
                    continue;
                }
            };

            if sender.send(frame).await.is_err() {
                break;
            }
        }
        debug!("Change stream for {} closed", content_piece_id);
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            if matches!(msg, Ok(Message::Close(_)) | Err(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

fn change_frame(change: &ThreadChange) -> serde_json::Result<Message> {
    Ok(Message::Text(serde_json::to_string(change)?.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_store::ThreadRef;

    #[test]
    fn test_change_frame_is_tagged_json() {
        let frame = change_frame(&ThreadChange::ResolveThread(ThreadRef {
            id: "thread-1".to_string(),
        }))
        .unwrap();

        let Message::Text(text) = frame else {
            panic!("Expected a text frame");
        };
        let value: Value = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(value["action"], "resolveThread");
        assert_eq!(value["data"]["id"], "thread-1");
    }
}
