//! Shared helpers for folio-store integration tests

#![allow(dead_code)]

use folio_store::{
    CommentStore, IdGenerator, SequentialIds, User, WorkspaceConfig, WorkspaceProvisioner,
};
use sqlx::SqlitePool;
use std::sync::Arc;

pub use folio_store::test_utils::create_test_db;

pub fn user(id: &str, username: &str) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
    }
}

pub fn provisioner(pool: &SqlitePool) -> WorkspaceProvisioner {
    provisioner_with_ids(pool, Arc::new(SequentialIds::new("id")))
}

pub fn provisioner_with_ids(pool: &SqlitePool, ids: Arc<dyn IdGenerator>) -> WorkspaceProvisioner {
    WorkspaceProvisioner::new(pool.clone(), ids)
}

pub fn comment_store(pool: &SqlitePool) -> CommentStore {
    CommentStore::new(pool.clone(), Arc::new(SequentialIds::new("thread")))
}

pub fn with_default_content() -> WorkspaceConfig {
    WorkspaceConfig {
        default_content: true,
        ..Default::default()
    }
}

/// Row count of `table` for a workspace.
pub async fn count_for_workspace(pool: &SqlitePool, table: &str, workspace_id: &str) -> i64 {
    let column = if table == "workspaces" { "id" } else { "workspace_id" };

    sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ?",
        table, column
    ))
    .bind(workspace_id)
    .fetch_one(pool)
    .await
    .expect("Failed to count rows")
}

pub async fn count_all(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}
