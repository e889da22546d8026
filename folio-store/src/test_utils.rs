use crate::db::run_migrations;
use crate::ids::SequentialIds;
use crate::{CommentStore, User, WorkspaceProvisioner};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Helper to create an in-memory test database with migrations applied
///
/// The pool holds a single connection that never expires, since every new
/// in-memory connection would otherwise open an empty database.
pub async fn create_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub fn test_user(id: &str) -> User {
    User {
        id: id.to_string(),
        username: id.to_string(),
    }
}

pub fn test_provisioner(pool: &SqlitePool) -> WorkspaceProvisioner {
    WorkspaceProvisioner::new(pool.clone(), Arc::new(SequentialIds::new("ws")))
}

pub fn test_comment_store(pool: &SqlitePool) -> CommentStore {
    CommentStore::new(pool.clone(), Arc::new(SequentialIds::new("c")))
}
