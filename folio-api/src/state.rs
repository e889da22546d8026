use folio_store::{CommentStore, IdGenerator, UuidGenerator, WorkspaceProvisioner};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub provisioner: Arc<WorkspaceProvisioner>,
    pub comments: Arc<CommentStore>,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_ids(pool, Arc::new(UuidGenerator))
    }

    /// Build the state around a specific identifier source, e.g. sequential ids in tests.
    pub fn with_ids(pool: SqlitePool, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            provisioner: Arc::new(WorkspaceProvisioner::new(pool.clone(), Arc::clone(&ids))),
            comments: Arc::new(CommentStore::new(pool, ids)),
        }
    }
}
