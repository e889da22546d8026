use async_trait::async_trait;
use folio_store::{CommentStore, CommentThread, Subscription};

/// Where a panel gets its threads from: one request for the current list and
/// a push channel for changes after it.
#[async_trait]
pub trait ThreadSource: Send + Sync + 'static {
    async fn list_threads(&self, content_piece_id: &str) -> folio_store::Result<Vec<CommentThread>>;

    fn subscribe(&self, content_piece_id: &str) -> Subscription;
}

#[async_trait]
impl ThreadSource for CommentStore {
    async fn list_threads(&self, content_piece_id: &str) -> folio_store::Result<Vec<CommentThread>> {
        CommentStore::list_threads(self, content_piece_id).await
    }

    fn subscribe(&self, content_piece_id: &str) -> Subscription {
        CommentStore::subscribe(self, content_piece_id)
    }
}
