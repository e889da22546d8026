use crate::source::ThreadSource;
use crate::state::{PanelView, ThreadPanel};
use folio_store::Subscription;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A mounted panel. Loads the threads of a content piece once, then applies
/// pushed changes until it is unmounted or dropped.
pub struct PanelHandle {
    content_piece_id: String,
    state: Arc<RwLock<ThreadPanel>>,
    listener: JoinHandle<()>,
}

impl PanelHandle {
    /// Start loading and listening. Must be called within a Tokio runtime.
    pub fn mount<S: ThreadSource>(source: Arc<S>, content_piece_id: impl Into<String>) -> Self {
        let content_piece_id = content_piece_id.into();
        let state = Arc::new(RwLock::new(ThreadPanel::new()));

        // Subscribe before fetching so nothing committed after the fetch is missed.
        let changes = source.subscribe(&content_piece_id);

        let listener = tokio::spawn(listen(
            source,
            content_piece_id.clone(),
            changes,
            Arc::clone(&state),
        ));

        Self {
            content_piece_id,
            state,
            listener,
        }
    }

    pub fn content_piece_id(&self) -> &str {
        &self.content_piece_id
    }

    pub fn view(&self) -> PanelView {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .view()
    }

    /// Run `f` against the current panel state.
    pub fn with_state<R>(&self, f: impl FnOnce(&ThreadPanel) -> R) -> R {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Stop listening and release the subscription.
    pub fn unmount(self) {}
}

impl Drop for PanelHandle {
    fn drop(&mut self) {
        debug!("Unmounting thread panel for {}", self.content_piece_id);
        self.listener.abort();
    }
}

async fn listen<S: ThreadSource>(
    source: Arc<S>,
    content_piece_id: String,
    mut changes: Subscription,
    state: Arc<RwLock<ThreadPanel>>,
) {
    load(source.as_ref(), &content_piece_id, &state).await;

    loop {
        match changes.recv().await {
            Ok(change) => {
                let changed = state
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .apply(&change);
                if changed {
                    debug!("Applied {} to panel for {}", change.action(), content_piece_id);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(
                    "Thread panel for {} missed {} changes, reloading",
                    content_piece_id, skipped
                );
                load(source.as_ref(), &content_piece_id, &state).await;
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn load<S: ThreadSource>(source: &S, content_piece_id: &str, state: &RwLock<ThreadPanel>) {
    let result = source.list_threads(content_piece_id).await;

    let mut panel = state.write().unwrap_or_else(PoisonError::into_inner);
    match result {
        Ok(threads) => panel.load_completed(threads),
        Err(e) => {
            warn!("Failed to load threads for {}: {}", content_piece_id, e);
            panel.load_failed(e);
        }
    }
}
