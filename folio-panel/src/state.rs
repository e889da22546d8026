use folio_store::{CommentThread, ThreadChange};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "lowercase")]
pub enum LoadState {
    Loading,
    Loaded,
    Failed(String),
}

/// Threads of one content piece, keyed by thread id in source order.
#[derive(Debug, Clone)]
pub struct ThreadPanel {
    threads: IndexMap<String, CommentThread>,
    load_state: LoadState,
}

/// What the render layer needs to draw the panel.
#[derive(Debug, Clone, Serialize)]
pub struct PanelView {
    pub load_state: LoadState,
    pub visible: bool,
    pub label: String,
    pub threads: Vec<CommentThread>,
}

impl Default for ThreadPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadPanel {
    pub fn new() -> Self {
        Self {
            threads: IndexMap::new(),
            load_state: LoadState::Loading,
        }
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    /// Replace the thread list with the result of the initial fetch.
    pub fn load_completed(&mut self, threads: Vec<CommentThread>) {
        self.threads = threads.into_iter().map(|t| (t.id.clone(), t)).collect();
        self.load_state = LoadState::Loaded;
    }

    pub fn load_failed(&mut self, error: impl ToString) {
        self.threads.clear();
        self.load_state = LoadState::Failed(error.to_string());
    }

    pub fn threads(&self) -> impl Iterator<Item = &CommentThread> {
        self.threads.values()
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Threads that have a first comment, in source order.
    pub fn active_threads(&self) -> Vec<&CommentThread> {
        self.threads
            .values()
            .filter(|t| t.first_comment.is_some())
            .collect()
    }

    /// Apply a pushed change. Resolved and deleted threads leave the panel;
    /// other actions are not handled here.
    ///
    /// Returns whether the thread list changed.
    pub fn apply(&mut self, change: &ThreadChange) -> bool {
        match change {
            ThreadChange::ResolveThread(thread) | ThreadChange::DeleteThread(thread) => {
                self.threads.shift_remove(&thread.id).is_some()
            }
            ThreadChange::CreateThread(_) | ThreadChange::CreateComment(_) => false,
        }
    }

    /// The panel is shown once loading has finished and there is something to show.
    pub fn is_visible(&self) -> bool {
        self.load_state == LoadState::Loaded && !self.threads.is_empty()
    }

    pub fn label(&self) -> String {
        match self.threads.len() {
            1 => "1 thread".to_string(),
            n => format!("{} threads", n),
        }
    }

    pub fn view(&self) -> PanelView {
        PanelView {
            load_state: self.load_state.clone(),
            visible: self.is_visible(),
            label: self.label(),
            threads: self.active_threads().into_iter().cloned().collect(),
        }
    }
}
