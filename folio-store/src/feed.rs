//! Push notifications for comment-thread changes, keyed by content piece.

use crate::comments::{Comment, CommentThread};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

pub const CHANNEL_CAPACITY: usize = 100;

type Channels = HashMap<String, broadcast::Sender<ThreadChange>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRef {
    pub id: String,
}

/// A change to the threads of one content piece.
///
/// Serializes as `{"action": "resolveThread", "data": {"id": "..."}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum ThreadChange {
    CreateThread(CommentThread),
    CreateComment(Comment),
    ResolveThread(ThreadRef),
    DeleteThread(ThreadRef),
}

impl ThreadChange {
    pub fn action(&self) -> &'static str {
        match self {
            ThreadChange::CreateThread(_) => "createThread",
            ThreadChange::CreateComment(_) => "createComment",
            ThreadChange::ResolveThread(_) => "resolveThread",
            ThreadChange::DeleteThread(_) => "deleteThread",
        }
    }
}

/// Fan-out of [`ThreadChange`]s to every subscriber of a content piece.
///
/// Channels are created on first subscription and removed when the last
/// [`Subscription`] of a piece is dropped.
#[derive(Clone)]
pub struct ChangeFeed {
    channels: Arc<Mutex<Channels>>,
}

/// A live subscription to the changes of one content piece.
///
/// Holds at most [`CHANNEL_CAPACITY`] undelivered changes; a slower reader
/// gets [`RecvError::Lagged`].
pub struct Subscription {
    content_piece_id: String,
    rx: broadcast::Receiver<ThreadChange>,
    channels: Arc<Mutex<Channels>>,
}

impl Subscription {
    pub fn content_piece_id(&self) -> &str {
        &self.content_piece_id
    }

    pub async fn recv(&mut self) -> Result<ThreadChange, RecvError> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Result<ThreadChange, TryRecvError> {
        self.rx.try_recv()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        // `self.rx` is still alive here, so a count of one means it is the last.
        let last = channels
            .get(&self.content_piece_id)
            .is_some_and(|tx| tx.receiver_count() <= 1);
        if last {
            channels.remove(&self.content_piece_id);
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn subscribe(&self, content_piece_id: &str) -> Subscription {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let rx = channels
            .entry(content_piece_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();

        Subscription {
            content_piece_id: content_piece_id.to_string(),
            rx,
            channels: Arc::clone(&self.channels),
        }
    }

    /// Deliver a change to current subscribers. Returns how many received it.
    pub fn publish(&self, content_piece_id: &str, change: ThreadChange) -> usize {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(tx) = channels.get(content_piece_id) else {
            return 0;
        };

        match tx.send(change) {
            Ok(receivers) => receivers,
            Err(_) => {
                channels.remove(content_piece_id);
                0
            }
        }
    }

    pub fn subscriber_count(&self, content_piece_id: &str) -> usize {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .get(content_piece_id)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Number of content pieces with at least one live subscription.
    pub fn active_pieces(&self) -> usize {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
