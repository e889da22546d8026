//! Comment threads anchored in content pieces.
//!
//! Every mutation is published on the store's [`ChangeFeed`] under the content
//! piece the thread belongs to.

use crate::error::{Result, StoreError};
use crate::feed::{ChangeFeed, Subscription, ThreadChange, ThreadRef};
use crate::ids::IdGenerator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub thread_id: String,
    pub user_id: String,
    pub content: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentThread {
    pub id: String,
    pub workspace_id: String,
    pub content_piece_id: String,
    /// Anchor of the thread inside the editor document.
    pub fragment: String,
    pub resolved: bool,
    pub date: DateTime<Utc>,
    /// Earliest comment of the thread, if it has any.
    #[serde(default)]
    pub first_comment: Option<Comment>,
}

#[derive(sqlx::FromRow)]
struct ThreadRow {
    id: String,
    workspace_id: String,
    content_piece_id: String,
    fragment: String,
    resolved: bool,
    date: i64,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: String,
    thread_id: String,
    user_id: String,
    content: String,
    date: i64,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            thread_id: row.thread_id,
            user_id: row.user_id,
            content: row.content,
            date: DateTime::from_timestamp_millis(row.date).unwrap_or_default(),
        }
    }
}

impl ThreadRow {
    fn into_thread(self, first_comment: Option<Comment>) -> CommentThread {
        CommentThread {
            id: self.id,
            workspace_id: self.workspace_id,
            content_piece_id: self.content_piece_id,
            fragment: self.fragment,
            resolved: self.resolved,
            date: DateTime::from_timestamp_millis(self.date).unwrap_or_default(),
            first_comment,
        }
    }
}

#[derive(Clone)]
pub struct CommentStore {
    pool: SqlitePool,
    ids: Arc<dyn IdGenerator>,
    feed: ChangeFeed,
}

impl CommentStore {
    pub fn new(pool: SqlitePool, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            pool,
            ids,
            feed: ChangeFeed::new(),
        }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Listen for thread changes on a content piece.
    pub fn subscribe(&self, content_piece_id: &str) -> Subscription {
        self.feed.subscribe(content_piece_id)
    }

    /// Unresolved threads of a content piece, oldest first, each with its
    /// earliest comment.
    #[instrument(skip(self))]
    pub async fn list_threads(&self, content_piece_id: &str) -> Result<Vec<CommentThread>> {
        let rows = sqlx::query_as::<_, ThreadRow>(
            "SELECT id, workspace_id, content_piece_id, fragment, resolved, date
             FROM comment_threads
             WHERE content_piece_id = ? AND resolved = 0
             ORDER BY date, rowid",
        )
        .bind(content_piece_id)
        .fetch_all(&self.pool)
        .await?;

        let comments = sqlx::query_as::<_, CommentRow>(
            "SELECT c.id, c.thread_id, c.user_id, c.content, c.date
             FROM comments c
             JOIN comment_threads t ON t.id = c.thread_id
             WHERE t.content_piece_id = ? AND t.resolved = 0
             ORDER BY c.date, c.rowid",
        )
        .bind(content_piece_id)
        .fetch_all(&self.pool)
        .await?;

        let mut first_comments: HashMap<String, Comment> = HashMap::new();
        for row in comments {
            first_comments
                .entry(row.thread_id.clone())
                .or_insert_with(|| row.into());
        }

        debug!("Listed {} threads", rows.len());

        Ok(rows
            .into_iter()
            .map(|row| {
                let first = first_comments.remove(&row.id);
                row.into_thread(first)
            })
            .collect())
    }

    /// Get a single thread by ID
    pub async fn get_thread(&self, id: &str) -> Result<CommentThread> {
        let row = self.thread_row(id).await?;

        let first = sqlx::query_as::<_, CommentRow>(
            "SELECT id, thread_id, user_id, content, date FROM comments
             WHERE thread_id = ? ORDER BY date, rowid LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.into_thread(first.map(Comment::from)))
    }

    /// Open a thread on a content piece with its first comment.
    #[instrument(skip(self, content))]
    pub async fn create_thread(
        &self,
        user_id: &str,
        content_piece_id: &str,
        fragment: &str,
        content: &str,
    ) -> Result<CommentThread> {
        validate_comment(content)?;

        let workspace_id = self.content_piece_workspace(content_piece_id).await?;

        let now = now_millis();
        let thread_id = self.ids.next_id();
        let comment = Comment {
            id: self.ids.next_id(),
            thread_id: thread_id.clone(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            date: now,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO comment_threads (id, workspace_id, content_piece_id, fragment, resolved, date)
             VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(&thread_id)
        .bind(&workspace_id)
        .bind(content_piece_id)
        .bind(fragment)
        .bind(now.timestamp_millis())
        .execute(&mut *tx)
        .await?;

        insert_comment(&mut *tx, &comment).await?;

        tx.commit().await?;

        let thread = CommentThread {
            id: thread_id,
            workspace_id,
            content_piece_id: content_piece_id.to_string(),
            fragment: fragment.to_string(),
            resolved: false,
            date: now,
            first_comment: Some(comment),
        };

        self.feed
            .publish(content_piece_id, ThreadChange::CreateThread(thread.clone()));

        Ok(thread)
    }

    /// Reply to an existing thread.
    #[instrument(skip(self, content))]
    pub async fn create_comment(
        &self,
        user_id: &str,
        thread_id: &str,
        content: &str,
    ) -> Result<Comment> {
        validate_comment(content)?;

        let thread = self.thread_row(thread_id).await?;
        let comment = Comment {
            id: self.ids.next_id(),
            thread_id: thread_id.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            date: now_millis(),
        };

        let mut conn = self.pool.acquire().await?;
        insert_comment(&mut *conn, &comment).await?;

        self.feed.publish(
            &thread.content_piece_id,
            ThreadChange::CreateComment(comment.clone()),
        );

        Ok(comment)
    }

    #[instrument(skip(self))]
    pub async fn resolve_thread(&self, id: &str) -> Result<()> {
        let thread = self.thread_row(id).await?;

        sqlx::query("UPDATE comment_threads SET resolved = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.feed.publish(
            &thread.content_piece_id,
            ThreadChange::ResolveThread(ThreadRef { id: id.to_string() }),
        );

        Ok(())
    }

    /// Delete a thread together with its comments.
    #[instrument(skip(self))]
    pub async fn delete_thread(&self, id: &str) -> Result<()> {
        let thread = self.thread_row(id).await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE thread_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM comment_threads WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.feed.publish(
            &thread.content_piece_id,
            ThreadChange::DeleteThread(ThreadRef { id: id.to_string() }),
        );

        Ok(())
    }

    /// Workspace a content piece belongs to.
    pub async fn content_piece_workspace(&self, content_piece_id: &str) -> Result<String> {
        sqlx::query_scalar("SELECT workspace_id FROM content_pieces WHERE id = ?")
            .bind(content_piece_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("content piece {}", content_piece_id)))
    }

    async fn thread_row(&self, id: &str) -> Result<ThreadRow> {
        sqlx::query_as::<_, ThreadRow>(
            "SELECT id, workspace_id, content_piece_id, fragment, resolved, date
             FROM comment_threads WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("thread {}", id)))
    }
}

async fn insert_comment(conn: &mut sqlx::SqliteConnection, comment: &Comment) -> Result<()> {
    sqlx::query(
        "INSERT INTO comments (id, thread_id, user_id, content, date)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&comment.id)
    .bind(&comment.thread_id)
    .bind(&comment.user_id)
    .bind(&comment.content)
    .bind(comment.date.timestamp_millis())
    .execute(conn)
    .await?;

    Ok(())
}

/// Current time at the millisecond precision dates are stored with.
fn now_millis() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap_or_default()
}

fn validate_comment(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "comment content must not be empty".to_string(),
        ));
    }
    Ok(())
}
