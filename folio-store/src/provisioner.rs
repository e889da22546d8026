//! Workspace provisioning and teardown.
//!
//! A workspace is spread across six tables. Creation and deletion each run in a
//! single transaction, so either every record of a workspace is written (or
//! removed) or none is.

use crate::document::{encode_document, initial_document};
use crate::error::{Result, StoreError};
use crate::ids::IdGenerator;
use crate::model::{
    BaseType, Block, Content, ContentGroup, ContentPiece, ContentPieceRow, Embed, Mark,
    Permission, Role, RoleRow, SettingsRow, User, Workspace, WorkspaceConfig,
    WorkspaceMembership, WorkspaceRow, WorkspaceSettings,
};
use crate::rank::Rank;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tracing::{info, instrument};

const STARTER_TITLE: &str = "Hello World!";
const STARTER_SLUG: &str = "hello-world";
const EMPTY_PRETTIER_CONFIG: &str = "{}";

/// Tables holding records scoped to a workspace through `workspace_id`.
const SCOPED_TABLES: [&str; 5] = [
    "workspace_settings",
    "roles",
    "workspace_memberships",
    "content_pieces",
    "contents",
];

#[derive(Clone)]
pub struct WorkspaceProvisioner {
    pool: SqlitePool,
    ids: Arc<dyn IdGenerator>,
}

impl WorkspaceProvisioner {
    pub fn new(pool: SqlitePool, ids: Arc<dyn IdGenerator>) -> Self {
        Self { pool, ids }
    }

    /// Get a reference to the database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a workspace owned by `user` and return its id.
    ///
    /// Writes the workspace, its settings, the admin and viewer roles and the
    /// creator's admin membership. With `default_content` it also seeds the
    /// Ideas/Drafts/Published groups and a starter content piece.
    #[instrument(skip(self, user, config), fields(user_id = %user.id))]
    pub async fn create_workspace(&self, user: &User, config: WorkspaceConfig) -> Result<String> {
        let workspace_id = self.ids.next_id();
        let admin_role_id = self.ids.next_id();
        let ideas_group_id = config.default_content.then(|| self.ids.next_id());

        let name =
            non_empty(config.name).unwrap_or_else(|| format!("{}'s workspace", user.username));
        let content_groups = match &ideas_group_id {
            Some(ideas) => self.default_content_groups(ideas),
            None => Vec::new(),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO workspaces (id, name, logo, description, content_groups, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&workspace_id)
        .bind(&name)
        .bind(non_empty(config.logo))
        .bind(non_empty(config.description))
        .bind(serde_json::to_string(&content_groups)?)
        .bind(Utc::now().timestamp())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO workspace_settings (id, workspace_id, blocks, embeds, marks, prettier_config)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(self.ids.next_id())
        .bind(&workspace_id)
        .bind(serde_json::to_string(&Block::ALL)?)
        .bind(serde_json::to_string(&Embed::ALL)?)
        .bind(serde_json::to_string(&Mark::ALL)?)
        .bind(EMPTY_PRETTIER_CONFIG)
        .execute(&mut *tx)
        .await?;

        let viewer_role_id = self.ids.next_id();
        insert_role(
            &mut tx,
            &admin_role_id,
            &workspace_id,
            "Admin",
            BaseType::Admin,
            &Permission::ALL,
        )
        .await?;
        insert_role(
            &mut tx,
            &viewer_role_id,
            &workspace_id,
            "Viewer",
            BaseType::Viewer,
            &[],
        )
        .await?;

        sqlx::query(
            "INSERT INTO workspace_memberships (id, workspace_id, user_id, role_id)
             VALUES (?, ?, ?, ?)",
        )
        .bind(self.ids.next_id())
        .bind(&workspace_id)
        .bind(&user.id)
        .bind(&admin_role_id)
        .execute(&mut *tx)
        .await?;

        if let Some(ideas_group_id) = &ideas_group_id {
            self.insert_starter_content(&mut tx, &workspace_id, ideas_group_id)
                .await?;
        }

        tx.commit().await?;

        info!(
            "Provisioned workspace {} ({}) for {}",
            name, workspace_id, user.username
        );

        Ok(workspace_id)
    }

    /// Delete a workspace and every record scoped to it.
    ///
    /// Deleting an id that does not exist succeeds.
    #[instrument(skip(self))]
    pub async fn delete_workspace(&self, workspace_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let workspaces = sqlx::query("DELETE FROM workspaces WHERE id = ?")
            .bind(workspace_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for table in SCOPED_TABLES {
            sqlx::query(&format!("DELETE FROM {} WHERE workspace_id = ?", table))
                .bind(workspace_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "DELETE FROM comments WHERE thread_id IN
             (SELECT id FROM comment_threads WHERE workspace_id = ?)",
        )
        .bind(workspace_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM comment_threads WHERE workspace_id = ?")
            .bind(workspace_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if workspaces > 0 {
            info!("Deleted workspace {}", workspace_id);
        }

        Ok(())
    }

    /// Get a single workspace by ID
    pub async fn get_workspace(&self, id: &str) -> Result<Workspace> {
        let row = sqlx::query_as::<_, WorkspaceRow>("SELECT * FROM workspaces WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("workspace {}", id)))?;

        Ok(Workspace::try_from(row)?)
    }

    /// Workspaces the user holds a membership in, newest first.
    pub async fn list_user_workspaces(&self, user_id: &str) -> Result<Vec<Workspace>> {
        let rows = sqlx::query_as::<_, WorkspaceRow>(
            "SELECT w.* FROM workspaces w
             JOIN workspace_memberships m ON m.workspace_id = w.id
             WHERE m.user_id = ?
             ORDER BY w.created_at DESC, w.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Workspace::try_from(row).map_err(StoreError::from))
            .collect()
    }

    pub async fn get_settings(&self, workspace_id: &str) -> Result<WorkspaceSettings> {
        let row = sqlx::query_as::<_, SettingsRow>(
            "SELECT * FROM workspace_settings WHERE workspace_id = ?",
        )
        .bind(workspace_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("settings for workspace {}", workspace_id)))?;

        Ok(WorkspaceSettings::try_from(row)?)
    }

    pub async fn list_roles(&self, workspace_id: &str) -> Result<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT * FROM roles WHERE workspace_id = ? ORDER BY base_type, name",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Role::try_from(row).map_err(StoreError::from))
            .collect()
    }

    pub async fn list_memberships(&self, workspace_id: &str) -> Result<Vec<WorkspaceMembership>> {
        let memberships = sqlx::query_as::<_, WorkspaceMembership>(
            "SELECT * FROM workspace_memberships WHERE workspace_id = ?",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(memberships)
    }

    /// Content pieces of a workspace in rank order.
    pub async fn list_content_pieces(&self, workspace_id: &str) -> Result<Vec<ContentPiece>> {
        let rows = sqlx::query_as::<_, ContentPieceRow>(
            "SELECT * FROM content_pieces WHERE workspace_id = ? ORDER BY ordering",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| ContentPiece::try_from(row).map_err(StoreError::from))
            .collect()
    }

    pub async fn get_content(&self, content_piece_id: &str) -> Result<Content> {
        sqlx::query_as::<_, Content>("SELECT * FROM contents WHERE content_piece_id = ?")
            .bind(content_piece_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("content of {}", content_piece_id)))
    }

    /// Permissions the user holds in a workspace through its role, or `None`
    /// when the user is not a member.
    pub async fn user_permissions(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Option<Vec<Permission>>> {
        let permissions: Option<String> = sqlx::query_scalar(
            "SELECT r.permissions FROM workspace_memberships m
             JOIN roles r ON r.id = m.role_id
             WHERE m.workspace_id = ? AND m.user_id = ?",
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        permissions
            .map(|p| serde_json::from_str(&p).map_err(StoreError::from))
            .transpose()
    }

    fn default_content_groups(&self, ideas_group_id: &str) -> Vec<ContentGroup> {
        vec![
            ContentGroup {
                id: ideas_group_id.to_string(),
                name: "Ideas".to_string(),
                locked: false,
            },
            ContentGroup {
                id: self.ids.next_id(),
                name: "Drafts".to_string(),
                locked: false,
            },
            ContentGroup {
                id: self.ids.next_id(),
                name: "Published".to_string(),
                locked: true,
            },
        ]
    }

    async fn insert_starter_content(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        workspace_id: &str,
        ideas_group_id: &str,
    ) -> Result<()> {
        let content_piece_id = self.ids.next_id();

        sqlx::query(
            "INSERT INTO content_pieces (id, workspace_id, content_group_id, title, slug, members, tags, ordering)
             VALUES (?, ?, ?, ?, ?, '[]', '[]', ?)",
        )
        .bind(&content_piece_id)
        .bind(workspace_id)
        .bind(ideas_group_id)
        .bind(STARTER_TITLE)
        .bind(STARTER_SLUG)
        .bind(Rank::min().to_string())
        .execute(&mut **tx)
        .await?;

        let body = encode_document(&initial_document()?)?;

        sqlx::query(
            "INSERT INTO contents (id, workspace_id, content_piece_id, content_group_id, content)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(self.ids.next_id())
        .bind(workspace_id)
        .bind(&content_piece_id)
        .bind(ideas_group_id)
        .bind(body)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

async fn insert_role(
    tx: &mut Transaction<'_, Sqlite>,
    id: &str,
    workspace_id: &str,
    name: &str,
    base_type: BaseType,
    permissions: &[Permission],
) -> Result<()> {
    sqlx::query(
        "INSERT INTO roles (id, workspace_id, name, base_type, permissions)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(workspace_id)
    .bind(name)
    .bind(base_type)
    .bind(serde_json::to_string(permissions)?)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
