use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user a workspace is provisioned for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
}

/// Options accepted when creating a workspace.
///
/// Empty strings are treated the same as missing values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_content: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentGroup {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content_groups: Vec<ContentGroup>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Block {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    BulletList,
    OrderedList,
    TaskList,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    Image,
    Table,
    Embed,
}

impl Block {
    pub const ALL: [Block; 15] = [
        Block::Heading1,
        Block::Heading2,
        Block::Heading3,
        Block::Heading4,
        Block::Heading5,
        Block::Heading6,
        Block::BulletList,
        Block::OrderedList,
        Block::TaskList,
        Block::Blockquote,
        Block::CodeBlock,
        Block::HorizontalRule,
        Block::Image,
        Block::Table,
        Block::Embed,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Embed {
    Codepen,
    Codesandbox,
    Youtube,
}

impl Embed {
    pub const ALL: [Embed; 3] = [Embed::Codepen, Embed::Codesandbox, Embed::Youtube];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Strike,
    Code,
    Link,
    Highlight,
    Superscript,
    Subscript,
    Underline,
}

impl Mark {
    pub const ALL: [Mark; 9] = [
        Mark::Bold,
        Mark::Italic,
        Mark::Strike,
        Mark::Code,
        Mark::Link,
        Mark::Highlight,
        Mark::Superscript,
        Mark::Subscript,
        Mark::Underline,
    ];
}

/// Editor configuration for a workspace. Exactly one per workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    pub id: String,
    pub workspace_id: String,
    pub blocks: Vec<Block>,
    pub embeds: Vec<Embed>,
    pub marks: Vec<Mark>,
    pub prettier_config: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    EditContent,
    EditMetadata,
    ManageDashboard,
    ManageTokens,
    ManageWebhooks,
    ManageWorkspace,
}

impl Permission {
    pub const ALL: [Permission; 6] = [
        Permission::EditContent,
        Permission::EditMetadata,
        Permission::ManageDashboard,
        Permission::ManageTokens,
        Permission::ManageWebhooks,
        Permission::ManageWorkspace,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BaseType {
    Admin,
    Viewer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    pub base_type: BaseType,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkspaceMembership {
    pub id: String,
    pub workspace_id: String,
    pub user_id: String,
    pub role_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPiece {
    pub id: String,
    pub workspace_id: String,
    pub content_group_id: String,
    pub title: String,
    pub slug: String,
    pub members: Vec<String>,
    pub tags: Vec<String>,
    /// Rank text, see [`crate::rank::Rank`].
    pub ordering: String,
}

/// The serialized body of a content piece.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Content {
    pub id: String,
    pub workspace_id: String,
    pub content_piece_id: String,
    pub content_group_id: String,
    pub content: Vec<u8>,
}

// Internal row types for sqlx. JSON columns are stored as TEXT.

#[derive(sqlx::FromRow)]
pub(crate) struct WorkspaceRow {
    pub id: String,
    pub name: String,
    pub logo: Option<String>,
    pub description: Option<String>,
    pub content_groups: String,
    pub created_at: i64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct SettingsRow {
    pub id: String,
    pub workspace_id: String,
    pub blocks: String,
    pub embeds: String,
    pub marks: String,
    pub prettier_config: String,
}

#[derive(sqlx::FromRow)]
pub(crate) struct RoleRow {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    pub base_type: BaseType,
    pub permissions: String,
}

#[derive(sqlx::FromRow)]
pub(crate) struct ContentPieceRow {
    pub id: String,
    pub workspace_id: String,
    pub content_group_id: String,
    pub title: String,
    pub slug: String,
    pub members: String,
    pub tags: String,
    pub ordering: String,
}

impl TryFrom<WorkspaceRow> for Workspace {
    type Error = serde_json::Error;

    fn try_from(row: WorkspaceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            logo: row.logo,
            description: row.description,
            content_groups: serde_json::from_str(&row.content_groups)?,
            created_at: DateTime::from_timestamp(row.created_at, 0).unwrap_or_default(),
        })
    }
}

impl TryFrom<SettingsRow> for WorkspaceSettings {
    type Error = serde_json::Error;

    fn try_from(row: SettingsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            workspace_id: row.workspace_id,
            blocks: serde_json::from_str(&row.blocks)?,
            embeds: serde_json::from_str(&row.embeds)?,
            marks: serde_json::from_str(&row.marks)?,
            prettier_config: row.prettier_config,
        })
    }
}

impl TryFrom<RoleRow> for Role {
    type Error = serde_json::Error;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            workspace_id: row.workspace_id,
            name: row.name,
            base_type: row.base_type,
            permissions: serde_json::from_str(&row.permissions)?,
        })
    }
}

impl TryFrom<ContentPieceRow> for ContentPiece {
    type Error = serde_json::Error;

    fn try_from(row: ContentPieceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            workspace_id: row.workspace_id,
            content_group_id: row.content_group_id,
            title: row.title,
            slug: row.slug,
            members: serde_json::from_str(&row.members)?,
            tags: serde_json::from_str(&row.tags)?,
            ordering: row.ordering,
        })
    }
}
