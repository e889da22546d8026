//! Workspace and comment persistence
//!
//! This crate owns the database schema and the business logic that writes to it:
//! provisioning and tearing down workspaces, and storing comment threads together
//! with the change feed that pushes thread updates to listeners.
//! It is consumed by the folio-api HTTP service and by folio-panel.

pub mod comments;
pub mod db;
pub mod document;
pub mod error;
pub mod feed;
pub mod ids;
pub mod model;
pub mod provisioner;
pub mod rank;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use comments::{Comment, CommentStore, CommentThread};
pub use error::{Result, StoreError};
pub use feed::{ChangeFeed, Subscription, ThreadChange, ThreadRef, CHANNEL_CAPACITY};
pub use ids::{IdGenerator, SequentialIds, UuidGenerator};
pub use model::{
    BaseType, Content, ContentGroup, ContentPiece, Permission, Role, User, Workspace,
    WorkspaceConfig, WorkspaceMembership, WorkspaceSettings,
};
pub use provisioner::WorkspaceProvisioner;
pub use rank::Rank;
