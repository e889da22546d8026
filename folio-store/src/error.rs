use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures of store operations. A failed operation has rolled back its
/// transaction before the error reaches the caller.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The named record (`workspace ws-1`, `thread t-3`, ...) does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Rejected caller input, such as an empty comment.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid rank: {0}")]
    InvalidRank(String),

    /// A JSON column or document could not be encoded or decoded.
    #[error("Malformed stored data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether the error was caused by the request rather than the store.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound(_) | StoreError::InvalidInput(_) | StoreError::InvalidRank(_)
        )
    }
}
