use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt data: {0}")]
    Corrupt(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("{0} is still used by at least one form")]
    ReferentialIntegrity(String),

    #[error("core error: {0}")]
    Core(#[from] formforge_core::CoreError),
}
