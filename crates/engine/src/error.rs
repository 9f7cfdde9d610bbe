use formforge_core::CoreError;
use formforge_storage::StorageError;
use thiserror::Error;

use crate::materialize::FieldError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("submission rejected: {} invalid field(s)", .0.len())]
    InvalidSubmission(Vec<FieldError>),

    #[error("select field '{0}' is used in the form editor")]
    SelectInDraft(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("document service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("document service responded with status {status}")]
    Upstream { status: u16 },

    #[error("config error: {0}")]
    Config(String),
}

/// How an error is presented: inline next to a control, or as a flash
/// message after a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    ReferentialIntegrity,
    NotFound,
    UpstreamUnavailable,
    Internal,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(CoreError::Validation { .. })
            | Self::Storage(StorageError::Core(CoreError::Validation { .. }))
            | Self::InvalidSubmission(_) => ErrorKind::Validation,
            Self::Storage(StorageError::Conflict(_)) | Self::SelectInDraft(_) => ErrorKind::Conflict,
            Self::Storage(StorageError::ReferentialIntegrity(_)) => ErrorKind::ReferentialIntegrity,
            Self::Storage(StorageError::NotFound(_)) => ErrorKind::NotFound,
            Self::UpstreamUnavailable(_) | Self::Upstream { .. } | Self::Http(_) => {
                ErrorKind::UpstreamUnavailable
            }
            _ => ErrorKind::Internal,
        }
    }
}
