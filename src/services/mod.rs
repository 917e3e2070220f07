//! Application services orchestrating form state and backend side effects.
pub mod queue;
pub mod submission;
pub mod uploads;

use crate::api::ApiError;
use crate::domain::PhotoId;
use crate::forms::FieldError;

/// Convenience alias for service results.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("form does not accept photos")]
    UploadsDisabled,
    #[error("existing photos can only be deleted while editing")]
    NoPhotoOwner,
    #[error("unknown photo {0}")]
    UnknownPhoto(PhotoId),
    #[error("server rejected the request: {0}")]
    Server(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("failed to read navigation stack")]
    LoadNavigation(#[source] std::io::Error),
    #[error("failed to save navigation stack")]
    SaveNavigation(#[source] std::io::Error),
    #[error("navigation stack is corrupt")]
    NavigationFormat(#[source] serde_json::Error),
}
