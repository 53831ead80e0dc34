use crate::database::StoreError;

/// Failures surfaced by the chat and branch services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    /// Login rejected: unknown account or wrong password
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("{0}")]
    Conflict(String),
    /// A write the operation depends on reported that nothing was modified
    #[error("{0}")]
    UpstreamWriteFailure(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamWriteFailure(message.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
