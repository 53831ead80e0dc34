use aide::{
    generate::GenContext,
    openapi::{Operation, Response as OpenApiResponse},
    OperationOutput,
};
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::database::StoreError;
use crate::services::ServiceError;

/// Body of every error response
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
    pub detail: String,
    pub error_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication errors (AUTH_xxx)
    AuthInvalidCredentials,
    AuthMissingToken,
    AuthenticationFailed,

    // Authorization errors (AUTHZ_xxx)
    AuthzInsufficientPermissions,

    // Validation errors (VALID_xxx)
    ValidInvalidInput,
    ValidInvalidFormat,

    // Resource errors (RESOURCE_xxx)
    ResourceNotFound,
    ResourceConflict,

    // System errors (SYSTEM_xxx)
    SystemDatabaseError,
    SystemInternalError,
    SystemWriteFailed,

    // User management errors (USER_xxx)
    UserCreationFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            // Authentication
            ErrorCode::AuthInvalidCredentials => "AUTH_INVALID_CREDENTIALS",
            ErrorCode::AuthMissingToken => "AUTH_MISSING_TOKEN",
            ErrorCode::AuthenticationFailed => "AUTH_AUTHENTICATION_FAILED",

            // Authorization
            ErrorCode::AuthzInsufficientPermissions => "AUTHZ_INSUFFICIENT_PERMISSIONS",

            // Validation
            ErrorCode::ValidInvalidInput => "VALID_INVALID_INPUT",
            ErrorCode::ValidInvalidFormat => "VALID_INVALID_FORMAT",

            // Resource
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::ResourceConflict => "RESOURCE_CONFLICT",

            // System
            ErrorCode::SystemDatabaseError => "SYSTEM_DATABASE_ERROR",
            ErrorCode::SystemInternalError => "SYSTEM_INTERNAL_ERROR",
            ErrorCode::SystemWriteFailed => "SYSTEM_WRITE_FAILED",

            // User management
            ErrorCode::UserCreationFailed => "USER_CREATION_FAILED",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            ErrorCode::UserCreationFailed => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            ErrorCode::AuthInvalidCredentials
            | ErrorCode::AuthMissingToken
            | ErrorCode::AuthenticationFailed => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            ErrorCode::AuthzInsufficientPermissions => StatusCode::FORBIDDEN,

            // 404 Not Found
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            ErrorCode::ResourceConflict => StatusCode::CONFLICT,

            // 422 Unprocessable Entity
            ErrorCode::ValidInvalidInput | ErrorCode::ValidInvalidFormat => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            // 500 Internal Server Error
            ErrorCode::SystemDatabaseError
            | ErrorCode::SystemInternalError
            | ErrorCode::SystemWriteFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug)]
pub struct AppError {
    code: ErrorCode,
    message: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::AuthMissingToken, "Not authenticated")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceNotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthzInsufficientPermissions, message)
    }

    pub fn database_error(err: impl std::error::Error) -> Self {
        tracing::error!("Database error: {}", err);
        Self::new(ErrorCode::SystemDatabaseError, "Database error")
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SystemInternalError, msg)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ApiError {
            detail: self.message,
            error_code: self.code.as_str().to_string(),
        });

        (self.code.status_code(), body).into_response()
    }
}

impl OperationOutput for AppError {
    type Inner = ApiError;

    fn operation_response(
        ctx: &mut GenContext,
        operation: &mut Operation,
    ) -> Option<OpenApiResponse> {
        Json::<ApiError>::operation_response(ctx, operation)
    }
}

pub type ApiResult<T> = Result<(StatusCode, T), (StatusCode, AppError)>;

impl From<AppError> for (StatusCode, AppError) {
    fn from(err: AppError) -> Self {
        (err.status_code(), err)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) => AppError::not_found(message),
            ServiceError::Forbidden(message) => AppError::forbidden(message),
            ServiceError::Validation(message) => {
                AppError::new(ErrorCode::ValidInvalidInput, message)
            }
            ServiceError::Unauthorized(message) => {
                AppError::new(ErrorCode::AuthenticationFailed, message)
            }
            ServiceError::InvalidCredentials(message) => {
                AppError::new(ErrorCode::AuthInvalidCredentials, message)
            }
            ServiceError::Conflict(message) => {
                AppError::new(ErrorCode::UserCreationFailed, message)
            }
            ServiceError::UpstreamWriteFailure(message) => {
                tracing::error!("Write failed: {}", message);
                AppError::new(ErrorCode::SystemWriteFailed, message)
            }
            ServiceError::Store(StoreError::Conflict(message)) => {
                AppError::new(ErrorCode::ResourceConflict, message)
            }
            ServiceError::Store(StoreError::Database(e)) => AppError::database_error(e),
            ServiceError::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                AppError::internal_error("Internal server error")
            }
        }
    }
}

impl From<ServiceError> for (StatusCode, AppError) {
    fn from(err: ServiceError) -> Self {
        AppError::from(err).into()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::new(ErrorCode::ValidInvalidFormat, rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::new(ErrorCode::ValidInvalidFormat, rejection.body_text())
    }
}
