use axum::{debug_handler, extract::State, http::StatusCode, Extension, Json};

use crate::api::errors::ApiResult;
use crate::api::extract::ApiJson;
use crate::api::middleware::AuthenticatedUser;
use crate::api::state::AppState;
use crate::database::models::{CreateUserRequest, LoginRequest, TokenResponse, UserResponse};

/// Register a new account
#[debug_handler]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = state.auth.register(request).await?;
    Ok((StatusCode::OK, Json(UserResponse::from(&user))))
}

/// Exchange credentials for a bearer token
#[debug_handler]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let token = state.auth.login(&request.username, &request.password).await?;
    Ok((StatusCode::OK, Json(token)))
}

#[debug_handler]
pub async fn me(
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<UserResponse>> {
    Ok((StatusCode::OK, Json(UserResponse::from(&auth_user.user))))
}
