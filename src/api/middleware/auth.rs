use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::api::errors::AppError;
use crate::api::state::AppState;
use crate::database::models::User;

#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub user_id: uuid::Uuid,
    pub user: User,
}

/// Validates the bearer token and adds the user to request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    let Some(token) = token else {
        return Err(AppError::not_authenticated());
    };

    let user = state.auth.get_user_by_token(token).await?;
    req.extensions_mut().insert(AuthenticatedUser {
        user_id: user.id,
        user,
    });

    Ok(next.run(req).await)
}
