use axum::{debug_handler, extract::State, http::StatusCode, Extension, Json};

use crate::api::errors::ApiResult;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::middleware::AuthenticatedUser;
use crate::api::state::AppState;
use crate::database::models::{
    Chat, ChatIdQuery, ChatWithContent, CreateChatRequest, UpdateChatRequest,
};
use crate::services::ensure_owner;

#[debug_handler]
pub async fn create_chat(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<CreateChatRequest>,
) -> ApiResult<Json<Chat>> {
    let chat = state
        .chats
        .create_chat(auth_user.user_id, &request.name, request.chat_type)
        .await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

/// Chat metadata together with its QA pairs and active branch
#[debug_handler]
pub async fn get_chat(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiQuery(query): ApiQuery<ChatIdQuery>,
) -> ApiResult<Json<ChatWithContent>> {
    let content = state.chats.get_chat_with_content(query.chat_id).await?;
    ensure_owner(&content.chat, auth_user.user_id, "access this chat")?;
    Ok((StatusCode::OK, Json(content)))
}

#[debug_handler]
pub async fn list_chats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Vec<Chat>>> {
    let chats = state.chats.list_user_chats(auth_user.user_id).await?;
    Ok((StatusCode::OK, Json(chats)))
}

#[debug_handler]
pub async fn update_chat(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiQuery(query): ApiQuery<ChatIdQuery>,
    ApiJson(request): ApiJson<UpdateChatRequest>,
) -> ApiResult<Json<Chat>> {
    let chat = state.chats.get_chat(query.chat_id).await?;
    ensure_owner(&chat, auth_user.user_id, "update this chat")?;

    let chat = state.chats.update_chat(query.chat_id, request).await?;
    Ok((StatusCode::OK, Json(chat)))
}

#[debug_handler]
pub async fn delete_chat(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiQuery(query): ApiQuery<ChatIdQuery>,
) -> ApiResult<()> {
    state
        .chats
        .delete_chat(query.chat_id, auth_user.user_id)
        .await?;
    Ok((StatusCode::NO_CONTENT, ()))
}
