use axum::{debug_handler, extract::State, http::StatusCode, Extension, Json};

use crate::api::errors::ApiResult;
use crate::api::extract::ApiJson;
use crate::api::middleware::AuthenticatedUser;
use crate::api::state::AppState;
use crate::database::models::{AddMessageRequest, QaPair};
use crate::services::{ensure_owner, ServiceError};

/// Ask a question in a chat and store the generated answer
#[debug_handler]
pub async fn add_message(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<AddMessageRequest>,
) -> ApiResult<Json<QaPair>> {
    if request.question.trim().is_empty() {
        return Err(ServiceError::Validation("Question must not be empty".to_string()).into());
    }

    let chat = state.chats.get_chat(request.chat_id).await?;
    ensure_owner(&chat, auth_user.user_id, "add messages to this chat")?;

    let answer = state.responder.generate(&request.question).await;
    let pair = state
        .chats
        .add_message(
            chat.id,
            &request.question,
            &answer.response,
            Some(answer.metadata()),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(pair)))
}
