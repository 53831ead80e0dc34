use axum::{debug_handler, extract::State, http::StatusCode, Extension, Json};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::api::errors::{ApiResult, AppError};
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::middleware::AuthenticatedUser;
use crate::api::state::AppState;
use crate::database::models::{
    BranchResponse, BranchTreeResponse, ChatIdQuery, CreateBranchRequest, SetActiveBranchQuery,
};
use crate::services::{ensure_owner, ActiveBranchUpdate};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Fork a new chat from one answer of a chat the caller owns
#[debug_handler]
pub async fn create_branch(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<CreateBranchRequest>,
) -> ApiResult<Json<BranchResponse>> {
    let parent = state.chats.get_chat(request.chat_id).await?;
    ensure_owner(
        &parent,
        auth_user.user_id,
        "create branches from this chat",
    )?;

    let created = state
        .branches
        .create_branch(
            request.chat_id,
            &request.response_id,
            auth_user.user_id,
            request.name,
        )
        .await?;

    Ok((
        StatusCode::OK,
        Json(BranchResponse {
            id: created.chat.id,
            name: created.chat.name,
            parent_chat_id: created.parent_chat_id,
            parent_response_id: created.parent_response_id,
            created_at: created.created_at,
        }),
    ))
}

#[debug_handler]
pub async fn get_branches(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiQuery(query): ApiQuery<ChatIdQuery>,
) -> ApiResult<Json<Vec<BranchResponse>>> {
    let chat = state.chats.get_chat(query.chat_id).await?;
    ensure_owner(&chat, auth_user.user_id, "view branches for this chat")?;

    let branches: Vec<BranchResponse> = state
        .branches
        .get_branches(query.chat_id)
        .await?
        .iter()
        .map(|branch| BranchResponse::from_listing(branch, query.chat_id))
        .collect();

    Ok((StatusCode::OK, Json(branches)))
}

#[debug_handler]
pub async fn get_branch_tree(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiQuery(query): ApiQuery<ChatIdQuery>,
) -> ApiResult<Json<BranchTreeResponse>> {
    let chat = state.chats.get_chat(query.chat_id).await?;
    ensure_owner(&chat, auth_user.user_id, "view branch tree for this chat")?;

    let tree = state.branches.build_branch_tree(query.chat_id).await?;
    Ok((
        StatusCode::OK,
        Json(BranchTreeResponse {
            root_id: query.chat_id,
            tree,
        }),
    ))
}

#[debug_handler]
pub async fn set_active_branch(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiQuery(query): ApiQuery<SetActiveBranchQuery>,
) -> ApiResult<Json<MessageResponse>> {
    let chat = state.chats.get_chat(query.chat_id).await?;
    ensure_owner(&chat, auth_user.user_id, "modify this chat")?;

    match state
        .branches
        .set_active_branch(query.chat_id, query.branch_id)
        .await?
    {
        ActiveBranchUpdate::Updated => Ok((
            StatusCode::OK,
            Json(MessageResponse {
                message: "Branch activated successfully".to_string(),
            }),
        )),
        // Published contract reports a no-op write as not found
        ActiveBranchUpdate::Unchanged => Err(AppError::not_found("No branch found").into()),
    }
}
