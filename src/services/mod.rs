pub mod branch_service;
pub mod chat_service;
pub mod errors;

pub use branch_service::{ActiveBranchUpdate, BranchService};
pub use chat_service::ChatService;
pub use errors::{ServiceError, ServiceResult};

use uuid::Uuid;

use crate::database::models::Chat;

/// Reject `user_id` unless it owns `chat`; `action` completes "Not authorized to ..."
pub fn ensure_owner(chat: &Chat, user_id: Uuid, action: &str) -> ServiceResult<()> {
    if chat.account_id == user_id {
        Ok(())
    } else {
        Err(ServiceError::forbidden(format!("Not authorized to {}", action)))
    }
}
