//! Store seams the services are written against.
//!
//! Relational data (users, chats, conversations) and chat content live behind
//! separate traits so each can sit on its own backend. Nothing here spans both.

use async_trait::async_trait;
use uuid::Uuid;

use super::models::{
    Chat, ChatChanges, ChatDocument, ChatType, Conversation, NewConversation, NewUser, QaPair,
    User,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn get_user_by_id(&self, user_id: Uuid) -> StoreResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_chat(
        &self,
        account_id: Uuid,
        name: &str,
        chat_type: ChatType,
    ) -> StoreResult<Chat>;
    async fn get_chat(&self, chat_id: Uuid) -> StoreResult<Option<Chat>>;
    /// Applies the given changes and refreshes `updated_at`
    async fn update_chat(&self, chat_id: Uuid, changes: ChatChanges) -> StoreResult<Option<Chat>>;
    /// Returns false when no row was removed
    async fn delete_chat(&self, chat_id: Uuid) -> StoreResult<bool>;
    async fn list_user_chats(&self, account_id: Uuid) -> StoreResult<Vec<Chat>>;
    async fn create_conversation(&self, conversation: NewConversation)
        -> StoreResult<Conversation>;
    async fn list_chat_conversations(&self, chat_id: Uuid) -> StoreResult<Vec<Conversation>>;
}

/// Per-chat content documents.
///
/// Mutations report whether anything was modified, the way a document
/// database reports its modified count.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn create_document(&self, chat_id: Uuid) -> StoreResult<ChatDocument>;
    async fn get_document(&self, chat_id: Uuid) -> StoreResult<Option<ChatDocument>>;
    async fn delete_document(&self, chat_id: Uuid) -> StoreResult<bool>;
    async fn push_qa_pair(&self, chat_id: Uuid, pair: QaPair) -> StoreResult<bool>;
    async fn find_qa_pair(&self, chat_id: Uuid, response_id: &str) -> StoreResult<Option<QaPair>>;
    async fn add_branch_to_pair(
        &self,
        chat_id: Uuid,
        response_id: &str,
        branch_id: Uuid,
    ) -> StoreResult<bool>;
    async fn remove_branch_from_pair(
        &self,
        chat_id: Uuid,
        response_id: &str,
        branch_id: Uuid,
    ) -> StoreResult<bool>;
    /// False when the document is missing or already points at `branch_id`
    async fn set_active_branch(&self, chat_id: Uuid, branch_id: Uuid) -> StoreResult<bool>;
}
