use std::sync::Arc;
use uuid::Uuid;

use super::errors::{ServiceError, ServiceResult};
use crate::database::models::{
    Chat, ChatChanges, ChatDocument, ChatType, ChatWithContent, Conversation, NewConversation,
    QaPair,
};
use crate::database::{ChatStore, ContentStore, Stores};

/// Coordinates chat metadata in the relational store with chat content in
/// the document store.
///
/// The two stores never share a transaction. Multi-step writes undo the
/// steps that already succeeded when a later one fails.
#[derive(Clone)]
pub struct ChatService {
    chats: Arc<dyn ChatStore>,
    contents: Arc<dyn ContentStore>,
}

impl ChatService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            chats: stores.chats.clone(),
            contents: stores.contents.clone(),
        }
    }

    pub async fn create_chat(
        &self,
        account_id: Uuid,
        name: &str,
        chat_type: ChatType,
    ) -> ServiceResult<Chat> {
        let chat = self.chats.create_chat(account_id, name, chat_type).await?;

        if let Err(e) = self.contents.create_document(chat.id).await {
            tracing::error!("Failed to create content for chat {}: {}", chat.id, e);
            if let Err(cleanup) = self.chats.delete_chat(chat.id).await {
                tracing::error!("Failed to remove chat {} after content error: {}", chat.id, cleanup);
            }
            return Err(e.into());
        }

        tracing::debug!("Created {} chat {}", chat_type, chat.id);
        Ok(chat)
    }

    pub async fn get_chat(&self, chat_id: Uuid) -> ServiceResult<Chat> {
        self.chats
            .get_chat(chat_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Chat not found"))
    }

    pub async fn get_chat_with_content(&self, chat_id: Uuid) -> ServiceResult<ChatWithContent> {
        let chat = self.get_chat(chat_id).await?;
        let document = self
            .contents
            .get_document(chat_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Chat content not found"))?;

        Ok(ChatWithContent {
            chat,
            qa_pairs: document.qa_pairs,
            active_branch_id: document.active_branch_id,
        })
    }

    pub async fn list_user_chats(&self, account_id: Uuid) -> ServiceResult<Vec<Chat>> {
        Ok(self.chats.list_user_chats(account_id).await?)
    }

    pub async fn update_chat(&self, chat_id: Uuid, changes: ChatChanges) -> ServiceResult<Chat> {
        self.chats
            .update_chat(chat_id, changes)
            .await?
            .ok_or_else(|| ServiceError::upstream("Failed to update chat"))
    }

    pub async fn delete_chat(&self, chat_id: Uuid, requester: Uuid) -> ServiceResult<()> {
        let chat = self.get_chat(chat_id).await?;
        super::ensure_owner(&chat, requester, "delete this chat")?;

        self.contents.delete_document(chat_id).await?;
        if !self.chats.delete_chat(chat_id).await? {
            return Err(ServiceError::upstream("Failed to delete chat"));
        }

        tracing::debug!("Deleted chat {}", chat_id);
        Ok(())
    }

    /// Append a new exchange to the chat and refresh its `updated_at`
    pub async fn add_message(
        &self,
        chat_id: Uuid,
        question: &str,
        response: &str,
        metadata: Option<serde_json::Value>,
    ) -> ServiceResult<QaPair> {
        let pair = QaPair::new(question, response, metadata);
        self.append_pair(chat_id, pair.clone()).await?;
        self.chats
            .update_chat(chat_id, ChatChanges::default())
            .await?;
        Ok(pair)
    }

    pub async fn get_document(&self, chat_id: Uuid) -> ServiceResult<Option<ChatDocument>> {
        Ok(self.contents.get_document(chat_id).await?)
    }

    pub async fn find_qa_pair(
        &self,
        chat_id: Uuid,
        response_id: &str,
    ) -> ServiceResult<Option<QaPair>> {
        Ok(self.contents.find_qa_pair(chat_id, response_id).await?)
    }

    pub async fn append_pair(&self, chat_id: Uuid, pair: QaPair) -> ServiceResult<()> {
        if self.contents.push_qa_pair(chat_id, pair).await? {
            Ok(())
        } else {
            Err(ServiceError::upstream("Chat content not found"))
        }
    }

    /// Record `branch_id` on the pair that answered `response_id`
    pub async fn link_branch(
        &self,
        chat_id: Uuid,
        response_id: &str,
        branch_id: Uuid,
    ) -> ServiceResult<()> {
        if self
            .contents
            .add_branch_to_pair(chat_id, response_id, branch_id)
            .await?
        {
            Ok(())
        } else {
            Err(ServiceError::upstream("Failed to link branch to response"))
        }
    }

    pub async fn unlink_branch(
        &self,
        chat_id: Uuid,
        response_id: &str,
        branch_id: Uuid,
    ) -> ServiceResult<bool> {
        Ok(self
            .contents
            .remove_branch_from_pair(chat_id, response_id, branch_id)
            .await?)
    }

    pub async fn record_conversation(
        &self,
        conversation: NewConversation,
    ) -> ServiceResult<Conversation> {
        Ok(self.chats.create_conversation(conversation).await?)
    }

    pub async fn list_conversations(&self, chat_id: Uuid) -> ServiceResult<Vec<Conversation>> {
        Ok(self.chats.list_chat_conversations(chat_id).await?)
    }

    /// Returns false when the document was not modified
    pub async fn set_active_branch_id(&self, chat_id: Uuid, branch_id: Uuid) -> ServiceResult<bool> {
        Ok(self.contents.set_active_branch(chat_id, branch_id).await?)
    }

    /// Remove a chat from both stores without ownership checks.
    ///
    /// Used to roll back partially created chats; failures are logged, not returned.
    pub async fn discard_chat(&self, chat_id: Uuid) {
        if let Err(e) = self.contents.delete_document(chat_id).await {
            tracing::error!("Failed to discard content of chat {}: {}", chat_id, e);
        }
        match self.chats.delete_chat(chat_id).await {
            Ok(true) => tracing::debug!("Discarded chat {}", chat_id),
            Ok(false) => tracing::warn!("Chat {} was already gone when discarding", chat_id),
            Err(e) => tracing::error!("Failed to discard chat {}: {}", chat_id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::{StoreError, StoreResult};
    use async_trait::async_trait;

    fn service() -> ChatService {
        ChatService::new(&Stores::in_memory())
    }

    #[tokio::test]
    async fn test_create_chat_creates_empty_document() {
        let service = service();
        let owner = Uuid::new_v4();
        let chat = service
            .create_chat(owner, "Trip Planning", ChatType::Personal)
            .await
            .unwrap();

        let content = service.get_chat_with_content(chat.id).await.unwrap();
        assert_eq!(content.chat.name, "Trip Planning");
        assert_eq!(content.chat.account_id, owner);
        assert!(content.qa_pairs.is_empty());
        assert!(content.active_branch_id.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_chat_is_not_found() {
        let err = service().get_chat(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Chat not found"));
    }

    #[tokio::test]
    async fn test_add_message_appends_in_order() {
        let service = service();
        let chat = service
            .create_chat(Uuid::new_v4(), "Chat", ChatType::Personal)
            .await
            .unwrap();

        let first = service.add_message(chat.id, "q1", "r1", None).await.unwrap();
        let second = service.add_message(chat.id, "q2", "r2", None).await.unwrap();
        assert_ne!(first.response_id, second.response_id);

        let content = service.get_chat_with_content(chat.id).await.unwrap();
        let questions: Vec<_> = content.qa_pairs.iter().map(|p| p.question.as_str()).collect();
        assert_eq!(questions, vec!["q1", "q2"]);
        assert!(content.chat.updated_at >= chat.updated_at);
    }

    #[tokio::test]
    async fn test_add_message_without_document_fails() {
        let stores = Stores::in_memory();
        let service = ChatService::new(&stores);
        let chat = service
            .create_chat(Uuid::new_v4(), "Chat", ChatType::Personal)
            .await
            .unwrap();
        stores.contents.delete_document(chat.id).await.unwrap();

        let err = service.add_message(chat.id, "q", "r", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::UpstreamWriteFailure(_)));

        let err = service.get_chat_with_content(chat.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Chat content not found"));
    }

    #[tokio::test]
    async fn test_delete_chat_requires_owner() {
        let service = service();
        let owner = Uuid::new_v4();
        let chat = service
            .create_chat(owner, "Mine", ChatType::Personal)
            .await
            .unwrap();

        let err = service.delete_chat(chat.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(ref m) if m == "Not authorized to delete this chat"));
        assert!(service.get_chat(chat.id).await.is_ok());

        service.delete_chat(chat.id, owner).await.unwrap();
        assert!(service.get_chat(chat.id).await.is_err());
        assert!(service.get_document(chat.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_chat_changes_only_given_fields() {
        let service = service();
        let chat = service
            .create_chat(Uuid::new_v4(), "Old", ChatType::Personal)
            .await
            .unwrap();

        let updated = service
            .update_chat(
                chat.id,
                ChatChanges {
                    name: None,
                    active: Some(false),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Old");
        assert!(!updated.active);

        let err = service
            .update_chat(Uuid::new_v4(), ChatChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UpstreamWriteFailure(ref m) if m == "Failed to update chat"));
    }

    struct RejectingContentStore;

    #[async_trait]
    impl ContentStore for RejectingContentStore {
        async fn create_document(&self, _chat_id: Uuid) -> StoreResult<ChatDocument> {
            Err(StoreError::Conflict("document store unavailable".to_string()))
        }
        async fn get_document(&self, _chat_id: Uuid) -> StoreResult<Option<ChatDocument>> {
            Ok(None)
        }
        async fn delete_document(&self, _chat_id: Uuid) -> StoreResult<bool> {
            Ok(false)
        }
        async fn push_qa_pair(&self, _chat_id: Uuid, _pair: QaPair) -> StoreResult<bool> {
            Ok(false)
        }
        async fn find_qa_pair(&self, _: Uuid, _: &str) -> StoreResult<Option<QaPair>> {
            Ok(None)
        }
        async fn add_branch_to_pair(&self, _: Uuid, _: &str, _: Uuid) -> StoreResult<bool> {
            Ok(false)
        }
        async fn remove_branch_from_pair(&self, _: Uuid, _: &str, _: Uuid) -> StoreResult<bool> {
            Ok(false)
        }
        async fn set_active_branch(&self, _: Uuid, _: Uuid) -> StoreResult<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_create_chat_rolls_back_row_when_content_fails() {
        let mut stores = Stores::in_memory();
        stores.contents = Arc::new(RejectingContentStore);
        let service = ChatService::new(&stores);
        let owner = Uuid::new_v4();

        assert!(service
            .create_chat(owner, "Doomed", ChatType::Personal)
            .await
            .is_err());
        assert!(service.list_user_chats(owner).await.unwrap().is_empty());
    }
}
