use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Chat, ChatChanges, ChatType, Conversation, NewConversation};
use crate::database::store::{ChatStore, StoreResult};

const CHAT_COLUMNS: &str = "id, account_id, name, chat_type, active, created_at, updated_at";
const CONVERSATION_COLUMNS: &str =
    "id, chat_id, account_id, name, deleted, parent_id, created_at, updated_at";

pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn create_chat(
        &self,
        account_id: Uuid,
        name: &str,
        chat_type: ChatType,
    ) -> StoreResult<Chat> {
        let now = Utc::now();
        let chat = sqlx::query_as::<_, Chat>(&format!(
            r#"
            INSERT INTO chats (id, account_id, name, chat_type, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, TRUE, $5, $5)
            RETURNING {}
            "#,
            CHAT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(name)
        .bind(chat_type.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(chat)
    }

    async fn get_chat(&self, chat_id: Uuid) -> StoreResult<Option<Chat>> {
        let chat = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {} FROM chats WHERE id = $1",
            CHAT_COLUMNS
        ))
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chat)
    }

    async fn update_chat(&self, chat_id: Uuid, changes: ChatChanges) -> StoreResult<Option<Chat>> {
        let chat = sqlx::query_as::<_, Chat>(&format!(
            r#"
            UPDATE chats
            SET name = COALESCE($2, name),
                active = COALESCE($3, active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CHAT_COLUMNS
        ))
        .bind(chat_id)
        .bind(changes.name)
        .bind(changes.active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chat)
    }

    async fn delete_chat(&self, chat_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM chats WHERE id = $1")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_user_chats(&self, account_id: Uuid) -> StoreResult<Vec<Chat>> {
        let chats = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {} FROM chats WHERE account_id = $1 ORDER BY updated_at DESC",
            CHAT_COLUMNS
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(chats)
    }

    async fn create_conversation(
        &self,
        conversation: NewConversation,
    ) -> StoreResult<Conversation> {
        let now = Utc::now();
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            r#"
            INSERT INTO conversations (id, chat_id, account_id, name, deleted, parent_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, FALSE, $5, $6, $6)
            RETURNING {}
            "#,
            CONVERSATION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(conversation.chat_id)
        .bind(conversation.account_id)
        .bind(&conversation.name)
        .bind(conversation.parent_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(conversation)
    }

    async fn list_chat_conversations(&self, chat_id: Uuid) -> StoreResult<Vec<Conversation>> {
        let conversations = sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {} FROM conversations WHERE chat_id = $1 AND deleted = FALSE ORDER BY created_at",
            CONVERSATION_COLUMNS
        ))
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(conversations)
    }
}
