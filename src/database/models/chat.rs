use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    #[default]
    Personal,
    Branch,
}

impl ChatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatType::Personal => "personal",
            ChatType::Branch => "branch",
        }
    }
}

impl fmt::Display for ChatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(ChatType::Personal),
            "branch" => Ok(ChatType::Branch),
            other => Err(format!("unknown chat type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Chat {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub chat_type: ChatType,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow<'_, sqlx::postgres::PgRow> for Chat {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        let chat_type: String = row.try_get("chat_type")?;
        Ok(Chat {
            id: row.try_get("id")?,
            account_id: row.try_get("account_id")?,
            name: row.try_get("name")?,
            chat_type: chat_type
                .parse()
                .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Parent-link record between chats. Written when a branch is created.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Conversation {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub deleted: bool,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow<'_, sqlx::postgres::PgRow> for Conversation {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(Conversation {
            id: row.try_get("id")?,
            chat_id: row.try_get("chat_id")?,
            account_id: row.try_get("account_id")?,
            name: row.try_get("name")?,
            deleted: row.try_get("deleted")?,
            parent_id: row.try_get("parent_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewConversation {
    pub chat_id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

/// Column changes for a chat update. `updated_at` is always refreshed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ChatChanges {
    pub name: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateChatRequest {
    pub name: String,
    #[serde(default)]
    pub chat_type: ChatType,
}

pub type UpdateChatRequest = ChatChanges;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ChatIdQuery {
    pub chat_id: Uuid,
}
