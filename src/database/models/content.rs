use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row};
use uuid::Uuid;

use super::chat::Chat;

/// One question/answer exchange stored in a chat document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QaPair {
    pub response_id: String,
    pub question: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    /// Chats branched off this answer, in creation order
    #[serde(default)]
    pub branches: Vec<Uuid>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl QaPair {
    /// Fresh pair with a newly minted response id and no branches
    pub fn new(
        question: impl Into<String>,
        response: impl Into<String>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            response_id: Uuid::new_v4().to_string(),
            question: question.into(),
            response: response.into(),
            timestamp: Utc::now(),
            branches: Vec::new(),
            metadata,
        }
    }

    /// Copy of the exchange for a new chat, under a different response id
    pub fn duplicate(&self) -> Self {
        Self::new(
            self.question.clone(),
            self.response.clone(),
            self.metadata.clone(),
        )
    }
}

impl FromRow<'_, sqlx::postgres::PgRow> for QaPair {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(QaPair {
            response_id: row.try_get("response_id")?,
            question: row.try_get("question")?,
            response: row.try_get("response")?,
            timestamp: row.try_get("timestamp")?,
            branches: row.try_get("branches")?,
            metadata: row.try_get("metadata")?,
        })
    }
}

/// Content record of a chat, keyed by the chat id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatDocument {
    pub chat_id: Uuid,
    pub qa_pairs: Vec<QaPair>,
    pub active_branch_id: Option<Uuid>,
}

impl ChatDocument {
    pub fn empty(chat_id: Uuid) -> Self {
        Self {
            chat_id,
            qa_pairs: Vec::new(),
            active_branch_id: None,
        }
    }

    pub fn find_pair(&self, response_id: &str) -> Option<&QaPair> {
        self.qa_pairs
            .iter()
            .find(|pair| pair.response_id == response_id)
    }

    /// Every branch id referenced from the pairs, pair order then list order
    pub fn branch_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.qa_pairs
            .iter()
            .flat_map(|pair| pair.branches.iter().copied())
    }
}

/// Chat metadata joined with its document content
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChatWithContent {
    pub chat: Chat,
    pub qa_pairs: Vec<QaPair>,
    pub active_branch_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddMessageRequest {
    pub chat_id: Uuid,
    pub question: String,
}
