use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::database::models::{ChatDocument, QaPair};
use crate::database::store::{ContentStore, StoreResult};

const QA_PAIR_COLUMNS: &str = "response_id, question, response, timestamp, branches, metadata";

/// Create the document tables if they are missing.
///
/// The content database is separate from the migrated relational one, so its
/// schema is applied idempotently on every start.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chat_documents (
            chat_id UUID PRIMARY KEY,
            active_branch_id UUID,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS qa_pairs (
            id BIGSERIAL PRIMARY KEY,
            chat_id UUID NOT NULL REFERENCES chat_documents(chat_id) ON DELETE CASCADE,
            response_id TEXT NOT NULL,
            question TEXT NOT NULL,
            response TEXT NOT NULL,
            timestamp TIMESTAMPTZ NOT NULL,
            branches UUID[] NOT NULL DEFAULT '{}',
            metadata JSONB
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_qa_pairs_chat_response ON qa_pairs(chat_id, response_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn create_document(&self, chat_id: Uuid) -> StoreResult<ChatDocument> {
        sqlx::query(
            "INSERT INTO chat_documents (chat_id, created_at) VALUES ($1, $2) ON CONFLICT (chat_id) DO NOTHING",
        )
        .bind(chat_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(ChatDocument::empty(chat_id))
    }

    async fn get_document(&self, chat_id: Uuid) -> StoreResult<Option<ChatDocument>> {
        let Some(row) =
            sqlx::query("SELECT chat_id, active_branch_id FROM chat_documents WHERE chat_id = $1")
                .bind(chat_id)
                .fetch_optional(&self.pool)
                .await?
        else {
            return Ok(None);
        };

        let qa_pairs = sqlx::query_as::<_, QaPair>(&format!(
            "SELECT {} FROM qa_pairs WHERE chat_id = $1 ORDER BY id",
            QA_PAIR_COLUMNS
        ))
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(ChatDocument {
            chat_id: row.try_get("chat_id")?,
            qa_pairs,
            active_branch_id: row.try_get("active_branch_id")?,
        }))
    }

    async fn delete_document(&self, chat_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM chat_documents WHERE chat_id = $1")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn push_qa_pair(&self, chat_id: Uuid, pair: QaPair) -> StoreResult<bool> {
        // Inserts nothing when the document does not exist
        let result = sqlx::query(
            r#"
            INSERT INTO qa_pairs (chat_id, response_id, question, response, timestamp, branches, metadata)
            SELECT chat_id, $2, $3, $4, $5, $6, $7 FROM chat_documents WHERE chat_id = $1
            "#,
        )
        .bind(chat_id)
        .bind(&pair.response_id)
        .bind(&pair.question)
        .bind(&pair.response)
        .bind(pair.timestamp)
        .bind(&pair.branches)
        .bind(&pair.metadata)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_qa_pair(&self, chat_id: Uuid, response_id: &str) -> StoreResult<Option<QaPair>> {
        let pair = sqlx::query_as::<_, QaPair>(&format!(
            "SELECT {} FROM qa_pairs WHERE chat_id = $1 AND response_id = $2 ORDER BY id LIMIT 1",
            QA_PAIR_COLUMNS
        ))
        .bind(chat_id)
        .bind(response_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pair)
    }

    async fn add_branch_to_pair(
        &self,
        chat_id: Uuid,
        response_id: &str,
        branch_id: Uuid,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE qa_pairs SET branches = array_append(branches, $3)
            WHERE id = (
                SELECT id FROM qa_pairs WHERE chat_id = $1 AND response_id = $2 ORDER BY id LIMIT 1
            )
            "#,
        )
        .bind(chat_id)
        .bind(response_id)
        .bind(branch_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_branch_from_pair(
        &self,
        chat_id: Uuid,
        response_id: &str,
        branch_id: Uuid,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE qa_pairs SET branches = array_remove(branches, $3)
            WHERE chat_id = $1 AND response_id = $2 AND $3 = ANY(branches)
            "#,
        )
        .bind(chat_id)
        .bind(response_id)
        .bind(branch_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_active_branch(&self, chat_id: Uuid, branch_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE chat_documents SET active_branch_id = $2
            WHERE chat_id = $1 AND active_branch_id IS DISTINCT FROM $2
            "#,
        )
        .bind(chat_id)
        .bind(branch_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
