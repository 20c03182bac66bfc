//! SQLite Chat History Repository

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::columns::{db_error, from_json_text, parse_time, parse_uuid, to_json_text};
use super::DbPool;
use crate::application::ports::{ChatHistoryRepositoryPort, ChatRecord, RepositoryError};

/// SQLite Chat History Repository
pub struct SqliteChatHistoryRepository {
    pool: DbPool,
}

impl SqliteChatHistoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ChatRow {
    id: String,
    novel_id: String,
    user_message: String,
    assistant_response: String,
    context_used: String,
    model_used: String,
    response_time_ms: i64,
    created_at: String,
}

impl TryFrom<ChatRow> for ChatRecord {
    type Error = RepositoryError;

    fn try_from(row: ChatRow) -> Result<Self, Self::Error> {
        Ok(ChatRecord {
            id: parse_uuid(&row.id)?,
            novel_id: parse_uuid(&row.novel_id)?,
            user_message: row.user_message,
            assistant_response: row.assistant_response,
            context_used: from_json_text(&row.context_used, "chat_history.context_used"),
            model_used: row.model_used,
            response_time_ms: row.response_time_ms.max(0) as u64,
            created_at: parse_time(&row.created_at)?,
        })
    }
}

#[async_trait]
impl ChatHistoryRepositoryPort for SqliteChatHistoryRepository {
    async fn save(&self, record: &ChatRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO chat_history (id, novel_id, user_message, assistant_response,
                context_used, model_used, response_time_ms, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.novel_id.to_string())
        .bind(&record.user_message)
        .bind(&record.assistant_response)
        .bind(to_json_text(&record.context_used)?)
        .bind(&record.model_used)
        .bind(i64::try_from(record.response_time_ms).unwrap_or(i64::MAX))
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn find_recent(
        &self,
        novel_id: Uuid,
        limit: u32,
    ) -> Result<Vec<ChatRecord>, RepositoryError> {
        let rows: Vec<ChatRow> = sqlx::query_as(
            r#"
            SELECT id, novel_id, user_message, assistant_response, context_used, model_used,
                response_time_ms, created_at
            FROM chat_history
            WHERE novel_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(novel_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(ChatRecord::try_from).collect()
    }
}
