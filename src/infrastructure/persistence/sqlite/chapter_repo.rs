//! SQLite Chapter Repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, Sqlite, Transaction};
use uuid::Uuid;

use super::columns::{db_error, from_json_text, parse_time, parse_uuid, to_json_text};
use super::DbPool;
use crate::application::ports::{
    ChapterAnalysisUpdate, ChapterRecord, ChapterRepositoryPort, ChapterSummaryUpdate,
    RepositoryError,
};
use crate::domain::analysis::AnalysisData;

const CHAPTER_COLUMNS: &str = "id, novel_id, chapter_number, title, content, summary, \
     analysis_data, key_events, characters_mentioned, themes, sentiment_score, word_count, \
     reading_time_minutes, is_processed, processing_timestamp, created_at, updated_at";

/// SQLite Chapter Repository
pub struct SqliteChapterRepository {
    pool: DbPool,
}

impl SqliteChapterRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ChapterRow {
    id: String,
    novel_id: String,
    chapter_number: i64,
    title: String,
    content: String,
    summary: Option<String>,
    analysis_data: Option<String>,
    key_events: String,
    characters_mentioned: String,
    themes: String,
    sentiment_score: Option<f64>,
    word_count: i64,
    reading_time_minutes: i64,
    is_processed: bool,
    processing_timestamp: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ChapterRow> for ChapterRecord {
    type Error = RepositoryError;

    fn try_from(row: ChapterRow) -> Result<Self, Self::Error> {
        Ok(ChapterRecord {
            id: parse_uuid(&row.id)?,
            novel_id: parse_uuid(&row.novel_id)?,
            chapter_number: row.chapter_number.max(0) as u32,
            title: row.title,
            content: row.content,
            summary: row.summary,
            analysis_data: row.analysis_data.as_deref().map(AnalysisData::from_stored),
            key_events: from_json_text(&row.key_events, "chapters.key_events"),
            characters_mentioned: from_json_text(
                &row.characters_mentioned,
                "chapters.characters_mentioned",
            ),
            themes: from_json_text(&row.themes, "chapters.themes"),
            sentiment_score: row.sentiment_score,
            word_count: row.word_count.max(0) as u32,
            reading_time_minutes: row.reading_time_minutes.max(0) as u32,
            is_processed: row.is_processed,
            processing_timestamp: row
                .processing_timestamp
                .as_deref()
                .map(parse_time)
                .transpose()?,
            created_at: parse_time(&row.created_at)?,
            updated_at: parse_time(&row.updated_at)?,
        })
    }
}

/// 按 (novel_id, chapter_number) upsert，冲突时保留原行的 id 和 created_at
async fn upsert(
    tx: &mut Transaction<'_, Sqlite>,
    chapter: &ChapterRecord,
) -> Result<(), RepositoryError> {
    let analysis_data = chapter
        .analysis_data
        .as_ref()
        .map(|data| to_json_text(&data.to_value()))
        .transpose()?;

    sqlx::query(
        r#"
        INSERT INTO chapters (id, novel_id, chapter_number, title, content, summary,
            analysis_data, key_events, characters_mentioned, themes, sentiment_score,
            word_count, reading_time_minutes, is_processed, processing_timestamp,
            created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(novel_id, chapter_number) DO UPDATE SET
            title = excluded.title,
            content = excluded.content,
            summary = excluded.summary,
            analysis_data = excluded.analysis_data,
            key_events = excluded.key_events,
            characters_mentioned = excluded.characters_mentioned,
            themes = excluded.themes,
            sentiment_score = excluded.sentiment_score,
            word_count = excluded.word_count,
            reading_time_minutes = excluded.reading_time_minutes,
            is_processed = excluded.is_processed,
            processing_timestamp = excluded.processing_timestamp,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(chapter.id.to_string())
    .bind(chapter.novel_id.to_string())
    .bind(i64::from(chapter.chapter_number))
    .bind(&chapter.title)
    .bind(&chapter.content)
    .bind(&chapter.summary)
    .bind(analysis_data)
    .bind(to_json_text(&chapter.key_events)?)
    .bind(to_json_text(&chapter.characters_mentioned)?)
    .bind(to_json_text(&chapter.themes)?)
    .bind(chapter.sentiment_score)
    .bind(i64::from(chapter.word_count))
    .bind(i64::from(chapter.reading_time_minutes))
    .bind(chapter.is_processed)
    .bind(chapter.processing_timestamp.map(|t| t.to_rfc3339()))
    .bind(chapter.created_at.to_rfc3339())
    .bind(chapter.updated_at.to_rfc3339())
    .execute(&mut **tx)
    .await
    .map_err(db_error)?;

    Ok(())
}

#[async_trait]
impl ChapterRepositoryPort for SqliteChapterRepository {
    async fn save(&self, chapter: &ChapterRecord) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        upsert(&mut tx, chapter).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn save_batch(&self, chapters: &[ChapterRecord]) -> Result<(), RepositoryError> {
        if chapters.is_empty() {
            return Ok(());
        }

        // 单个事务写入整批章节
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        for chapter in chapters {
            upsert(&mut tx, chapter).await?;
        }
        tx.commit().await.map_err(db_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChapterRecord>, RepositoryError> {
        let row: Option<ChapterRow> =
            sqlx::query_as(&format!("SELECT {} FROM chapters WHERE id = ?", CHAPTER_COLUMNS))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(ChapterRecord::try_from).transpose()
    }

    async fn find_by_number(
        &self,
        novel_id: Uuid,
        chapter_number: u32,
    ) -> Result<Option<ChapterRecord>, RepositoryError> {
        let row: Option<ChapterRow> = sqlx::query_as(&format!(
            "SELECT {} FROM chapters WHERE novel_id = ? AND chapter_number = ?",
            CHAPTER_COLUMNS
        ))
        .bind(novel_id.to_string())
        .bind(i64::from(chapter_number))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(ChapterRecord::try_from).transpose()
    }

    async fn find_by_novel(
        &self,
        novel_id: Uuid,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<ChapterRecord>, RepositoryError> {
        let rows: Vec<ChapterRow> = sqlx::query_as(&format!(
            "SELECT {} FROM chapters WHERE novel_id = ? ORDER BY chapter_number LIMIT ? OFFSET ?",
            CHAPTER_COLUMNS
        ))
        .bind(novel_id.to_string())
        .bind(i64::from(limit))
        .bind(i64::from(skip))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(ChapterRecord::try_from).collect()
    }

    async fn find_all_by_novel(
        &self,
        novel_id: Uuid,
    ) -> Result<Vec<ChapterRecord>, RepositoryError> {
        let rows: Vec<ChapterRow> = sqlx::query_as(&format!(
            "SELECT {} FROM chapters WHERE novel_id = ? ORDER BY chapter_number",
            CHAPTER_COLUMNS
        ))
        .bind(novel_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(ChapterRecord::try_from).collect()
    }

    async fn update_summary(
        &self,
        id: Uuid,
        update: &ChapterSummaryUpdate,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE chapters
            SET summary = ?, key_events = ?, characters_mentioned = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.summary)
        .bind(to_json_text(&update.key_events)?)
        .bind(to_json_text(&update.characters_mentioned)?)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Chapter {}", id)));
        }

        Ok(())
    }

    async fn update_analysis(
        &self,
        id: Uuid,
        update: &ChapterAnalysisUpdate,
    ) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();

        // 模型未给出摘要或情感分时保留原值
        let result = sqlx::query(
            r#"
            UPDATE chapters
            SET summary = COALESCE(?, summary),
                key_events = ?,
                characters_mentioned = ?,
                themes = ?,
                sentiment_score = COALESCE(?, sentiment_score),
                analysis_data = ?,
                is_processed = 1,
                processing_timestamp = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.summary)
        .bind(to_json_text(&update.key_events)?)
        .bind(to_json_text(&update.characters_mentioned)?)
        .bind(to_json_text(&update.themes)?)
        .bind(update.sentiment_score)
        .bind(to_json_text(&update.analysis_data.to_value())?)
        .bind(&now)
        .bind(&now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Chapter {}", id)));
        }

        Ok(())
    }
}
