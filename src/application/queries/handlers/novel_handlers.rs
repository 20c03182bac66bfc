//! Novel Query Handlers

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    ChapterRecord, ChapterRepositoryPort, CharacterRecord, CharacterRepositoryPort, NovelRecord,
    NovelRepositoryPort, NovelSearch,
};
use crate::application::queries::{
    ExportNovels, GetChapter, GetCharacters, GetNovel, GetNovelChapters, ListNovels,
};
use crate::domain::novel::{CharacterLink, NovelMetadata};

// ============================================================================
// Response DTOs
// ============================================================================

/// 小说详情响应
#[derive(Debug, Clone, Serialize)]
pub struct NovelResponse {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub average_rating: Option<f64>,
    pub vote_count: Option<i64>,
    pub year: Option<i32>,
    pub status_in_coo: Option<String>,
    pub status: String,
    pub total_chapters: u32,
    pub created_at: String,
    pub last_updated: String,
}

impl From<NovelRecord> for NovelResponse {
    fn from(record: NovelRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            author: record.author,
            description: record.description,
            genres: record.genres,
            tags: record.tags,
            average_rating: record.average_rating,
            vote_count: record.vote_count,
            year: record.year,
            status_in_coo: record.status_in_coo,
            status: record.status.as_str().to_string(),
            total_chapters: record.total_chapters,
            created_at: record.created_at.to_rfc3339(),
            last_updated: record.last_updated.to_rfc3339(),
        }
    }
}

/// 章节响应
#[derive(Debug, Clone, Serialize)]
pub struct ChapterResponse {
    pub id: Uuid,
    pub novel_id: Uuid,
    pub chapter_number: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub summary: Option<String>,
    pub key_events: Vec<String>,
    pub characters_mentioned: Vec<String>,
    pub themes: Vec<String>,
    pub sentiment_score: Option<f64>,
    pub word_count: u32,
    pub reading_time_minutes: u32,
    pub is_processed: bool,
    pub processing_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_data: Option<Value>,
}

impl ChapterResponse {
    fn from_record(record: ChapterRecord, include_content: bool, include_analysis: bool) -> Self {
        Self {
            id: record.id,
            novel_id: record.novel_id,
            chapter_number: record.chapter_number,
            title: record.title,
            content: include_content.then_some(record.content),
            summary: record.summary,
            key_events: record.key_events,
            characters_mentioned: record.characters_mentioned,
            themes: record.themes,
            sentiment_score: record.sentiment_score,
            word_count: record.word_count,
            reading_time_minutes: record.reading_time_minutes,
            is_processed: record.is_processed,
            processing_timestamp: record.processing_timestamp.map(|t| t.to_rfc3339()),
            analysis_data: if include_analysis {
                record.analysis_data.map(|data| data.to_value())
            } else {
                None
            },
        }
    }
}

/// 章节列表响应
#[derive(Debug, Clone, Serialize)]
pub struct ChaptersResponse {
    pub novel_id: Uuid,
    pub total: usize,
    pub chapters: Vec<ChapterResponse>,
}

/// 人物响应
#[derive(Debug, Clone, Serialize)]
pub struct CharacterResponse {
    pub id: Uuid,
    pub novel_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub character_type: Option<String>,
    pub first_appearance_chapter: Option<u32>,
    pub last_appearance_chapter: Option<u32>,
    pub relationships: Vec<CharacterLink>,
    pub key_traits: Vec<String>,
    pub mentions_count: u32,
    pub chapters_appeared: Vec<u32>,
}

impl From<CharacterRecord> for CharacterResponse {
    fn from(record: CharacterRecord) -> Self {
        Self {
            id: record.id,
            novel_id: record.novel_id,
            name: record.name,
            description: record.description,
            character_type: record.character_type,
            first_appearance_chapter: record.first_appearance_chapter,
            last_appearance_chapter: record.last_appearance_chapter,
            relationships: record.relationships,
            key_traits: record.key_traits,
            mentions_count: record.mentions_count,
            chapters_appeared: record.chapters_appeared,
        }
    }
}

/// 导出的小说元数据，可被元数据导入直接读回
#[derive(Debug, Clone, Serialize)]
pub struct ExportedNovel {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub metadata: NovelMetadata,
    pub created_at: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GetNovel Handler
pub struct GetNovelHandler {
    novel_repo: Arc<dyn NovelRepositoryPort>,
}

impl GetNovelHandler {
    pub fn new(novel_repo: Arc<dyn NovelRepositoryPort>) -> Self {
        Self { novel_repo }
    }

    pub async fn handle(&self, query: GetNovel) -> Result<NovelResponse, ApplicationError> {
        let novel = self
            .novel_repo
            .find_by_id(query.novel_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Novel", query.novel_id))?;

        Ok(NovelResponse::from(novel))
    }
}

/// ListNovels Handler
pub struct ListNovelsHandler {
    novel_repo: Arc<dyn NovelRepositoryPort>,
}

impl ListNovelsHandler {
    pub fn new(novel_repo: Arc<dyn NovelRepositoryPort>) -> Self {
        Self { novel_repo }
    }

    pub async fn handle(&self, query: ListNovels) -> Result<Vec<NovelResponse>, ApplicationError> {
        let criteria = NovelSearch {
            search: query.search.filter(|s| !s.trim().is_empty()),
            author: query.author.filter(|s| !s.trim().is_empty()),
            genres: query.genres,
            tags: query.tags,
            skip: query.skip,
            limit: query.limit,
        };

        let novels = self.novel_repo.search(&criteria).await?;
        Ok(novels.into_iter().map(NovelResponse::from).collect())
    }
}

/// GetNovelChapters Handler
pub struct GetNovelChaptersHandler {
    novel_repo: Arc<dyn NovelRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
}

impl GetNovelChaptersHandler {
    pub fn new(
        novel_repo: Arc<dyn NovelRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
    ) -> Self {
        Self {
            novel_repo,
            chapter_repo,
        }
    }

    pub async fn handle(&self, query: GetNovelChapters) -> Result<ChaptersResponse, ApplicationError> {
        // 验证小说存在
        self.novel_repo
            .find_by_id(query.novel_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Novel", query.novel_id))?;

        let chapters = self
            .chapter_repo
            .find_by_novel(query.novel_id, query.skip, query.limit)
            .await?;

        let chapters: Vec<ChapterResponse> = chapters
            .into_iter()
            .map(|c| ChapterResponse::from_record(c, query.include_content, false))
            .collect();

        Ok(ChaptersResponse {
            novel_id: query.novel_id,
            total: chapters.len(),
            chapters,
        })
    }
}

/// GetChapter Handler
pub struct GetChapterHandler {
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
}

impl GetChapterHandler {
    pub fn new(chapter_repo: Arc<dyn ChapterRepositoryPort>) -> Self {
        Self { chapter_repo }
    }

    pub async fn handle(&self, query: GetChapter) -> Result<ChapterResponse, ApplicationError> {
        let chapter = self
            .chapter_repo
            .find_by_id(query.chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", query.chapter_id))?;

        Ok(ChapterResponse::from_record(chapter, query.include_content, true))
    }
}

/// GetCharacters Handler
pub struct GetCharactersHandler {
    novel_repo: Arc<dyn NovelRepositoryPort>,
    character_repo: Arc<dyn CharacterRepositoryPort>,
}

impl GetCharactersHandler {
    pub fn new(
        novel_repo: Arc<dyn NovelRepositoryPort>,
        character_repo: Arc<dyn CharacterRepositoryPort>,
    ) -> Self {
        Self {
            novel_repo,
            character_repo,
        }
    }

    pub async fn handle(
        &self,
        query: GetCharacters,
    ) -> Result<Vec<CharacterResponse>, ApplicationError> {
        self.novel_repo
            .find_by_id(query.novel_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Novel", query.novel_id))?;

        let characters = self.character_repo.find_by_novel(query.novel_id).await?;
        Ok(characters.into_iter().map(CharacterResponse::from).collect())
    }
}

/// ExportNovels Handler
pub struct ExportNovelsHandler {
    novel_repo: Arc<dyn NovelRepositoryPort>,
}

impl ExportNovelsHandler {
    pub fn new(novel_repo: Arc<dyn NovelRepositoryPort>) -> Self {
        Self { novel_repo }
    }

    pub async fn handle(&self, _query: ExportNovels) -> Result<Vec<ExportedNovel>, ApplicationError> {
        let novels = self.novel_repo.find_all().await?;

        Ok(novels
            .into_iter()
            .map(|novel| ExportedNovel {
                id: novel.id,
                metadata: novel.to_metadata(),
                created_at: novel.created_at.to_rfc3339(),
            })
            .collect())
    }
}
