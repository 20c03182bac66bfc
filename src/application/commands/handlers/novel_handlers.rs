//! Novel Command Handlers

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{
    CreateNovel, DeleteNovel, ImportNovelMetadata, ProcessNovelChapters,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ChapterRecord, ChapterRepositoryPort, CharacterRecord, CharacterRepositoryPort, NovelRecord,
    NovelRepositoryPort, NovelStatus,
};
use crate::domain::analysis::TextAnalyzer;
use crate::domain::novel::{
    parse_metadata_document, CharacterRoster, NovelContent, ReadingStats, Title,
};

/// 每章保留的主题关键词数
pub const CHAPTER_THEME_COUNT: usize = 10;

// ============================================================================
// CreateNovel (Step 1: Create processing record)
// ============================================================================

/// 创建小说响应（立即返回，status=processing）
#[derive(Debug, Clone)]
pub struct CreateNovelResponse {
    pub id: Uuid,
    pub title: String,
    pub status: NovelStatus,
}

/// CreateNovel Handler - 创建 processing 状态的记录
pub struct CreateNovelHandler {
    novel_repo: Arc<dyn NovelRepositoryPort>,
}

impl CreateNovelHandler {
    pub fn new(novel_repo: Arc<dyn NovelRepositoryPort>) -> Self {
        Self { novel_repo }
    }

    /// 校验标题与正文，创建 processing 状态的小说记录，立即返回 ID
    pub async fn handle(&self, command: CreateNovel) -> Result<CreateNovelResponse, ApplicationError> {
        let title = Title::new(command.title)?;
        NovelContent::new(command.content)?;

        let mut novel = NovelRecord::new(title.as_str());
        novel.author = command.author.filter(|a| !a.trim().is_empty());
        novel.description = command.description.filter(|d| !d.trim().is_empty());

        self.novel_repo.save(&novel).await?;

        tracing::info!(
            novel_id = %novel.id,
            title = %novel.title,
            "Novel created (processing)"
        );

        Ok(CreateNovelResponse {
            id: novel.id,
            title: novel.title,
            status: NovelStatus::Processing,
        })
    }
}

// ============================================================================
// ProcessNovelChapters (Step 2: Async chapter processing)
// ============================================================================

/// 分章处理响应
#[derive(Debug, Clone)]
pub struct ProcessNovelResponse {
    pub id: Uuid,
    pub title: String,
    pub total_chapters: u32,
    pub total_characters: usize,
}

/// 分章与人物统计的结果
struct ProcessedText {
    chapters: Vec<ChapterRecord>,
    characters: Vec<CharacterRecord>,
}

/// ProcessNovelChapters Handler - 分章、提取人物与主题
pub struct ProcessNovelChaptersHandler {
    novel_repo: Arc<dyn NovelRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    character_repo: Arc<dyn CharacterRepositoryPort>,
    analyzer: Arc<TextAnalyzer>,
}

impl ProcessNovelChaptersHandler {
    pub fn new(
        novel_repo: Arc<dyn NovelRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        character_repo: Arc<dyn CharacterRepositoryPort>,
        analyzer: Arc<TextAnalyzer>,
    ) -> Self {
        Self {
            novel_repo,
            chapter_repo,
            character_repo,
            analyzer,
        }
    }

    /// 处理失败时把小说标记为 failed
    pub async fn handle(
        &self,
        command: ProcessNovelChapters,
    ) -> Result<ProcessNovelResponse, ApplicationError> {
        let novel_id = command.novel_id;

        match self.process(command).await {
            Ok(response) => Ok(response),
            Err(e) => {
                if let Err(status_err) = self
                    .novel_repo
                    .update_status(novel_id, NovelStatus::Failed, 0)
                    .await
                {
                    tracing::warn!(
                        novel_id = %novel_id,
                        error = %status_err,
                        "Failed to mark novel as failed"
                    );
                }
                Err(e)
            }
        }
    }

    async fn process(
        &self,
        command: ProcessNovelChapters,
    ) -> Result<ProcessNovelResponse, ApplicationError> {
        let novel_id = command.novel_id;

        let novel = self
            .novel_repo
            .find_by_id(novel_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Novel", novel_id))?;

        // 纯 CPU 计算，放到阻塞线程池
        let analyzer = self.analyzer.clone();
        let processed = tokio::task::spawn_blocking(move || {
            analyze_text(&analyzer, novel_id, &command.content)
        })
        .await
        .map_err(|e| ApplicationError::internal(format!("Chapter processing task failed: {}", e)))?;

        let total_chapters = processed.chapters.len() as u32;
        let total_characters = processed.characters.len();

        self.chapter_repo.save_batch(&processed.chapters).await?;
        self.character_repo
            .replace_for_novel(novel_id, &processed.characters)
            .await?;
        self.novel_repo
            .update_status(novel_id, NovelStatus::Ready, total_chapters)
            .await?;

        tracing::info!(
            novel_id = %novel_id,
            title = %novel.title,
            total_chapters = total_chapters,
            total_characters = total_characters,
            capability = self.analyzer.capability().as_str(),
            "Novel chapters processed"
        );

        Ok(ProcessNovelResponse {
            id: novel_id,
            title: novel.title,
            total_chapters,
            total_characters,
        })
    }
}

fn analyze_text(analyzer: &TextAnalyzer, novel_id: Uuid, content: &str) -> ProcessedText {
    let now = Utc::now();
    let mut roster = CharacterRoster::new();

    let chapters: Vec<ChapterRecord> = analyzer
        .segment(content)
        .into_iter()
        .map(|candidate| {
            let stats = ReadingStats::of(&candidate.body);
            let persons = analyzer.extract_persons(&candidate.body);
            let mut themes = analyzer.extract_keywords(&candidate.body);
            themes.truncate(CHAPTER_THEME_COUNT);

            roster.record_chapter(candidate.ordinal, &persons, &candidate.body);

            ChapterRecord {
                id: Uuid::new_v4(),
                novel_id,
                chapter_number: candidate.ordinal,
                title: candidate.title,
                content: candidate.body,
                summary: None,
                analysis_data: None,
                key_events: Vec::new(),
                characters_mentioned: persons,
                themes,
                sentiment_score: None,
                word_count: stats.word_count as u32,
                reading_time_minutes: stats.reading_time_minutes as u32,
                is_processed: false,
                processing_timestamp: None,
                created_at: now,
                updated_at: now,
            }
        })
        .collect();

    let relationships = analyzer.extract_relationships(content, &roster.names());
    roster.apply_relationships(&relationships);

    let characters = roster
        .into_profiles()
        .into_iter()
        .map(|profile| CharacterRecord {
            id: Uuid::new_v4(),
            novel_id,
            name: profile.name,
            description: None,
            character_type: None,
            first_appearance_chapter: profile.first_appearance_chapter,
            last_appearance_chapter: profile.last_appearance_chapter,
            relationships: profile.relationships,
            key_traits: Vec::new(),
            mentions_count: profile.mentions_count,
            chapters_appeared: profile.chapters_appeared,
        })
        .collect();

    ProcessedText {
        chapters,
        characters,
    }
}

// ============================================================================
// DeleteNovel
// ============================================================================

/// DeleteNovel Handler
pub struct DeleteNovelHandler {
    novel_repo: Arc<dyn NovelRepositoryPort>,
}

impl DeleteNovelHandler {
    pub fn new(novel_repo: Arc<dyn NovelRepositoryPort>) -> Self {
        Self { novel_repo }
    }

    pub async fn handle(&self, command: DeleteNovel) -> Result<(), ApplicationError> {
        let novel_id = command.novel_id;

        // 检查小说是否存在
        let novel = self
            .novel_repo
            .find_by_id(novel_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Novel", novel_id))?;

        self.novel_repo.delete(novel_id).await?;

        tracing::info!(
            novel_id = %novel_id,
            title = %novel.title,
            "Novel deleted"
        );

        Ok(())
    }
}

// ============================================================================
// ImportNovelMetadata
// ============================================================================

/// 导入结果
#[derive(Debug, Clone, Default)]
pub struct ImportNovelsResponse {
    pub imported: Vec<Uuid>,
    pub skipped: usize,
}

/// ImportNovelMetadata Handler - 单条记录失败不影响其他记录
pub struct ImportNovelMetadataHandler {
    novel_repo: Arc<dyn NovelRepositoryPort>,
}

impl ImportNovelMetadataHandler {
    pub fn new(novel_repo: Arc<dyn NovelRepositoryPort>) -> Self {
        Self { novel_repo }
    }

    pub async fn handle(
        &self,
        command: ImportNovelMetadata,
    ) -> Result<ImportNovelsResponse, ApplicationError> {
        let raw = tokio::fs::read_to_string(&command.path).await.map_err(|e| {
            ApplicationError::storage(format!(
                "Failed to read metadata file {}: {}",
                command.path.display(),
                e
            ))
        })?;

        let entries = parse_metadata_document(&raw)?;
        let mut response = ImportNovelsResponse::default();

        for entry in entries {
            let metadata = match entry {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping invalid novel metadata");
                    response.skipped += 1;
                    continue;
                }
            };

            let record = NovelRecord::from_metadata(metadata);
            match self.novel_repo.save(&record).await {
                Ok(()) => {
                    tracing::info!(novel_id = %record.id, title = %record.title, "Novel imported");
                    response.imported.push(record.id);
                }
                Err(e) => {
                    tracing::warn!(title = %record.title, error = %e, "Failed to import novel");
                    response.skipped += 1;
                }
            }
        }

        tracing::info!(
            path = %command.path.display(),
            imported = response.imported.len(),
            skipped = response.skipped,
            "Novel metadata import finished"
        );

        Ok(response)
    }
}
