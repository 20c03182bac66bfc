//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::analysis::AnalysisData;
use crate::domain::novel::{CharacterLink, NovelMetadata};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

// ============================================================================
// Novel Repository
// ============================================================================

/// 小说处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NovelStatus {
    /// 分章处理中
    Processing,
    /// 已就绪
    Ready,
    /// 处理失败
    Failed,
}

impl NovelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NovelStatus::Processing => "processing",
            NovelStatus::Ready => "ready",
            NovelStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(NovelStatus::Processing),
            "ready" => Some(NovelStatus::Ready),
            "failed" => Some(NovelStatus::Failed),
            _ => None,
        }
    }
}

impl Default for NovelStatus {
    fn default() -> Self {
        NovelStatus::Ready
    }
}

/// 小说实体（用于持久化）
#[derive(Debug, Clone)]
pub struct NovelRecord {
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
    pub status: NovelStatus,
    pub total_chapters: u32,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl NovelRecord {
    /// 新建一条处理中的小说记录
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            author: None,
            description: None,
            genres: Vec::new(),
            tags: Vec::new(),
            average_rating: None,
            vote_count: None,
            year: None,
            status_in_coo: None,
            status: NovelStatus::Processing,
            total_chapters: 0,
            created_at: now,
            last_updated: now,
        }
    }

    /// 由导入的元数据生成记录（状态为 ready，尚无章节）
    pub fn from_metadata(metadata: NovelMetadata) -> Self {
        let mut record = Self::new(metadata.title);
        record.author = metadata.author;
        record.description = metadata.description;
        record.genres = metadata.genres;
        record.tags = metadata.tags;
        record.average_rating = metadata.average_rating;
        record.vote_count = metadata.vote_count;
        record.year = metadata.year;
        record.status_in_coo = metadata.status_in_coo;
        record.status = NovelStatus::Ready;
        if let Some(last_updated) = metadata.last_updated {
            record.last_updated = last_updated;
        }
        record
    }

    /// 导出为元数据格式
    pub fn to_metadata(&self) -> NovelMetadata {
        NovelMetadata {
            title: self.title.clone(),
            author: self.author.clone(),
            description: self.description.clone(),
            genres: self.genres.clone(),
            tags: self.tags.clone(),
            average_rating: self.average_rating,
            vote_count: self.vote_count,
            year: self.year,
            status_in_coo: self.status_in_coo.clone(),
            last_updated: Some(self.last_updated),
        }
    }
}

/// 小说检索条件
///
/// - search: 标题或简介的不区分大小写子串
/// - author: 作者子串
/// - genres / tags: 命中任意一个即可
#[derive(Debug, Clone, Default)]
pub struct NovelSearch {
    pub search: Option<String>,
    pub author: Option<String>,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub skip: u32,
    pub limit: u32,
}

/// Novel Repository Port
#[async_trait]
pub trait NovelRepositoryPort: Send + Sync {
    /// 保存小说（存在则更新）
    async fn save(&self, novel: &NovelRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找小说
    async fn find_by_id(&self, id: Uuid) -> Result<Option<NovelRecord>, RepositoryError>;

    /// 根据标题精确查找
    async fn find_by_title(&self, title: &str) -> Result<Option<NovelRecord>, RepositoryError>;

    /// 获取所有小说
    async fn find_all(&self) -> Result<Vec<NovelRecord>, RepositoryError>;

    /// 条件检索
    async fn search(&self, criteria: &NovelSearch) -> Result<Vec<NovelRecord>, RepositoryError>;

    /// 更新小说状态
    async fn update_status(
        &self,
        id: Uuid,
        status: NovelStatus,
        total_chapters: u32,
    ) -> Result<(), RepositoryError>;

    /// 删除小说及其章节、人物、聊天记录
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

// ============================================================================
// Chapter Repository
// ============================================================================

/// 章节实体（用于持久化）
#[derive(Debug, Clone)]
pub struct ChapterRecord {
    pub id: Uuid,
    pub novel_id: Uuid,
    pub chapter_number: u32,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub analysis_data: Option<AnalysisData>,
    pub key_events: Vec<String>,
    pub characters_mentioned: Vec<String>,
    pub themes: Vec<String>,
    pub sentiment_score: Option<f64>,
    pub word_count: u32,
    pub reading_time_minutes: u32,
    pub is_processed: bool,
    pub processing_timestamp: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChapterRecord {
    /// 是否已有 LLM 分析结果
    pub fn is_analyzed(&self) -> bool {
        self.is_processed && self.analysis_data.is_some()
    }
}

/// 摘要写回
#[derive(Debug, Clone, Default)]
pub struct ChapterSummaryUpdate {
    pub summary: String,
    pub key_events: Vec<String>,
    pub characters_mentioned: Vec<String>,
}

/// 分析结果写回
#[derive(Debug, Clone, Default)]
pub struct ChapterAnalysisUpdate {
    pub summary: Option<String>,
    pub key_events: Vec<String>,
    pub characters_mentioned: Vec<String>,
    pub themes: Vec<String>,
    pub sentiment_score: Option<f64>,
    pub analysis_data: AnalysisData,
}

/// Chapter Repository Port
#[async_trait]
pub trait ChapterRepositoryPort: Send + Sync {
    /// 保存章节（同一小说同一章节号存在则覆盖）
    async fn save(&self, chapter: &ChapterRecord) -> Result<(), RepositoryError>;

    /// 批量保存章节
    async fn save_batch(&self, chapters: &[ChapterRecord]) -> Result<(), RepositoryError>;

    /// 根据 ID 查找章节
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChapterRecord>, RepositoryError>;

    /// 根据章节号查找
    async fn find_by_number(
        &self,
        novel_id: Uuid,
        chapter_number: u32,
    ) -> Result<Option<ChapterRecord>, RepositoryError>;

    /// 分页获取小说章节（按章节号升序）
    async fn find_by_novel(
        &self,
        novel_id: Uuid,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<ChapterRecord>, RepositoryError>;

    /// 获取小说全部章节（按章节号升序）
    async fn find_all_by_novel(&self, novel_id: Uuid)
        -> Result<Vec<ChapterRecord>, RepositoryError>;

    /// 写回摘要
    async fn update_summary(
        &self,
        id: Uuid,
        update: &ChapterSummaryUpdate,
    ) -> Result<(), RepositoryError>;

    /// 写回分析结果并标记已处理
    async fn update_analysis(
        &self,
        id: Uuid,
        update: &ChapterAnalysisUpdate,
    ) -> Result<(), RepositoryError>;
}

// ============================================================================
// Character Repository
// ============================================================================

/// 人物实体（用于持久化）
#[derive(Debug, Clone)]
pub struct CharacterRecord {
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

/// Character Repository Port
#[async_trait]
pub trait CharacterRepositoryPort: Send + Sync {
    /// 替换小说的全部人物
    async fn replace_for_novel(
        &self,
        novel_id: Uuid,
        characters: &[CharacterRecord],
    ) -> Result<(), RepositoryError>;

    /// 获取小说人物（按出场次数降序）
    async fn find_by_novel(&self, novel_id: Uuid) -> Result<Vec<CharacterRecord>, RepositoryError>;
}

// ============================================================================
// Chat History Repository
// ============================================================================

/// 聊天记录实体
#[derive(Debug, Clone)]
pub struct ChatRecord {
    pub id: Uuid,
    pub novel_id: Uuid,
    pub user_message: String,
    pub assistant_response: String,
    pub context_used: Value,
    pub model_used: String,
    pub response_time_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// Chat History Repository Port
#[async_trait]
pub trait ChatHistoryRepositoryPort: Send + Sync {
    /// 保存一轮对话
    async fn save(&self, record: &ChatRecord) -> Result<(), RepositoryError>;

    /// 获取小说最近的对话（按时间倒序）
    async fn find_recent(
        &self,
        novel_id: Uuid,
        limit: u32,
    ) -> Result<Vec<ChatRecord>, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [NovelStatus::Processing, NovelStatus::Ready, NovelStatus::Failed] {
            assert_eq!(NovelStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(NovelStatus::from_str("deleted"), None);
    }

    #[test]
    fn test_new_record_is_processing() {
        let record = NovelRecord::new("Omniscient Reader's Viewpoint");
        assert_eq!(record.status, NovelStatus::Processing);
        assert_eq!(record.total_chapters, 0);
    }

    #[test]
    fn test_metadata_record_is_ready() {
        let metadata = NovelMetadata {
            title: "Solo Leveling".into(),
            author: Some("Chugong".into()),
            genres: vec!["Action".into()],
            vote_count: Some(12),
            ..Default::default()
        };

        let record = NovelRecord::from_metadata(metadata);
        assert_eq!(record.status, NovelStatus::Ready);
        assert_eq!(record.author.as_deref(), Some("Chugong"));

        let exported = record.to_metadata();
        assert_eq!(exported.title, "Solo Leveling");
        assert_eq!(exported.vote_count, Some(12));
        assert!(exported.last_updated.is_some());
    }
}
