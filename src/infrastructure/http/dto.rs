//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{
    ChatResponse, CreateNovelResponse, SummarizeChapterResponse, DEFAULT_PAGE_LIMIT,
};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self::success(Empty {})
    }
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

fn default_summary_length() -> String {
    "medium".to_string()
}

// ============================================================================
// Novel DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateNovelRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// 单个 ID 请求（get / delete / characters）
#[derive(Debug, Deserialize)]
pub struct NovelIdRequest {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ListNovelsRequest {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct NovelChaptersRequest {
    pub id: Uuid,
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub include_content: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub id: Uuid,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeNovelRequest {
    pub id: Uuid,
    #[serde(default)]
    pub force: bool,
}

/// 创建 / 上传小说响应
#[derive(Debug, Serialize)]
pub struct NovelCreatedResponse {
    pub id: Uuid,
    pub title: String,
    pub status: &'static str,
}

impl From<CreateNovelResponse> for NovelCreatedResponse {
    fn from(r: CreateNovelResponse) -> Self {
        Self {
            id: r.id,
            title: r.title,
            status: r.status.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatReplyResponse {
    pub chat_id: Uuid,
    pub response: String,
    pub references: Vec<String>,
    pub suggested_questions: Vec<String>,
}

impl From<ChatResponse> for ChatReplyResponse {
    fn from(r: ChatResponse) -> Self {
        Self {
            chat_id: r.chat_id,
            response: r.response,
            references: r.references,
            suggested_questions: r.suggested_questions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisQueuedResponse {
    pub novel_id: Uuid,
    pub queued: bool,
}

// ============================================================================
// Chapter DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GetChapterRequest {
    pub id: Uuid,
    #[serde(default = "default_true")]
    pub include_content: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SummarizeChapterRequest {
    pub id: Uuid,
    #[serde(default = "default_summary_length")]
    pub summary_length: String,
}

#[derive(Debug, Serialize)]
pub struct ChapterSummaryResponse {
    pub chapter_id: Uuid,
    pub summary_length: &'static str,
    pub summary: String,
    pub key_events: Vec<String>,
    pub characters_mentioned: Vec<String>,
}

impl From<SummarizeChapterResponse> for ChapterSummaryResponse {
    fn from(r: SummarizeChapterResponse) -> Self {
        Self {
            chapter_id: r.chapter_id,
            summary_length: r.summary_length.as_str(),
            summary: r.summary,
            key_events: r.key_events,
            characters_mentioned: r.characters_mentioned,
        }
    }
}

// ============================================================================
// Analysis DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    pub text: String,
    #[serde(default)]
    pub names: Option<Vec<String>>,
}
