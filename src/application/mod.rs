//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Repository、LlmEngine、分析进度）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - prompts: LLM 提示词
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod prompts;
pub mod queries;

// Re-exports
pub use commands::{
    // Novel commands
    CreateNovel,
    DeleteNovel,
    ImportNovelMetadata,
    ProcessNovelChapters,
    // Analysis commands
    AnalyzeChapterText,
    AnalyzeNovelChapters,
    ChatAboutNovel,
    SummarizeChapter,
    // Handlers
    handlers::{
        AnalyzeChapterTextHandler, AnalyzeNovelChaptersHandler, ChapterOutcome,
        ChatAboutNovelHandler, ChatResponse, CreateNovelHandler, CreateNovelResponse,
        DeleteNovelHandler, ImportNovelMetadataHandler, ImportNovelsResponse,
        ProcessNovelChaptersHandler, ProcessNovelResponse, SummarizeChapterHandler,
        SummarizeChapterResponse,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Analysis progress
    AnalysisProgressPort,
    AnalysisReport,
    SilentProgress,
    // LLM engine
    CompletionRequest,
    CompletionResponse,
    LlmEnginePort,
    LlmError,
    LlmMessage,
    LlmRole,
    // Repositories
    ChapterAnalysisUpdate,
    ChapterRecord,
    ChapterRepositoryPort,
    ChapterSummaryUpdate,
    CharacterRecord,
    CharacterRepositoryPort,
    ChatHistoryRepositoryPort,
    ChatRecord,
    NovelRecord,
    NovelRepositoryPort,
    NovelSearch,
    NovelStatus,
    RepositoryError,
};

pub use queries::{
    // Novel queries
    ExportNovels,
    GetChapter,
    GetCharacters,
    GetNovel,
    GetNovelChapters,
    ListNovels,
    DEFAULT_PAGE_LIMIT,
    // Analysis queries
    AnalyzeText,
    // Handlers
    handlers::{
        AnalyzeTextHandler, ChapterResponse, ChaptersResponse, CharacterResponse,
        ExportNovelsHandler, ExportedNovel, GetChapterHandler, GetCharactersHandler,
        GetNovelChaptersHandler, GetNovelHandler, ListNovelsHandler, NovelResponse,
        TextAnalysisResponse,
    },
};
