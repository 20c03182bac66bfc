//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod analysis_progress;
mod llm_engine;
mod repositories;

pub use analysis_progress::{AnalysisProgressPort, AnalysisReport, SilentProgress};
pub use llm_engine::{
    CompletionRequest, CompletionResponse, LlmEnginePort, LlmError, LlmMessage, LlmRole,
};
pub use repositories::{
    ChapterAnalysisUpdate, ChapterRecord, ChapterRepositoryPort, ChapterSummaryUpdate,
    CharacterRecord, CharacterRepositoryPort, ChatHistoryRepositoryPort, ChatRecord,
    NovelRecord, NovelRepositoryPort, NovelSearch, NovelStatus, RepositoryError,
};
