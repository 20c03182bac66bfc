//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    ChatAboutNovelHandler, CreateNovelHandler, DeleteNovelHandler, ProcessNovelChaptersHandler,
    SummarizeChapterHandler,
    // Query handlers
    AnalyzeTextHandler, GetChapterHandler, GetCharactersHandler, GetNovelChaptersHandler,
    GetNovelHandler, ListNovelsHandler,
    // Ports
    ChapterRepositoryPort, CharacterRepositoryPort, ChatHistoryRepositoryPort, LlmEnginePort,
    NovelRepositoryPort,
};
use crate::config::{NlpConfig, StorageConfig};
use crate::domain::analysis::TextAnalyzer;
use crate::infrastructure::events::EventPublisher;
use crate::infrastructure::worker::AnalysisQueue;

/// 应用状态依赖的端口
pub struct AppPorts {
    pub novel_repo: Arc<dyn NovelRepositoryPort>,
    pub chapter_repo: Arc<dyn ChapterRepositoryPort>,
    pub character_repo: Arc<dyn CharacterRepositoryPort>,
    pub chat_repo: Arc<dyn ChatHistoryRepositoryPort>,
    pub llm: Arc<dyn LlmEnginePort>,
}

/// 应用状态
pub struct AppState {
    // ========== Config ==========
    pub storage: StorageConfig,

    // ========== Ports ==========
    pub novel_repo: Arc<dyn NovelRepositoryPort>,
    pub event_publisher: Arc<EventPublisher>,
    pub analysis_queue: AnalysisQueue,

    // ========== Command Handlers ==========
    pub create_novel_handler: CreateNovelHandler,
    pub process_novel_handler: ProcessNovelChaptersHandler,
    pub delete_novel_handler: DeleteNovelHandler,
    pub summarize_chapter_handler: SummarizeChapterHandler,
    pub chat_handler: ChatAboutNovelHandler,

    // ========== Query Handlers ==========
    pub get_novel_handler: GetNovelHandler,
    pub list_novels_handler: ListNovelsHandler,
    pub get_novel_chapters_handler: GetNovelChaptersHandler,
    pub get_chapter_handler: GetChapterHandler,
    pub get_characters_handler: GetCharactersHandler,
    pub analyze_text_handler: AnalyzeTextHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        ports: AppPorts,
        analyzer: Arc<TextAnalyzer>,
        event_publisher: Arc<EventPublisher>,
        analysis_queue: AnalysisQueue,
        storage: StorageConfig,
        nlp: &NlpConfig,
    ) -> Self {
        let AppPorts {
            novel_repo,
            chapter_repo,
            character_repo,
            chat_repo,
            llm,
        } = ports;

        Self {
            storage,

            // Ports
            novel_repo: novel_repo.clone(),
            event_publisher,
            analysis_queue,

            // Command handlers
            create_novel_handler: CreateNovelHandler::new(novel_repo.clone()),
            process_novel_handler: ProcessNovelChaptersHandler::new(
                novel_repo.clone(),
                chapter_repo.clone(),
                character_repo.clone(),
                analyzer.clone(),
            ),
            delete_novel_handler: DeleteNovelHandler::new(novel_repo.clone()),
            summarize_chapter_handler: SummarizeChapterHandler::new(
                chapter_repo.clone(),
                llm.clone(),
                nlp.max_chunk_size,
            ),
            chat_handler: ChatAboutNovelHandler::new(
                novel_repo.clone(),
                chapter_repo.clone(),
                chat_repo,
                llm,
            ),

            // Query handlers
            get_novel_handler: GetNovelHandler::new(novel_repo.clone()),
            list_novels_handler: ListNovelsHandler::new(novel_repo.clone()),
            get_novel_chapters_handler: GetNovelChaptersHandler::new(
                novel_repo.clone(),
                chapter_repo.clone(),
            ),
            get_chapter_handler: GetChapterHandler::new(chapter_repo),
            get_characters_handler: GetCharactersHandler::new(novel_repo, character_repo),
            analyze_text_handler: AnalyzeTextHandler::new(analyzer),
        }
    }
}
