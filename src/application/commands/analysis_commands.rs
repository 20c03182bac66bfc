//! Analysis Commands - LLM 相关写操作

use std::path::PathBuf;
use uuid::Uuid;

use crate::domain::novel::SummaryLength;

/// 生成章节摘要命令
#[derive(Debug, Clone)]
pub struct SummarizeChapter {
    pub chapter_id: Uuid,
    pub summary_length: SummaryLength,
}

/// 批量分析小说章节命令
#[derive(Debug, Clone)]
pub struct AnalyzeNovelChapters {
    pub novel_id: Uuid,
    /// 为 true 时连已分析的章节也重新分析
    pub force: bool,
    /// 覆盖配置中的提示词模板路径
    pub prompt_template: Option<PathBuf>,
}

/// 从外部文本分析单个章节命令（CLI 逐文件导入）
#[derive(Debug, Clone)]
pub struct AnalyzeChapterText {
    pub novel_id: Uuid,
    pub chapter_number: u32,
    pub content: String,
    pub prompt_template: Option<PathBuf>,
}

/// 就小说内容聊天命令
#[derive(Debug, Clone)]
pub struct ChatAboutNovel {
    pub novel_id: Uuid,
    pub message: String,
}
