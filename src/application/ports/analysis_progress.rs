//! Analysis Progress Port - 章节分析进度通知

use uuid::Uuid;

/// 一批章节分析的结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct AnalysisReport {
    pub analyzed: u32,
    pub skipped: u32,
    pub failed: u32,
}

/// 进度观察者
///
/// 通知是尽力而为的，实现不能阻塞调用方。
pub trait AnalysisProgressPort: Send + Sync {
    fn analysis_started(&self, novel_id: Uuid, total_chapters: usize);

    fn chapter_analyzed(&self, novel_id: Uuid, chapter_number: u32);

    fn chapter_failed(&self, novel_id: Uuid, chapter_number: u32, error: &str);

    fn analysis_completed(&self, novel_id: Uuid, report: &AnalysisReport);
}

/// 不需要通知时使用（CLI）
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl AnalysisProgressPort for SilentProgress {
    fn analysis_started(&self, _novel_id: Uuid, _total_chapters: usize) {}

    fn chapter_analyzed(&self, _novel_id: Uuid, _chapter_number: u32) {}

    fn chapter_failed(&self, _novel_id: Uuid, _chapter_number: u32, _error: &str) {}

    fn analysis_completed(&self, _novel_id: Uuid, _report: &AnalysisReport) {}
}
