//! Analysis Command Handlers - 摘要与章节分析

use chrono::Utc;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{AnalyzeChapterText, AnalyzeNovelChapters, SummarizeChapter};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AnalysisProgressPort, AnalysisReport, ChapterAnalysisUpdate, ChapterRecord,
    ChapterRepositoryPort, ChapterSummaryUpdate, CompletionRequest, LlmEnginePort, LlmMessage,
    NovelRecord, NovelRepositoryPort, NovelStatus,
};
use crate::application::prompts::{
    analysis_prompt, fill_analysis_template, summary_prompt, AnalysisPromptFields,
};
use crate::domain::analysis::{extract_json_object, AnalysisData};
use crate::domain::novel::{ReadingStats, SummaryLength};

const SUMMARY_TEMPERATURE: f32 = 0.3;
const SUMMARY_MAX_TOKENS: u32 = 1000;

// ============================================================================
// SummarizeChapter
// ============================================================================

/// 摘要响应
#[derive(Debug, Clone)]
pub struct SummarizeChapterResponse {
    pub chapter_id: Uuid,
    pub summary_length: SummaryLength,
    pub summary: String,
    pub key_events: Vec<String>,
    pub characters_mentioned: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SummaryReply {
    summary: String,
    #[serde(default)]
    key_events: Vec<String>,
    #[serde(default)]
    characters_mentioned: Vec<String>,
}

/// 解析摘要回复，非 JSON 时整段内容作为摘要
fn parse_summary_reply(content: &str) -> ChapterSummaryUpdate {
    let reply = extract_json_object(content)
        .and_then(|map| serde_json::from_value::<SummaryReply>(map.into()).ok());

    match reply {
        Some(reply) => ChapterSummaryUpdate {
            summary: reply.summary,
            key_events: reply.key_events,
            characters_mentioned: reply.characters_mentioned,
        },
        None => ChapterSummaryUpdate {
            summary: content.trim().to_string(),
            key_events: Vec::new(),
            characters_mentioned: Vec::new(),
        },
    }
}

/// SummarizeChapter Handler
pub struct SummarizeChapterHandler {
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    llm: Arc<dyn LlmEnginePort>,
    max_content_chars: usize,
}

impl SummarizeChapterHandler {
    pub fn new(
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        llm: Arc<dyn LlmEnginePort>,
        max_content_chars: usize,
    ) -> Self {
        Self {
            chapter_repo,
            llm,
            max_content_chars,
        }
    }

    pub async fn handle(
        &self,
        command: SummarizeChapter,
    ) -> Result<SummarizeChapterResponse, ApplicationError> {
        let chapter = self
            .chapter_repo
            .find_by_id(command.chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", command.chapter_id))?;

        let prompt = summary_prompt(
            &chapter.title,
            &chapter.content,
            command.summary_length,
            self.max_content_chars,
        );
        let request = CompletionRequest::new(vec![LlmMessage::user(prompt)])
            .temperature(SUMMARY_TEMPERATURE)
            .max_tokens(SUMMARY_MAX_TOKENS);

        let response = self.llm.complete(request).await?;
        let update = parse_summary_reply(&response.content);

        self.chapter_repo.update_summary(chapter.id, &update).await?;

        tracing::info!(
            chapter_id = %chapter.id,
            novel_id = %chapter.novel_id,
            chapter_number = chapter.chapter_number,
            summary_length = command.summary_length.as_str(),
            "Chapter summary generated"
        );

        Ok(SummarizeChapterResponse {
            chapter_id: chapter.id,
            summary_length: command.summary_length,
            summary: update.summary,
            key_events: update.key_events,
            characters_mentioned: update.characters_mentioned,
        })
    }
}

// ============================================================================
// Chapter analysis (shared by batch and single-file analysis)
// ============================================================================

/// 读取分析提示词模板
async fn load_prompt_template(path: &Path) -> Result<String, ApplicationError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        ApplicationError::storage(format!(
            "Failed to load prompt template {}: {}",
            path.display(),
            e
        ))
    })
}

/// 单章 LLM 分析
struct ChapterAnalyst {
    llm: Arc<dyn LlmEnginePort>,
}

impl ChapterAnalyst {
    async fn analyze(
        &self,
        novel: &NovelRecord,
        chapter_number: u32,
        content: &str,
        template: &str,
    ) -> Result<ChapterAnalysisUpdate, ApplicationError> {
        let stats = ReadingStats::of(content);
        let fields = AnalysisPromptFields {
            novel_id: novel.id,
            novel_title: &novel.title,
            chapter_number,
            word_count: stats.word_count,
            reading_time_minutes: stats.reading_time_minutes,
        };
        let prompt = analysis_prompt(content, &fill_analysis_template(template, &fields));

        tracing::debug!(
            novel_id = %novel.id,
            chapter_number = chapter_number,
            word_count = stats.word_count,
            model = self.llm.model_name(),
            "Requesting chapter analysis"
        );

        let request = CompletionRequest::new(vec![LlmMessage::user(prompt)]).json_mode();
        let response = self.llm.complete(request).await?;

        let map = extract_json_object(&response.content).ok_or_else(|| {
            ApplicationError::ExternalServiceError(
                "LLM response did not contain a JSON object".to_string(),
            )
        })?;

        let analysis_data = AnalysisData::from_map(map);
        let highlights = analysis_data.highlights();

        Ok(ChapterAnalysisUpdate {
            summary: highlights.summary,
            key_events: highlights.key_events,
            characters_mentioned: highlights.characters_mentioned,
            themes: highlights.themes,
            sentiment_score: highlights.sentiment_score,
            analysis_data,
        })
    }
}

// ============================================================================
// AnalyzeNovelChapters
// ============================================================================

/// AnalyzeNovelChapters Handler - 逐章分析，单章失败不影响整批
pub struct AnalyzeNovelChaptersHandler {
    novel_repo: Arc<dyn NovelRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    analyst: ChapterAnalyst,
    progress: Arc<dyn AnalysisProgressPort>,
    template_path: PathBuf,
}

impl AnalyzeNovelChaptersHandler {
    pub fn new(
        novel_repo: Arc<dyn NovelRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        llm: Arc<dyn LlmEnginePort>,
        progress: Arc<dyn AnalysisProgressPort>,
        template_path: PathBuf,
    ) -> Self {
        Self {
            novel_repo,
            chapter_repo,
            analyst: ChapterAnalyst { llm },
            progress,
            template_path,
        }
    }

    pub async fn handle(
        &self,
        command: AnalyzeNovelChapters,
    ) -> Result<AnalysisReport, ApplicationError> {
        let novel_id = command.novel_id;

        let novel = self
            .novel_repo
            .find_by_id(novel_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Novel", novel_id))?;

        if novel.status == NovelStatus::Processing {
            return Err(ApplicationError::invalid_state(format!(
                "Novel {} is still processing",
                novel_id
            )));
        }

        let template_path = command.prompt_template.as_deref().unwrap_or(self.template_path.as_path());
        let template = load_prompt_template(template_path).await?;

        let chapters = self.chapter_repo.find_all_by_novel(novel_id).await?;
        self.progress.analysis_started(novel_id, chapters.len());

        tracing::info!(
            novel_id = %novel_id,
            title = %novel.title,
            chapters = chapters.len(),
            force = command.force,
            "Chapter analysis started"
        );

        let mut report = AnalysisReport::default();

        for chapter in chapters {
            if !command.force && chapter.is_analyzed() {
                tracing::debug!(
                    novel_id = %novel_id,
                    chapter_number = chapter.chapter_number,
                    "Chapter already analyzed, skipping"
                );
                report.skipped += 1;
                continue;
            }

            let result = match self
                .analyst
                .analyze(&novel, chapter.chapter_number, &chapter.content, &template)
                .await
            {
                Ok(update) => self
                    .chapter_repo
                    .update_analysis(chapter.id, &update)
                    .await
                    .map_err(ApplicationError::from),
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => {
                    tracing::info!(
                        novel_id = %novel_id,
                        chapter_number = chapter.chapter_number,
                        "Chapter analyzed"
                    );
                    report.analyzed += 1;
                    self.progress.chapter_analyzed(novel_id, chapter.chapter_number);
                }
                Err(e) => {
                    tracing::warn!(
                        novel_id = %novel_id,
                        chapter_number = chapter.chapter_number,
                        error = %e,
                        "Chapter analysis failed, skipping"
                    );
                    report.failed += 1;
                    self.progress
                        .chapter_failed(novel_id, chapter.chapter_number, &e.to_string());
                }
            }
        }

        tracing::info!(
            novel_id = %novel_id,
            analyzed = report.analyzed,
            skipped = report.skipped,
            failed = report.failed,
            "Chapter analysis completed"
        );
        self.progress.analysis_completed(novel_id, &report);

        Ok(report)
    }
}

// ============================================================================
// AnalyzeChapterText
// ============================================================================

/// 单章分析结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterOutcome {
    /// 已分析并保存
    Analyzed,
    /// 之前已分析过
    Skipped,
}

/// AnalyzeChapterText Handler - 分析外部文本并写入（或覆盖）对应章节
pub struct AnalyzeChapterTextHandler {
    novel_repo: Arc<dyn NovelRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    analyst: ChapterAnalyst,
    template_path: PathBuf,
}

impl AnalyzeChapterTextHandler {
    pub fn new(
        novel_repo: Arc<dyn NovelRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        llm: Arc<dyn LlmEnginePort>,
        template_path: PathBuf,
    ) -> Self {
        Self {
            novel_repo,
            chapter_repo,
            analyst: ChapterAnalyst { llm },
            template_path,
        }
    }

    pub async fn handle(
        &self,
        command: AnalyzeChapterText,
    ) -> Result<ChapterOutcome, ApplicationError> {
        let novel = self
            .novel_repo
            .find_by_id(command.novel_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Novel", command.novel_id))?;

        let existing = self
            .chapter_repo
            .find_by_number(novel.id, command.chapter_number)
            .await?;

        if existing.as_ref().is_some_and(ChapterRecord::is_analyzed) {
            tracing::info!(
                novel_id = %novel.id,
                chapter_number = command.chapter_number,
                "Chapter already analyzed, skipping"
            );
            return Ok(ChapterOutcome::Skipped);
        }

        let template_path = command.prompt_template.as_deref().unwrap_or(self.template_path.as_path());
        let template = load_prompt_template(template_path).await?;

        let update = self
            .analyst
            .analyze(&novel, command.chapter_number, &command.content, &template)
            .await?;

        let now = Utc::now();
        let stats = ReadingStats::of(&command.content);
        let (id, created_at) = existing
            .map(|chapter| (chapter.id, chapter.created_at))
            .unwrap_or_else(|| (Uuid::new_v4(), now));

        let record = ChapterRecord {
            id,
            novel_id: novel.id,
            chapter_number: command.chapter_number,
            title: format!("{} - Chapter {}", novel.title, command.chapter_number),
            content: command.content,
            summary: update.summary,
            analysis_data: Some(update.analysis_data),
            key_events: update.key_events,
            characters_mentioned: update.characters_mentioned,
            themes: update.themes,
            sentiment_score: update.sentiment_score,
            word_count: stats.word_count as u32,
            reading_time_minutes: stats.reading_time_minutes as u32,
            is_processed: true,
            processing_timestamp: Some(now),
            created_at,
            updated_at: now,
        };

        self.chapter_repo.save(&record).await?;

        tracing::info!(
            novel_id = %novel.id,
            chapter_number = record.chapter_number,
            title = %record.title,
            "Chapter analyzed and stored"
        );

        Ok(ChapterOutcome::Analyzed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_reply_json() {
        let update = parse_summary_reply(
            r#"{"summary": "Dokja survives.", "key_events": ["Scenario begins"], "characters_mentioned": ["Dokja"]}"#,
        );
        assert_eq!(update.summary, "Dokja survives.");
        assert_eq!(update.key_events, vec!["Scenario begins"]);
        assert_eq!(update.characters_mentioned, vec!["Dokja"]);
    }

    #[test]
    fn test_summary_reply_plain_text_is_kept() {
        let update = parse_summary_reply("  The chapter opens on a subway.  ");
        assert_eq!(update.summary, "The chapter opens on a subway.");
        assert!(update.key_events.is_empty());
        assert!(update.characters_mentioned.is_empty());
    }

    #[test]
    fn test_summary_reply_without_summary_field_is_kept_raw() {
        let raw = r#"{"text": "no summary key"}"#;
        let update = parse_summary_reply(raw);
        assert_eq!(update.summary, raw);
    }
}
