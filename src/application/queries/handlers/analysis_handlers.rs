//! Analysis Query Handlers

use serde::Serialize;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::queries::AnalyzeText;
use crate::domain::analysis::{EntityCategory, EntityMap, RelationshipAnalysis, TextAnalyzer};
use crate::domain::novel::{NovelContent, ReadingStats};

/// 分章预览
#[derive(Debug, Clone, Serialize)]
pub struct ChapterPreview {
    pub chapter_number: u32,
    pub title: String,
    pub word_count: usize,
    pub reading_time_minutes: usize,
}

/// 即时分析结果
#[derive(Debug, Clone, Serialize)]
pub struct TextAnalysisResponse {
    pub capability: &'static str,
    pub chapters: Vec<ChapterPreview>,
    pub entities: EntityMap,
    pub keywords: Vec<String>,
    pub relationships: RelationshipAnalysis,
}

/// AnalyzeText Handler
pub struct AnalyzeTextHandler {
    analyzer: Arc<TextAnalyzer>,
}

impl AnalyzeTextHandler {
    pub fn new(analyzer: Arc<TextAnalyzer>) -> Self {
        Self { analyzer }
    }

    pub async fn handle(&self, query: AnalyzeText) -> Result<TextAnalysisResponse, ApplicationError> {
        let text = NovelContent::new(query.text)?.into_inner();
        let analyzer = self.analyzer.clone();
        let names = query.names;

        tokio::task::spawn_blocking(move || analyze(&analyzer, &text, names))
            .await
            .map_err(|e| ApplicationError::internal(format!("Text analysis task failed: {}", e)))
    }
}

fn analyze(analyzer: &TextAnalyzer, text: &str, names: Option<Vec<String>>) -> TextAnalysisResponse {
    let chapters = analyzer
        .segment(text)
        .into_iter()
        .map(|candidate| {
            let stats = ReadingStats::of(&candidate.body);
            ChapterPreview {
                chapter_number: candidate.ordinal,
                title: candidate.title,
                word_count: stats.word_count,
                reading_time_minutes: stats.reading_time_minutes,
            }
        })
        .collect();

    let entities = analyzer.extract_entities(text);
    let names = names
        .filter(|names| !names.is_empty())
        .or_else(|| entities.get(&EntityCategory::Person).cloned())
        .unwrap_or_default();

    TextAnalysisResponse {
        capability: analyzer.capability().as_str(),
        chapters,
        keywords: analyzer.extract_keywords(text),
        relationships: analyzer.extract_relationships(text, &names),
        entities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> String {
        let mut text = String::new();
        for n in 1..=3 {
            text.push_str(&format!("Chapter {}\n", n));
            text.push_str("Alice met Bob at the harbor. Alice and Bob walked along the shore. ");
            text.push_str("The lighthouse keeper watched them quietly from the tower above.\n");
        }
        text
    }

    #[tokio::test]
    async fn test_analyze_text_uses_detected_persons() {
        let handler = AnalyzeTextHandler::new(Arc::new(TextAnalyzer::default()));
        let response = handler
            .handle(AnalyzeText {
                text: sample(),
                names: None,
            })
            .await
            .unwrap();

        assert_eq!(response.capability, "basic");
        assert_eq!(response.chapters.len(), 3);
        assert!(response.entities.contains_key(&EntityCategory::Person));
        assert!(!response.keywords.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_text_with_explicit_names() {
        let handler = AnalyzeTextHandler::new(Arc::new(TextAnalyzer::default()));
        let response = handler
            .handle(AnalyzeText {
                text: sample(),
                names: Some(vec!["Alice".into(), "Bob".into()]),
            })
            .await
            .unwrap();

        let edge = &response.relationships.relationships[0];
        assert_eq!((edge.source.as_str(), edge.target.as_str()), ("Alice", "Bob"));
        assert_eq!(response.relationships.network.nodes.len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_text_rejects_short_text() {
        let handler = AnalyzeTextHandler::new(Arc::new(TextAnalyzer::default()));
        let result = handler
            .handle(AnalyzeText {
                text: "too short".into(),
                names: None,
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
    }
}
