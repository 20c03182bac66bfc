//! Analysis Context - 文本分析限界上下文
//!
//! 职责:
//! - 章节分割与标题提取
//! - 实体、关系、关键词提取
//! - LLM 输出的 JSON 定位与分析数据解析
//!
//! 全部是纯同步计算，不持有跨调用的状态。

mod analysis_data;
mod entities;
mod json_locator;
mod keywords;
mod language;
mod ranking;
mod relationships;
mod segmenter;
mod title;

pub use analysis_data::{
    AnalysisData, AnalysisView, ChapterAnalysis, ChapterHighlights, CharacterEntry,
    CharacterMapping, SummarySection, ThemeEntry,
};
pub use entities::{basic_entities, EntityCategory, EntityExtractor, EntityMap};
pub use json_locator::extract_json_object;
pub use keywords::{KeywordExtractor, MAX_KEYWORDS, STOP_WORDS};
pub use language::{LanguageSupport, LinguisticModel, NamedEntity, NlpCapability, Token};
pub use ranking::{most_common, rank_by_frequency};
pub use relationships::{
    split_sentences, NetworkEdge, NetworkGraph, NetworkNode, RelationshipAnalysis,
    RelationshipEdge, RelationshipExtractor, RelationshipTier,
};
pub use segmenter::{
    segment, segment_chapters, select_boundary_pattern, split_by_length, BoundaryPattern,
    ChapterCandidate, SegmentConfig,
};
pub use title::{default_title, extract_title};

/// 文本分析门面
///
/// 持有注入的语言支持和分割配置，应用层只依赖它。
#[derive(Debug, Clone, Default)]
pub struct TextAnalyzer {
    segment_config: SegmentConfig,
    entities: EntityExtractor,
    relationships: RelationshipExtractor,
    keywords: KeywordExtractor,
    capability: NlpCapability,
}

impl TextAnalyzer {
    pub fn new(language: LanguageSupport, segment_config: SegmentConfig) -> Self {
        Self {
            segment_config,
            capability: language.capability(),
            entities: EntityExtractor::new(language.clone()),
            relationships: RelationshipExtractor::new(language.clone()),
            keywords: KeywordExtractor::new(language),
        }
    }

    pub fn capability(&self) -> NlpCapability {
        self.capability
    }

    pub fn segment(&self, content: &str) -> Vec<ChapterCandidate> {
        segment_chapters(content, &self.segment_config)
    }

    pub fn extract_entities(&self, text: &str) -> EntityMap {
        self.entities.extract(text)
    }

    pub fn extract_persons(&self, text: &str) -> Vec<String> {
        self.entities.persons(text)
    }

    pub fn extract_relationships(&self, text: &str, names: &[String]) -> RelationshipAnalysis {
        self.relationships.extract(text, names)
    }

    pub fn extract_keywords(&self, text: &str) -> Vec<String> {
        self.keywords.extract(text)
    }
}
