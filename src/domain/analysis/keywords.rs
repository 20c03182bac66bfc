//! 关键词 / 主题提取

use regex::Regex;
use std::sync::LazyLock;

use super::language::LanguageSupport;
use super::ranking::most_common;

static RE_ALPHA_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]+\b").expect("valid alpha word regex"));

/// 最多返回的关键词数
pub const MAX_KEYWORDS: usize = 20;

/// 基础路径的英文停用词
pub const STOP_WORDS: [&str; 57] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "is", "was", "are", "were", "be", "been", "have", "has", "had", "do", "does", "did", "will",
    "would", "could", "should", "may", "might", "must", "can", "shall", "this", "that", "these",
    "those", "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "my",
    "your", "his", "its", "our", "their",
];

/// 关键词提取器
#[derive(Debug, Clone, Default)]
pub struct KeywordExtractor {
    language: LanguageSupport,
}

impl KeywordExtractor {
    pub fn new(language: LanguageSupport) -> Self {
        Self { language }
    }

    /// 提取至多 20 个关键词，按频率降序，同频按首次出现
    pub fn extract(&self, text: &str) -> Vec<String> {
        let candidates: Vec<String> = match &self.language {
            LanguageSupport::Model(model) => model
                .tokens(text)
                .into_iter()
                .filter(|token| {
                    matches!(token.pos.as_str(), "NOUN" | "ADJ")
                        && !token.is_stop
                        && !token.is_punct
                        && token.text.chars().count() > 3
                })
                .map(|token| token.lemma.to_lowercase())
                .collect(),
            LanguageSupport::Basic => basic_candidates(text),
        };

        most_common(candidates, MAX_KEYWORDS)
            .into_iter()
            .map(|(word, _)| word)
            .collect()
    }
}

fn basic_candidates(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    RE_ALPHA_WORD
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|word| word.len() > 3 && !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}
