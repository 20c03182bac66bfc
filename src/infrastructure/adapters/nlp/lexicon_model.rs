//! Lexicon Model - 基于词典文件的语言学模型
//!
//! 词典文件格式（JSON）:
//! ```json
//! {
//!   "entities": {"Kim Dokja": "PERSON", "Seoul": "GPE"},
//!   "lemmas": {"walked": "walk"},
//!   "pos": {"constellation": "NOUN", "ancient": "ADJ"},
//!   "stop_words": ["the", "a"],
//!   "abbreviations": ["mr", "dr"]
//! }
//! ```

use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

use crate::domain::analysis::{LanguageSupport, LinguisticModel, NamedEntity, Token};

static RE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+(?:['-]\w+)*").expect("valid word regex"));

static RE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+(?:['-]\w+)*|[^\w\s]").expect("valid token regex"));

static RE_SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+\s+").expect("valid sentence break regex"));

/// 未登记词性的标签
const UNKNOWN_POS: &str = "X";

/// 模型加载错误
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("Failed to read lexicon {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse lexicon {path}: {message}")]
    Parse { path: String, message: String },
}

#[derive(Debug, Default, Deserialize)]
struct LexiconFile {
    #[serde(default)]
    entities: HashMap<String, String>,
    #[serde(default)]
    lemmas: HashMap<String, String>,
    #[serde(default)]
    pos: HashMap<String, String>,
    #[serde(default)]
    stop_words: Vec<String>,
    #[serde(default)]
    abbreviations: Vec<String>,
}

/// 词典模型
#[derive(Debug, Default)]
pub struct LexiconModel {
    /// 词序列（空格连接）到标签
    entities: HashMap<String, String>,
    /// 最长实体的词数
    max_entity_words: usize,
    lemmas: HashMap<String, String>,
    pos: HashMap<String, String>,
    stop_words: HashSet<String>,
    abbreviations: HashSet<String>,
}

impl LexiconModel {
    /// 从 JSON 文本构建
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let file: LexiconFile = serde_json::from_str(raw)?;
        Ok(Self::from_file(file))
    }

    /// 从文件加载
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ModelLoadError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_json(&raw).map_err(|e| ModelLoadError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn from_file(file: LexiconFile) -> Self {
        let entities: HashMap<String, String> = file
            .entities
            .into_iter()
            .filter_map(|(surface, label)| {
                let words: Vec<&str> = RE_WORD.find_iter(&surface).map(|m| m.as_str()).collect();
                (!words.is_empty()).then(|| (words.join(" "), label))
            })
            .collect();

        let max_entity_words = entities
            .keys()
            .map(|key| key.split(' ').count())
            .max()
            .unwrap_or(0);

        let lowercase_keys = |map: HashMap<String, String>| -> HashMap<String, String> {
            map.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect()
        };

        Self {
            entities,
            max_entity_words,
            lemmas: lowercase_keys(file.lemmas),
            pos: lowercase_keys(file.pos),
            stop_words: file.stop_words.iter().map(|w| w.to_lowercase()).collect(),
            abbreviations: file
                .abbreviations
                .iter()
                .map(|a| a.trim_end_matches('.').to_lowercase())
                .collect(),
        }
    }

    fn is_abbreviation(&self, preceding: &str) -> bool {
        let word = preceding
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .trim_start_matches(|c: char| !c.is_alphanumeric());
        !word.is_empty() && self.abbreviations.contains(&word.to_lowercase())
    }
}

impl LinguisticModel for LexiconModel {
    /// 按词边界做最长匹配
    fn entities(&self, text: &str) -> Vec<NamedEntity> {
        if self.entities.is_empty() {
            return Vec::new();
        }

        let words: Vec<&str> = RE_WORD.find_iter(text).map(|m| m.as_str()).collect();
        let mut found = Vec::new();
        let mut i = 0;

        while i < words.len() {
            let longest = (1..=self.max_entity_words.min(words.len() - i))
                .rev()
                .find_map(|len| {
                    let key = words[i..i + len].join(" ");
                    self.entities.get(&key).map(|label| (len, key, label))
                });

            match longest {
                Some((len, key, label)) => {
                    found.push(NamedEntity::new(key, label.clone()));
                    i += len;
                }
                None => i += 1,
            }
        }

        found
    }

    /// 在 `.`/`!`/`?` 之后且紧跟空白处断句，已知缩写后不断
    fn sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;

        for m in RE_SENTENCE_BREAK.find_iter(text) {
            let punct = m.as_str().trim_end();
            if punct == "." && self.is_abbreviation(&text[start..m.start()]) {
                continue;
            }

            let sentence = text[start..m.start() + punct.len()].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = m.end();
        }

        let rest = text[start..].trim();
        if !rest.is_empty() {
            sentences.push(rest.to_string());
        }

        sentences
    }

    fn tokens(&self, text: &str) -> Vec<Token> {
        RE_TOKEN
            .find_iter(text)
            .map(|m| {
                let word = m.as_str();
                let lower = word.to_lowercase();
                Token {
                    text: word.to_string(),
                    lemma: self.lemmas.get(&lower).cloned().unwrap_or_else(|| lower.clone()),
                    pos: self
                        .pos
                        .get(&lower)
                        .cloned()
                        .unwrap_or_else(|| UNKNOWN_POS.to_string()),
                    is_stop: self.stop_words.contains(&lower),
                    is_punct: !word.chars().any(char::is_alphanumeric),
                }
            })
            .collect()
    }
}

/// 启动时加载语言支持
///
/// 未配置时使用基础算法；文件缺失或无效时记录 warn 并降级。
pub fn load_language_support(model_path: Option<&Path>) -> LanguageSupport {
    let Some(path) = model_path else {
        tracing::info!("No linguistic model configured, using basic analysis");
        return LanguageSupport::Basic;
    };

    match LexiconModel::load(path) {
        Ok(model) => {
            tracing::info!(
                path = %path.display(),
                entities = model.entities.len(),
                lemmas = model.lemmas.len(),
                "Linguistic model loaded"
            );
            LanguageSupport::with_model(Arc::new(model))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Linguistic model unavailable, using basic analysis");
            LanguageSupport::Basic
        }
    }
}
