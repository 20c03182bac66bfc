//! 命名实体提取

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use super::language::LanguageSupport;
use super::ranking::{most_common, rank_by_frequency};

// 首字母大写的 ASCII 单词
static RE_CAPITALIZED_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+\b").expect("valid capitalized word regex"));

/// 基础路径排除的常见句首词
const COMMON_CAPITALIZED: [&str; 11] = [
    "The", "This", "That", "There", "Then", "When", "Where", "What", "Who", "How", "Why",
];

/// 模型路径排除的代词
const PRONOUNS: [&str; 4] = ["he", "she", "it", "they"];

/// 基础路径保留的候选数
const FALLBACK_TOP_N: usize = 20;

/// 实体类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityCategory {
    Person,
    Location,
    Organization,
}

impl EntityCategory {
    /// 模型标签映射，未知标签返回 None
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "PERSON" => Some(EntityCategory::Person),
            "GPE" | "LOC" => Some(EntityCategory::Location),
            "ORG" => Some(EntityCategory::Organization),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCategory::Person => "PERSON",
            EntityCategory::Location => "LOCATION",
            EntityCategory::Organization => "ORGANIZATION",
        }
    }
}

/// 类别 -> 按频率排序的实体名
pub type EntityMap = BTreeMap<EntityCategory, Vec<String>>;

/// 实体提取器
#[derive(Debug, Clone, Default)]
pub struct EntityExtractor {
    language: LanguageSupport,
}

impl EntityExtractor {
    pub fn new(language: LanguageSupport) -> Self {
        Self { language }
    }

    /// 提取命名实体
    pub fn extract(&self, text: &str) -> EntityMap {
        match &self.language {
            LanguageSupport::Model(model) => {
                let mut buckets: BTreeMap<EntityCategory, Vec<String>> = BTreeMap::new();
                for entity in model.entities(text) {
                    let Some(category) = EntityCategory::from_label(&entity.label) else {
                        continue;
                    };
                    if category == EntityCategory::Person && !is_plausible_person(&entity.text) {
                        continue;
                    }
                    buckets.entry(category).or_default().push(entity.text);
                }

                buckets
                    .into_iter()
                    .map(|(category, names)| {
                        let ranked = rank_by_frequency(names)
                            .into_iter()
                            .map(|(name, _)| name)
                            .collect();
                        (category, ranked)
                    })
                    .collect()
            }
            LanguageSupport::Basic => basic_entities(text),
        }
    }

    /// 仅返回人物
    pub fn persons(&self, text: &str) -> Vec<String> {
        self.extract(text)
            .remove(&EntityCategory::Person)
            .unwrap_or_default()
    }
}

fn is_plausible_person(name: &str) -> bool {
    name.chars().count() > 2 && !PRONOUNS.contains(&name.to_lowercase().as_str())
}

/// 基础路径：首字母大写词频率统计
///
/// 取前 20 个并只保留出现超过一次的，结果总是只有 Person 一类（可能为空）。
pub fn basic_entities(text: &str) -> EntityMap {
    let candidates = RE_CAPITALIZED_WORD
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|word| !COMMON_CAPITALIZED.contains(word));

    let frequent: Vec<String> = most_common(candidates, FALLBACK_TOP_N)
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect();

    let mut map = EntityMap::new();
    map.insert(EntityCategory::Person, frequent);
    map
}
