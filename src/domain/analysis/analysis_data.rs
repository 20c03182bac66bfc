//! 章节分析结果（LLM 返回的 JSON）
//!
//! 原始对象整体保存，读写时原样往返。章节主字段从宽松解析的类型化视图中提取：
//! 类型不符的字段在视图里退化为默认值，但不影响保存的原始数据。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// 宽松解析：失败时取默认值
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// 宽松解析数组：非数组为空，元素解析失败的跳过
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SummarySection {
    #[serde(deserialize_with = "lenient")]
    pub concise: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub detailed: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub key_events: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThemeEntry {
    #[serde(deserialize_with = "lenient")]
    pub theme: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChapterAnalysis {
    #[serde(deserialize_with = "lenient")]
    pub summary: SummarySection,
    #[serde(deserialize_with = "lenient_vec")]
    pub themes: Vec<ThemeEntry>,
    pub sentiment_analysis: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CharacterEntry {
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CharacterMapping {
    #[serde(deserialize_with = "lenient_vec")]
    pub characters: Vec<CharacterEntry>,
}

/// 原始数据的类型化视图，只读取用于章节主字段的部分
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisView {
    #[serde(deserialize_with = "lenient")]
    pub chapter_analysis: ChapterAnalysis,
    #[serde(deserialize_with = "lenient")]
    pub character_mapping: CharacterMapping,
}

/// 章节分析数据
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisData {
    raw: Map<String, Value>,
    view: AnalysisView,
}

impl AnalysisData {
    /// 从 LLM 返回的 JSON 对象构建
    pub fn from_map(map: Map<String, Value>) -> Self {
        let view = match serde_json::from_value::<AnalysisView>(Value::Object(map.clone())) {
            Ok(view) => view,
            Err(e) => {
                tracing::warn!(error = %e, "Analysis payload has unexpected shape, keeping raw fields only");
                AnalysisView::default()
            }
        };
        Self { raw: map, view }
    }

    /// 从存储的 JSON 文本读取，无法解析时退化为空结构
    pub fn from_stored(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Self::from_map(map),
            Ok(_) => {
                tracing::warn!("Stored analysis payload is not a JSON object");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored analysis payload is not valid JSON");
                Self::default()
            }
        }
    }

    /// LLM 返回的原始对象
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn view(&self) -> &AnalysisView {
        &self.view
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.raw.clone())
    }

    /// 提取章节主字段
    pub fn highlights(&self) -> ChapterHighlights {
        let view = &self.view;
        let summary = &view.chapter_analysis.summary;
        let non_empty = |s: &Option<String>| s.as_ref().filter(|s| !s.trim().is_empty()).cloned();

        ChapterHighlights {
            summary: non_empty(&summary.concise).or_else(|| non_empty(&summary.detailed)),
            key_events: summary.key_events.clone(),
            characters_mentioned: view
                .character_mapping
                .characters
                .iter()
                .filter_map(|c| non_empty(&c.name))
                .collect(),
            themes: view
                .chapter_analysis
                .themes
                .iter()
                .filter_map(|t| non_empty(&t.theme))
                .collect(),
            sentiment_score: view
                .chapter_analysis
                .sentiment_analysis
                .as_ref()
                .and_then(|s| s.get("sentiment_score").or_else(|| s.get("score")))
                .and_then(Value::as_f64),
        }
    }
}

/// 写回章节记录的主字段
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChapterHighlights {
    pub summary: Option<String>,
    pub key_events: Vec<String>,
    pub characters_mentioned: Vec<String>,
    pub themes: Vec<String>,
    pub sentiment_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_highlights_from_full_payload() {
        let data = AnalysisData::from_map(map(json!({
            "chapter_analysis": {
                "summary": {
                    "concise": "Kim wakes up in the novel.",
                    "detailed": "A long version.",
                    "key_events": ["subway stops", "scenario begins"]
                },
                "themes": [{"theme": "survival"}, {"theme": ""}, {"description": "no name"}],
                "sentiment_analysis": {"overall_tone": "tense", "sentiment_score": -0.4}
            },
            "character_mapping": {
                "characters": [{"name": "Kim Dokja", "role": "protagonist"}, {"role": "extra"}]
            },
            "metadata": {"model": "x"}
        })));

        let highlights = data.highlights();
        assert_eq!(highlights.summary.as_deref(), Some("Kim wakes up in the novel."));
        assert_eq!(highlights.key_events.len(), 2);
        assert_eq!(highlights.characters_mentioned, vec!["Kim Dokja"]);
        assert_eq!(highlights.themes, vec!["survival"]);
        assert_eq!(highlights.sentiment_score, Some(-0.4));
        assert!(data.raw().contains_key("metadata"));
    }

    #[test]
    fn test_summary_falls_back_to_detailed() {
        let data = AnalysisData::from_map(map(json!({
            "chapter_analysis": {"summary": {"concise": "", "detailed": "Detailed only."}}
        })));
        assert_eq!(data.highlights().summary.as_deref(), Some("Detailed only."));
    }

    #[test]
    fn test_wrong_types_degrade_to_defaults() {
        let data = AnalysisData::from_map(map(json!({
            "chapter_analysis": {
                "summary": "just a string",
                "themes": {"not": "a list"}
            },
            "character_mapping": [1, 2, 3]
        })));
        let highlights = data.highlights();
        assert_eq!(highlights, ChapterHighlights::default());
    }

    #[test]
    fn test_non_string_key_events_skipped() {
        let data = AnalysisData::from_map(map(json!({
            "chapter_analysis": {"summary": {"key_events": ["a", 3, null, "b"]}}
        })));
        assert_eq!(data.highlights().key_events, vec!["a", "b"]);
    }

    #[test]
    fn test_from_stored_invalid_is_empty() {
        assert_eq!(AnalysisData::from_stored("not json"), AnalysisData::default());
        assert_eq!(AnalysisData::from_stored("[1,2]"), AnalysisData::default());
    }

    #[test]
    fn test_round_trip_keeps_unknown_fields() {
        let raw = r#"{"chapter_analysis":{"summary":{"concise":"c"},"pacing":"fast"},"extra_key":1}"#;
        let value = AnalysisData::from_stored(raw).to_value();
        assert_eq!(value["chapter_analysis"]["pacing"], "fast");
        assert_eq!(value["extra_key"], 1);
        assert_eq!(value["chapter_analysis"]["summary"]["concise"], "c");
    }

    #[test]
    fn test_stored_value_is_the_model_object() {
        let original = json!({
            "chapter_analysis": {
                "summary": {
                    "concise": "c",
                    "key_events": [{"event": "duel", "importance": "high"}, "plain"]
                },
                "themes": [{"theme": "loyalty", "evidence": "x"}, "betrayal"]
            }
        });

        let data = AnalysisData::from_map(map(original.clone()));
        assert_eq!(data.to_value(), original);

        // 视图只取能识别的元素
        let highlights = data.highlights();
        assert_eq!(highlights.key_events, vec!["plain"]);
        assert_eq!(highlights.themes, vec!["loyalty"]);

        let reloaded = AnalysisData::from_stored(&original.to_string());
        assert_eq!(reloaded, data);
    }
}
