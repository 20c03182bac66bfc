//! Novel Context - 元数据导入格式
//!
//! 外部元数据文件是单个对象或对象数组，字段同时接受 snake_case 和 camelCase。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{NovelError, Title};

/// 小说元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NovelMetadata {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "averageRating")]
    pub average_rating: Option<f64>,
    #[serde(default, alias = "voteCount")]
    pub vote_count: Option<i64>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, alias = "statusInCOO")]
    pub status_in_coo: Option<String>,
    #[serde(default, alias = "lastUpdated")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl NovelMetadata {
    pub fn validate(&self) -> Result<(), NovelError> {
        Title::new(self.title.as_str()).map(|_| ())
    }
}

/// 解析元数据文件
///
/// 整体不是合法 JSON 时返回错误；单条记录解析失败只影响该条。
pub fn parse_metadata_document(
    raw: &str,
) -> Result<Vec<Result<NovelMetadata, NovelError>>, NovelError> {
    let document: Value =
        serde_json::from_str(raw).map_err(|e| NovelError::InvalidMetadata(e.to_string()))?;

    let items = match document {
        Value::Array(items) => items,
        Value::Object(_) => vec![document],
        _ => {
            return Err(NovelError::InvalidMetadata(
                "expected a JSON object or array".into(),
            ))
        }
    };

    Ok(items
        .into_iter()
        .map(|item| {
            let metadata: NovelMetadata = serde_json::from_value(item)
                .map_err(|e| NovelError::InvalidMetadata(e.to_string()))?;
            metadata.validate()?;
            Ok(metadata)
        })
        .collect())
}
