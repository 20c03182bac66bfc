//! 列值编解码（UUID、RFC3339 时间、JSON 文本）

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::application::ports::RepositoryError;

pub(super) fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(e.to_string())
}

pub(super) fn parse_uuid(raw: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(raw).map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

pub(super) fn parse_time(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

pub(super) fn to_json_text<T: Serialize + ?Sized>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

/// JSON 列解析失败时记录 warn 并返回默认值
pub(super) fn from_json_text<T: DeserializeOwned + Default>(raw: &str, column: &str) -> T {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!(column, error = %e, "Malformed JSON column, using default");
        T::default()
    })
}

/// 转义 LIKE 通配符，配合 `ESCAPE '\'`
pub(super) fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
