//! Novel Context - Value Objects

use serde::{Deserialize, Serialize};

use super::NovelError;

/// 标题最大字符数
pub const MAX_TITLE_CHARS: usize = 200;
/// 小说正文最少字符数
pub const MIN_CONTENT_CHARS: usize = 100;
/// 聊天消息最大字符数
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// 小说标题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title(String);

impl Title {
    pub fn new(title: impl Into<String>) -> Result<Self, NovelError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(NovelError::InvalidTitle("标题不能为空".into()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(NovelError::InvalidTitle(format!(
                "标题长度不能超过{}字符",
                MAX_TITLE_CHARS
            )));
        }
        Ok(Self(title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Title {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 小说全文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NovelContent(String);

impl NovelContent {
    pub fn new(content: impl Into<String>) -> Result<Self, NovelError> {
        let content = content.into();
        if content.chars().count() < MIN_CONTENT_CHARS {
            return Err(NovelError::InvalidContent(format!(
                "正文至少需要{}字符",
                MIN_CONTENT_CHARS
            )));
        }
        Ok(Self(content))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// 用户聊天消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage(String);

impl UserMessage {
    pub fn new(message: impl Into<String>) -> Result<Self, NovelError> {
        let message = message.into();
        let chars = message.trim().chars().count();
        if chars == 0 {
            return Err(NovelError::InvalidMessage("消息不能为空".into()));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(NovelError::InvalidMessage(format!(
                "消息长度不能超过{}字符",
                MAX_MESSAGE_CHARS
            )));
        }
        Ok(Self(message))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 摘要长度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl SummaryLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryLength::Short => "short",
            SummaryLength::Medium => "medium",
            SummaryLength::Long => "long",
        }
    }

    pub fn parse(s: &str) -> Result<Self, NovelError> {
        match s {
            "short" => Ok(SummaryLength::Short),
            "medium" => Ok(SummaryLength::Medium),
            "long" => Ok(SummaryLength::Long),
            other => Err(NovelError::InvalidSummaryLength(other.to_string())),
        }
    }

    /// 给 LLM 的长度要求
    pub fn instruction(&self) -> &'static str {
        match self {
            SummaryLength::Short => "Provide a concise 2-3 sentence summary",
            SummaryLength::Medium => "Provide a detailed paragraph summary (4-6 sentences)",
            SummaryLength::Long => "Provide a comprehensive summary with multiple paragraphs",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_bounds() {
        assert!(Title::new("").is_err());
        assert!(Title::new("   ").is_err());
        assert!(Title::new("a".repeat(200)).is_ok());
        assert!(Title::new("a".repeat(201)).is_err());
        // 按字符计数
        assert!(Title::new("书".repeat(200)).is_ok());
        assert_eq!(Title::new("  Dune ").unwrap().as_str(), "Dune");
    }

    #[test]
    fn test_content_minimum() {
        assert!(NovelContent::new("x".repeat(99)).is_err());
        assert!(NovelContent::new("x".repeat(100)).is_ok());
    }

    #[test]
    fn test_user_message_bounds() {
        assert!(UserMessage::new("").is_err());
        assert!(UserMessage::new(" \n ").is_err());
        assert!(UserMessage::new("Who is Kim Dokja?").is_ok());
        assert!(UserMessage::new("q".repeat(1001)).is_err());
    }

    #[test]
    fn test_summary_length_parse() {
        assert_eq!(SummaryLength::parse("short").unwrap(), SummaryLength::Short);
        assert!(SummaryLength::parse("tiny").is_err());
        assert_eq!(SummaryLength::default(), SummaryLength::Medium);
    }
}
