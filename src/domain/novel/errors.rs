//! Novel Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NovelError {
    #[error("无效的标题: {0}")]
    InvalidTitle(String),

    #[error("无效的文本内容: {0}")]
    InvalidContent(String),

    #[error("无效的消息: {0}")]
    InvalidMessage(String),

    #[error("无效的摘要长度: {0}")]
    InvalidSummaryLength(String),

    #[error("无效的元数据: {0}")]
    InvalidMetadata(String),
}
