//! Novel Context - 小说限界上下文
//!
//! 职责:
//! - 输入校验（标题、正文、聊天消息、摘要长度）
//! - 章节阅读统计与章节文件编号
//! - 人物名册聚合
//! - 元数据导入格式

mod aggregate;
mod entities;
mod errors;
mod metadata;
mod value_objects;

pub use aggregate::{CharacterLink, CharacterProfile, CharacterRoster};
pub use entities::{chapter_number_from_file_stem, ReadingStats, WORDS_PER_MINUTE};
pub use errors::NovelError;
pub use metadata::{parse_metadata_document, NovelMetadata};
pub use value_objects::{
    NovelContent, SummaryLength, Title, UserMessage, MAX_MESSAGE_CHARS, MAX_TITLE_CHARS,
    MIN_CONTENT_CHARS,
};
