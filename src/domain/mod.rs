//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Analysis Context: 章节分割、实体/关系/关键词提取、LLM 输出解析
//! - Novel Context: 小说与人物相关的值对象和聚合

pub mod analysis;
pub mod novel;
