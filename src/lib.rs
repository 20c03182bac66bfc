//! Novel Companion - 小说阅读伴侣
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Analysis Context: 章节分割、标题、实体、关系、关键词、LLM JSON 解析
//! - Novel Context: 小说值对象、阅读统计、元数据
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Repositories, LlmEngine, AnalysisProgress）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Worker: 后台章节分析
//! - Persistence: SQLite 存储
//! - Adapters: LLM Client, 词典语言模型
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
