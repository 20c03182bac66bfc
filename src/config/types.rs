//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM 配置
    #[serde(default)]
    pub llm: LlmConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 语言模型配置
    #[serde(default)]
    pub nlp: NlpConfig,

    /// 后台分析配置
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 是否允许任意来源跨域
    #[serde(default = "default_cors_allow_all")]
    pub cors_allow_all: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_allow_all() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allow_all: default_cors_allow_all(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// LLM 配置（OpenAI 兼容接口）
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// API 基础 URL
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// API Key，为空时 LLM 调用会失败但服务照常启动
    #[serde(default)]
    pub api_key: String,

    /// 模型名
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// 章节分析提示词模板路径
    #[serde(default = "default_prompt_template_path")]
    pub prompt_template_path: PathBuf,
}

fn default_llm_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_llm_model() -> String {
    "deepseek/deepseek-r1:free".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_prompt_template_path() -> PathBuf {
    PathBuf::from("prompt_template.txt")
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: String::new(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
            prompt_template_path: default_prompt_template_path(),
        }
    }
}

impl LlmConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/novel_companion.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 上传的小说原文存储目录
    #[serde(default = "default_novels_dir")]
    pub novels_dir: PathBuf,

    /// 上传文件最大大小（字节），默认 10MB
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,

    /// 允许上传的扩展名
    #[serde(default = "default_allowed_file_types")]
    pub allowed_file_types: Vec<String>,
}

fn default_novels_dir() -> PathBuf {
    PathBuf::from("data/novels")
}

fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024 // 10 MB
}

fn default_allowed_file_types() -> Vec<String> {
    vec!["txt".to_string()]
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            novels_dir: default_novels_dir(),
            max_upload_size: default_max_upload_size(),
            allowed_file_types: default_allowed_file_types(),
        }
    }
}

impl StorageConfig {
    /// 扩展名是否允许（忽略大小写）
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        self.allowed_file_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

/// 语言模型配置
#[derive(Debug, Clone, Deserialize)]
pub struct NlpConfig {
    /// 词典模型文件路径，未设置时只用基础算法
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// 摘要提示词中章节正文的最大字符数
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
}

fn default_max_chunk_size() -> usize {
    4000
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            max_chunk_size: default_max_chunk_size(),
        }
    }
}

/// 后台分析配置
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// 同时分析的小说数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// 分析队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_max_concurrent() -> usize {
    1
}

fn default_queue_capacity() -> usize {
    100
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.llm.model, "deepseek/deepseek-r1:free");
        assert_eq!(config.database.path, "data/novel_companion.db");
        assert_eq!(config.analysis.max_concurrent, 1);
        assert!(config.nlp.model_path.is_none());
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_database_url() {
        let config = DatabaseConfig::default();
        assert_eq!(config.database_url(), "sqlite:data/novel_companion.db?mode=rwc");
    }

    #[test]
    fn test_allowed_extension() {
        let config = StorageConfig::default();
        assert!(config.is_allowed_extension("txt"));
        assert!(config.is_allowed_extension("TXT"));
        assert!(!config.is_allowed_extension("pdf"));
    }

    #[test]
    fn test_api_key_presence() {
        let mut config = LlmConfig::default();
        assert!(!config.has_api_key());
        config.api_key = "sk-or-123".into();
        assert!(config.has_api_key());
    }
}
