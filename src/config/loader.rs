//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "NOVEL_COMPANION";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `NOVEL_COMPANION_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `NOVEL_COMPANION_SERVER__PORT=8080`
/// - `NOVEL_COMPANION_LLM__API_KEY=sk-or-...`
/// - `NOVEL_COMPANION_LLM__MODEL=deepseek/deepseek-r1:free`
/// - `NOVEL_COMPANION_DATABASE__PATH=/data/novel_companion.db`
/// - `NOVEL_COMPANION_NLP__MODEL_PATH=models/lexicon.json`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("server.cors_allow_all", true)?
        .set_default("llm.base_url", "https://openrouter.ai/api/v1")?
        .set_default("llm.api_key", "")?
        .set_default("llm.model", "deepseek/deepseek-r1:free")?
        .set_default("llm.timeout_secs", 120)?
        .set_default("llm.prompt_template_path", "prompt_template.txt")?
        .set_default("database.path", "data/novel_companion.db")?
        .set_default("database.max_connections", 5)?
        .set_default("storage.novels_dir", "data/novels")?
        .set_default("storage.max_upload_size", 10 * 1024 * 1024)?
        .set_default("storage.allowed_file_types", vec!["txt"])?
        .set_default("nlp.max_chunk_size", 4000)?
        .set_default("analysis.max_concurrent", 1)?
        .set_default("analysis.queue_capacity", 100)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: NOVEL_COMPANION_LLM__API_KEY=sk-or-...
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.llm.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "LLM base URL cannot be empty".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    if config.analysis.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "Analysis max_concurrent must be at least 1".to_string(),
        ));
    }

    if config.storage.max_upload_size == 0 {
        return Err(ConfigError::ValidationError(
            "Max upload size cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("LLM Base URL: {}", config.llm.base_url);
    tracing::info!("LLM Model: {}", config.llm.model);
    tracing::info!("LLM Timeout: {}s", config.llm.timeout_secs);
    tracing::info!(
        "LLM API Key: {}",
        if config.llm.has_api_key() { "set" } else { "missing" }
    );
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Database Max Connections: {}", config.database.max_connections);
    tracing::info!("Novels Directory: {:?}", config.storage.novels_dir);
    tracing::info!("NLP Model: {:?}", config.nlp.model_path);
    tracing::info!("Analysis Concurrency: {}", config.analysis.max_concurrent);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_llm_url() {
        let mut config = AppConfig::default();
        config.llm.base_url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_db_path() {
        let mut config = AppConfig::default();
        config.database.path = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_concurrency() {
        let mut config = AppConfig::default();
        config.analysis.max_concurrent = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "[server]\nport = 9100\n\n[llm]\nmodel = \"test/model\"\n\n[nlp]\nmodel_path = \"models/lexicon.json\""
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.llm.model, "test/model");
        assert_eq!(
            config.nlp.model_path.as_deref(),
            Some(Path::new("models/lexicon.json"))
        );
        // 未覆盖的字段保持默认
        assert_eq!(config.database.path, "data/novel_companion.db");
        assert_eq!(config.storage.allowed_file_types, vec!["txt".to_string()]);
    }
}
