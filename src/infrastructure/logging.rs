//! 日志初始化

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// 根据配置构建过滤器，设置了 RUST_LOG 时以其为准
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},novel_companion={level},tower_http=debug,sqlx=warn",
            level = config.level
        ))
    })
}

/// 初始化全局 tracing subscriber（进程内只调用一次）
pub fn init_logging(config: &LogConfig) {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(config));

    if config.json {
        builder.json().with_current_span(false).init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_includes_crate_level() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let filter = env_filter(&LogConfig {
            level: "debug".into(),
            json: false,
        });
        assert!(filter.to_string().contains("novel_companion=debug"));
    }
}
