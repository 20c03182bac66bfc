//! Novel Companion - HTTP 服务入口

use std::sync::Arc;

use novel_companion::application::AnalyzeNovelChaptersHandler;
use novel_companion::config::{load_config, print_config};
use novel_companion::domain::analysis::{SegmentConfig, TextAnalyzer};
use novel_companion::infrastructure::adapters::{
    load_language_support, HttpLlmClient, HttpLlmClientConfig,
};
use novel_companion::infrastructure::events::EventPublisher;
use novel_companion::infrastructure::http::{AppPorts, AppState, HttpServer};
use novel_companion::infrastructure::init_logging;
use novel_companion::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteChapterRepository,
    SqliteCharacterRepository, SqliteChatHistoryRepository, SqliteNovelRepository,
};
use novel_companion::infrastructure::worker::analysis_channel;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_logging(&config.log);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Novel Companion starting");
    print_config(&config);

    if !config.llm.has_api_key() {
        tracing::warn!("LLM API key not configured, summary, chat and analysis will fail");
    }

    // 确保数据目录存在
    tokio::fs::create_dir_all(&config.storage.novels_dir).await?;
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let pool = create_pool(&DatabaseConfig::from(&config.database)).await?;
    run_migrations(&pool).await?;

    // 文本分析（可选词典模型）
    let language = load_language_support(config.nlp.model_path.as_deref());
    let analyzer = Arc::new(TextAnalyzer::new(language, SegmentConfig::default()));

    // Repository 与 LLM 适配器
    let novel_repo = Arc::new(SqliteNovelRepository::new(pool.clone()));
    let chapter_repo = Arc::new(SqliteChapterRepository::new(pool.clone()));
    let character_repo = Arc::new(SqliteCharacterRepository::new(pool.clone()));
    let chat_repo = Arc::new(SqliteChatHistoryRepository::new(pool.clone()));
    let llm = Arc::new(HttpLlmClient::new(HttpLlmClientConfig::from(&config.llm))?);

    let event_publisher = EventPublisher::new().arc();

    // 后台分析 Worker
    let analyze_handler = Arc::new(AnalyzeNovelChaptersHandler::new(
        novel_repo.clone(),
        chapter_repo.clone(),
        llm.clone(),
        event_publisher.clone(),
        config.llm.prompt_template_path.clone(),
    ));
    let (analysis_queue, worker) =
        analysis_channel(&config.analysis, analyze_handler, event_publisher.clone());
    tokio::spawn(worker.run());

    let state = AppState::new(
        AppPorts {
            novel_repo,
            chapter_repo,
            character_repo,
            chat_repo,
            llm,
        },
        analyzer,
        event_publisher,
        analysis_queue,
        config.storage.clone(),
        &config.nlp,
    );

    let server = HttpServer::new(config.server.clone(), state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received shutdown signal"),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for ctrl-c");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await?;

    pool.close().await;
    tracing::info!("Server shutdown complete");

    Ok(())
}
