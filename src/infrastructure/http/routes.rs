//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping               GET   健康检查
//! - /api/novel/create       POST  以 JSON 创建小说（异步分章，通过 WS 通知完成）
//! - /api/novel/upload       POST  上传小说文本文件（同上）
//! - /api/novel/list         POST  检索小说
//! - /api/novel/get          POST  获取小说详情
//! - /api/novel/delete       POST  删除小说
//! - /api/novel/chapters     POST  获取章节列表
//! - /api/novel/characters   POST  获取人物
//! - /api/novel/chat         POST  就小说内容聊天
//! - /api/novel/analyze      POST  提交后台 LLM 章节分析
//! - /api/chapter/get        POST  获取章节详情
//! - /api/chapter/summarize  POST  生成章节摘要
//! - /api/analysis/text      POST  即时文本分析
//! - /ws/events              WS    全局事件
//! - /ws/novel/{id}          WS    单本小说事件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/events", get(handlers::global_websocket_handler))
        .route("/ws/novel/:novel_id", get(handlers::novel_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/novel", novel_routes())
        .nest("/chapter", chapter_routes())
        .route("/analysis/text", post(handlers::analyze_text))
}

/// Novel 路由
fn novel_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_novel))
        .route("/upload", post(handlers::upload_novel))
        .route("/list", post(handlers::list_novels))
        .route("/get", post(handlers::get_novel))
        .route("/delete", post(handlers::delete_novel))
        .route("/chapters", post(handlers::get_novel_chapters))
        .route("/characters", post(handlers::get_characters))
        .route("/chat", post(handlers::chat_about_novel))
        .route("/analyze", post(handlers::analyze_novel))
}

/// Chapter 路由
fn chapter_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/get", post(handlers::get_chapter))
        .route("/summarize", post(handlers::summarize_chapter))
}
