//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::request_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;
use crate::config::ServerConfig;

/// multipart 表单字段与边界的额外开销
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    fn cors_layer(&self) -> CorsLayer {
        let cors = CorsLayer::new()
            .allow_methods(Any)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .max_age(Duration::from_secs(3600));

        if self.config.cors_allow_all {
            cors.allow_origin(Any).expose_headers(Any)
        } else {
            cors
        }
    }

    /// 构建 Router
    pub fn build_router(&self) -> Router {
        // 请求体上限跟随上传文件上限
        let body_limit = self
            .state
            .storage
            .max_upload_size
            .saturating_add(MULTIPART_OVERHEAD);
        let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

        create_routes()
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(middleware::from_fn(request_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(self.cors_layer())
            .with_state(self.state.clone())
    }

    /// 启动服务器
    pub async fn run(self) -> Result<(), std::io::Error> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// 启动服务器（带优雅关闭）
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let addr = self.config.addr();

        let listener = TcpListener::bind(&addr).await?;
        info!(addr = %addr, "HTTP server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}
