//! HTTP Middleware
//!
//! 请求耗时与 HTTP 状态码日志

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// 慢请求阈值（毫秒），LLM 调用通常在此之上
pub const SLOW_REQUEST_MS: u128 = 10_000;

/// 请求日志中间件
///
/// 4xx 记 warn，5xx 记 error，超过阈值的成功请求记 warn。
/// 业务错误（errno != 0）由 ApiError::into_response() 记录。
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = elapsed_ms as u64,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = elapsed_ms as u64,
            "HTTP client error"
        );
    } else if elapsed_ms >= SLOW_REQUEST_MS {
        tracing::warn!(
            method = %method,
            path = %path,
            elapsed_ms = elapsed_ms as u64,
            "Slow HTTP request"
        );
    } else {
        tracing::debug!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = elapsed_ms as u64,
            "HTTP request"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request as HttpRequest, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    async fn echo(Json(body): Json<Value>) -> Json<Value> {
        Json(body)
    }

    fn router() -> Router {
        Router::new()
            .route("/echo", post(echo))
            .route("/boom", get(|| async { StatusCode::BAD_GATEWAY }))
            .layer(axum::middleware::from_fn(request_logging_middleware))
    }

    #[tokio::test]
    async fn test_passes_body_through() {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/echo")
            .header("content-type", "application/json")
            .body(Body::from(json!({"title": "Dune"}).to_string()))
            .unwrap();

        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["title"], "Dune");
    }

    #[tokio::test]
    async fn test_unknown_route_keeps_status() {
        let request = HttpRequest::builder()
            .uri("/missing")
            .body(Body::empty())
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_server_error_keeps_status() {
        let request = HttpRequest::builder()
            .uri("/boom")
            .body(Body::empty())
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
