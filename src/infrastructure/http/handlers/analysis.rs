//! Analysis HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{AnalyzeText, TextAnalysisResponse};
use crate::infrastructure::http::dto::{AnalyzeTextRequest, ApiResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 即时分析一段文本（不落库）
pub async fn analyze_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeTextRequest>,
) -> Result<Json<ApiResponse<TextAnalysisResponse>>, ApiError> {
    let query = AnalyzeText {
        text: req.text,
        names: req.names,
    };

    let analysis = state.analyze_text_handler.handle(query).await?;
    Ok(Json(ApiResponse::success(analysis)))
}
