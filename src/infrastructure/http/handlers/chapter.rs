//! Chapter HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{ChapterResponse, GetChapter, SummarizeChapter};
use crate::domain::novel::SummaryLength;
use crate::infrastructure::http::dto::{
    ApiResponse, ChapterSummaryResponse, GetChapterRequest, SummarizeChapterRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 获取单个章节（含分析结果）
pub async fn get_chapter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetChapterRequest>,
) -> Result<Json<ApiResponse<ChapterResponse>>, ApiError> {
    let query = GetChapter {
        chapter_id: req.id,
        include_content: req.include_content,
    };

    let chapter = state.get_chapter_handler.handle(query).await?;
    Ok(Json(ApiResponse::success(chapter)))
}

/// 生成章节摘要
pub async fn summarize_chapter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummarizeChapterRequest>,
) -> Result<Json<ApiResponse<ChapterSummaryResponse>>, ApiError> {
    let summary_length = SummaryLength::parse(&req.summary_length)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let command = SummarizeChapter {
        chapter_id: req.id,
        summary_length,
    };

    let summary = state.summarize_chapter_handler.handle(command).await?;
    Ok(Json(ApiResponse::success(summary.into())))
}
