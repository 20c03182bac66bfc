//! Novel HTTP Handlers

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

use crate::application::{
    ChaptersResponse, CharacterResponse, ChatAboutNovel, CreateNovel,
    DeleteNovel, GetCharacters, GetNovel, GetNovelChapters, ListNovels, NovelResponse,
    ProcessNovelChapters,
};
use crate::infrastructure::http::dto::{
    AnalysisQueuedResponse, AnalyzeNovelRequest, ApiResponse, ChatReplyResponse, ChatRequest,
    CreateNovelRequest, ListNovelsRequest, NovelChaptersRequest, NovelCreatedResponse,
    NovelIdRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;
use crate::infrastructure::worker::AnalysisJob;

/// 删除小说响应
#[derive(Debug, serde::Serialize)]
pub struct DeleteNovelResponse {
    pub id: Uuid,
    pub status: &'static str,
}

fn raw_text_path(novels_dir: &Path, novel_id: Uuid) -> PathBuf {
    novels_dir.join(format!("{}.txt", novel_id))
}

/// 创建记录后在后台分章，完成后通过 WS 通知
async fn create_and_process(
    state: &Arc<AppState>,
    command: CreateNovel,
) -> Result<NovelCreatedResponse, ApiError> {
    let content = command.content.clone();
    let created = state.create_novel_handler.handle(command).await?;
    let novel_id = created.id;

    let state = state.clone();
    tokio::spawn(async move {
        let novels_dir = state.storage.novels_dir.clone();
        if let Err(e) = fs::create_dir_all(&novels_dir).await {
            tracing::warn!(error = %e, "Failed to create novels directory");
        } else if let Err(e) = fs::write(raw_text_path(&novels_dir, novel_id), &content).await {
            tracing::warn!(novel_id = %novel_id, error = %e, "Failed to save novel file");
        }

        let command = ProcessNovelChapters { novel_id, content };
        match state.process_novel_handler.handle(command).await {
            Ok(result) => {
                state
                    .event_publisher
                    .publish_novel_ready(novel_id, &result.title, result.total_chapters);
            }
            Err(e) => {
                tracing::error!(novel_id = %novel_id, error = %e, "Novel processing failed");
                state
                    .event_publisher
                    .publish_novel_failed(novel_id, &e.to_string());
            }
        }
    });

    Ok(created.into())
}

/// 以 JSON 创建小说（异步分章）
pub async fn create_novel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNovelRequest>,
) -> Result<Json<ApiResponse<NovelCreatedResponse>>, ApiError> {
    let command = CreateNovel {
        title: req.title,
        author: req.author,
        description: req.description,
        content: req.content,
    };

    let created = create_and_process(&state, command).await?;
    Ok(Json(ApiResponse::success(created)))
}

/// 上传小说文本文件（异步分章，立即返回，完成后通过 WS 通知）
pub async fn upload_novel(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<NovelCreatedResponse>>, ApiError> {
    let mut title: Option<String> = None;
    let mut author: Option<String> = None;
    let mut description: Option<String> = None;
    let mut content: Option<String> = None;
    let mut filename: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "title" | "author" | "description" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read {}: {}", field_name, e))
                })?;
                let value = Some(value).filter(|v| !v.trim().is_empty());
                match field_name.as_str() {
                    "title" => title = value,
                    "author" => author = value,
                    _ => description = value,
                }
            }
            "file" => {
                filename = field.file_name().map(|s| s.to_string());

                let extension = filename
                    .as_deref()
                    .and_then(|f| Path::new(f).extension())
                    .and_then(|ext| ext.to_str())
                    .unwrap_or_default();
                if !state.storage.is_allowed_extension(extension) {
                    return Err(ApiError::BadRequest(format!(
                        "File type not allowed. Allowed types: {}",
                        state.storage.allowed_file_types.join(", ")
                    )));
                }

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;

                if bytes.len() as u64 > state.storage.max_upload_size {
                    return Err(ApiError::BadRequest(format!(
                        "File too large. Maximum size is {} bytes",
                        state.storage.max_upload_size
                    )));
                }

                content = Some(String::from_utf8(bytes.to_vec()).map_err(|_| {
                    ApiError::BadRequest("File must be valid UTF-8 text".to_string())
                })?);
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;

    let title = title.unwrap_or_else(|| {
        filename
            .as_deref()
            .and_then(|f| Path::new(f).file_stem())
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Untitled".to_string())
    });

    let command = CreateNovel {
        title,
        author,
        description,
        content,
    };

    let created = create_and_process(&state, command).await?;
    Ok(Json(ApiResponse::success(created)))
}

/// 检索小说列表
pub async fn list_novels(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListNovelsRequest>,
) -> Result<Json<ApiResponse<Vec<NovelResponse>>>, ApiError> {
    let query = ListNovels {
        search: req.search,
        author: req.author,
        genres: req.genres,
        tags: req.tags,
        skip: req.skip,
        limit: req.limit,
    };

    let novels = state.list_novels_handler.handle(query).await?;
    Ok(Json(ApiResponse::success(novels)))
}

/// 获取小说详情
pub async fn get_novel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelIdRequest>,
) -> Result<Json<ApiResponse<NovelResponse>>, ApiError> {
    let novel = state
        .get_novel_handler
        .handle(GetNovel { novel_id: req.id })
        .await?;
    Ok(Json(ApiResponse::success(novel)))
}

/// 获取小说章节列表
pub async fn get_novel_chapters(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelChaptersRequest>,
) -> Result<Json<ApiResponse<ChaptersResponse>>, ApiError> {
    let query = GetNovelChapters {
        novel_id: req.id,
        skip: req.skip,
        limit: req.limit,
        include_content: req.include_content,
    };

    let chapters = state.get_novel_chapters_handler.handle(query).await?;
    Ok(Json(ApiResponse::success(chapters)))
}

/// 获取小说人物
pub async fn get_characters(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelIdRequest>,
) -> Result<Json<ApiResponse<Vec<CharacterResponse>>>, ApiError> {
    let characters = state
        .get_characters_handler
        .handle(GetCharacters { novel_id: req.id })
        .await?;
    Ok(Json(ApiResponse::success(characters)))
}

/// 就小说内容聊天
pub async fn chat_about_novel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatReplyResponse>>, ApiError> {
    let command = ChatAboutNovel {
        novel_id: req.id,
        message: req.message,
    };

    let reply = state.chat_handler.handle(command).await?;
    Ok(Json(ApiResponse::success(reply.into())))
}

/// 提交后台章节分析任务
pub async fn analyze_novel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeNovelRequest>,
) -> Result<Json<ApiResponse<AnalysisQueuedResponse>>, ApiError> {
    let novel = state
        .novel_repo
        .find_by_id(req.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Novel not found: {}", req.id)))?;

    state.analysis_queue.submit(AnalysisJob {
        novel_id: novel.id,
        force: req.force,
    })?;
    state.event_publisher.publish_analysis_queued(novel.id);

    tracing::info!(
        novel_id = %novel.id,
        title = %novel.title,
        force = req.force,
        "Chapter analysis queued"
    );

    Ok(Json(ApiResponse::success(AnalysisQueuedResponse {
        novel_id: novel.id,
        queued: true,
    })))
}

/// 删除小说（异步处理，立即返回，完成后通过 WS 通知）
pub async fn delete_novel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelIdRequest>,
) -> Result<Json<ApiResponse<DeleteNovelResponse>>, ApiError> {
    let novel_id = req.id;

    // 先检查小说是否存在
    let novel = state
        .novel_repo
        .find_by_id(novel_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Novel not found: {}", novel_id)))?;

    tracing::info!(novel_id = %novel_id, title = %novel.title, "Novel deleting");
    state.event_publisher.publish_novel_deleting(novel_id);

    let state = state.clone();
    tokio::spawn(async move {
        match state.delete_novel_handler.handle(DeleteNovel { novel_id }).await {
            Ok(()) => {
                let file_path = raw_text_path(&state.storage.novels_dir, novel_id);
                if let Err(e) = fs::remove_file(&file_path).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(novel_id = %novel_id, error = %e, "Failed to delete novel file");
                    }
                }
                state.event_publisher.publish_novel_deleted(novel_id);
            }
            Err(e) => {
                tracing::error!(novel_id = %novel_id, error = %e, "Novel delete failed");
                state
                    .event_publisher
                    .publish_novel_delete_failed(novel_id, &e.to_string());
            }
        }
    });

    Ok(Json(ApiResponse::success(DeleteNovelResponse {
        id: novel_id,
        status: "deleting",
    })))
}
