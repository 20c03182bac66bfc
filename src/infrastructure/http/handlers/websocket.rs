//! WebSocket Handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::infrastructure::events::WsEvent;
use crate::infrastructure::http::state::AppState;

/// 全局 WebSocket 连接处理（所有小说与分析事件）
pub async fn global_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let events = state.event_publisher.subscribe_global();
        tracing::info!("Global WebSocket connected");
        forward_events(socket, events).await;
        tracing::info!("Global WebSocket disconnected");
    })
}

/// 单本小说 WebSocket 连接处理（该小说的分析进度）
pub async fn novel_websocket_handler(
    ws: WebSocketUpgrade,
    Path(novel_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let events = state.event_publisher.subscribe_novel(novel_id);
        tracing::info!(novel_id = %novel_id, "Novel WebSocket connected");
        forward_events(socket, events).await;
        state.event_publisher.release_novel(novel_id);
        tracing::info!(novel_id = %novel_id, "Novel WebSocket disconnected");
    })
}

/// 转发事件直到任一方向断开
async fn forward_events(socket: WebSocket, mut events: broadcast::Receiver<WsEvent>) {
    let (mut sender, mut receiver) = socket.split();

    // 事件转发任务
    let mut forward_task = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "WebSocket subscriber lagged, events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let msg = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    // 接收客户端消息（心跳），ping 由 axum 自动回复
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::debug!("WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    // 任一任务结束后取消另一个，释放订阅
    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => {
            forward_task.abort();
            let _ = forward_task.await;
        }
    }
}
