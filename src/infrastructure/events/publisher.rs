//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::application::ports::{AnalysisProgressPort, AnalysisReport};

const CHANNEL_CAPACITY: usize = 100;

/// WebSocket 事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// Novel 分章处理完成
    NovelReady {
        novel_id: Uuid,
        title: String,
        total_chapters: u32,
    },
    /// Novel 分章处理失败
    NovelFailed { novel_id: Uuid, error: String },
    /// Novel 删除中
    NovelDeleting { novel_id: Uuid },
    /// Novel 删除完成
    NovelDeleted { novel_id: Uuid },
    /// Novel 删除失败
    NovelDeleteFailed { novel_id: Uuid, error: String },
    /// 章节分析已入队
    AnalysisQueued { novel_id: Uuid },
    /// 章节分析开始
    AnalysisStarted { novel_id: Uuid, total_chapters: usize },
    /// 单章分析完成
    ChapterAnalyzed { novel_id: Uuid, chapter_number: u32 },
    /// 单章分析失败
    ChapterAnalysisFailed {
        novel_id: Uuid,
        chapter_number: u32,
        error: String,
    },
    /// 整批分析结束
    AnalysisCompleted {
        novel_id: Uuid,
        analyzed: u32,
        skipped: u32,
        failed: u32,
    },
    /// 整批分析未能执行
    AnalysisFailed { novel_id: Uuid, error: String },
}

impl WsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WsEvent::NovelReady { .. } => "NovelReady",
            WsEvent::NovelFailed { .. } => "NovelFailed",
            WsEvent::NovelDeleting { .. } => "NovelDeleting",
            WsEvent::NovelDeleted { .. } => "NovelDeleted",
            WsEvent::NovelDeleteFailed { .. } => "NovelDeleteFailed",
            WsEvent::AnalysisQueued { .. } => "AnalysisQueued",
            WsEvent::AnalysisStarted { .. } => "AnalysisStarted",
            WsEvent::ChapterAnalyzed { .. } => "ChapterAnalyzed",
            WsEvent::ChapterAnalysisFailed { .. } => "ChapterAnalysisFailed",
            WsEvent::AnalysisCompleted { .. } => "AnalysisCompleted",
            WsEvent::AnalysisFailed { .. } => "AnalysisFailed",
        }
    }
}

/// 事件发布器
pub struct EventPublisher {
    /// novel_id -> broadcast sender（单本小说的分析进度）
    novel_channels: DashMap<Uuid, broadcast::Sender<WsEvent>>,
    /// 全局广播（所有小说事件）
    global_channel: broadcast::Sender<WsEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            novel_channels: DashMap::new(),
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全局事件
    pub fn subscribe_global(&self) -> broadcast::Receiver<WsEvent> {
        self.global_channel.subscribe()
    }

    /// 订阅单本小说的事件
    pub fn subscribe_novel(&self, novel_id: Uuid) -> broadcast::Receiver<WsEvent> {
        self.novel_channels
            .entry(novel_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// 没有订阅者时移除小说通道
    pub fn release_novel(&self, novel_id: Uuid) {
        self.novel_channels
            .remove_if(&novel_id, |_, sender| sender.receiver_count() == 0);
    }

    /// 发布 Novel 处理完成事件
    pub fn publish_novel_ready(&self, novel_id: Uuid, title: &str, total_chapters: u32) {
        self.publish(
            novel_id,
            WsEvent::NovelReady {
                novel_id,
                title: title.to_string(),
                total_chapters,
            },
        );
    }

    /// 发布 Novel 处理失败事件
    pub fn publish_novel_failed(&self, novel_id: Uuid, error: &str) {
        self.publish(
            novel_id,
            WsEvent::NovelFailed {
                novel_id,
                error: error.to_string(),
            },
        );
    }

    /// 发布 Novel 删除中事件
    pub fn publish_novel_deleting(&self, novel_id: Uuid) {
        self.publish(novel_id, WsEvent::NovelDeleting { novel_id });
    }

    /// 发布 Novel 删除完成事件
    pub fn publish_novel_deleted(&self, novel_id: Uuid) {
        self.publish(novel_id, WsEvent::NovelDeleted { novel_id });
    }

    /// 发布 Novel 删除失败事件
    pub fn publish_novel_delete_failed(&self, novel_id: Uuid, error: &str) {
        self.publish(
            novel_id,
            WsEvent::NovelDeleteFailed {
                novel_id,
                error: error.to_string(),
            },
        );
    }

    /// 发布分析入队事件
    pub fn publish_analysis_queued(&self, novel_id: Uuid) {
        self.publish(novel_id, WsEvent::AnalysisQueued { novel_id });
    }

    /// 发布分析失败事件
    pub fn publish_analysis_failed(&self, novel_id: Uuid, error: &str) {
        self.publish(
            novel_id,
            WsEvent::AnalysisFailed {
                novel_id,
                error: error.to_string(),
            },
        );
    }

    /// 同时发布到全局通道和小说通道
    fn publish(&self, novel_id: Uuid, event: WsEvent) {
        if let Some(sender) = self.novel_channels.get(&novel_id) {
            if let Err(e) = sender.send(event.clone()) {
                tracing::debug!(
                    novel_id = %novel_id,
                    event = event.name(),
                    error = %e,
                    "Failed to publish novel event (no receivers)"
                );
            }
        }

        let name = event.name();
        if let Err(e) = self.global_channel.send(event) {
            tracing::debug!(
                novel_id = %novel_id,
                event = name,
                error = %e,
                "Failed to publish global event (no receivers)"
            );
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisProgressPort for EventPublisher {
    fn analysis_started(&self, novel_id: Uuid, total_chapters: usize) {
        self.publish(
            novel_id,
            WsEvent::AnalysisStarted {
                novel_id,
                total_chapters,
            },
        );
    }

    fn chapter_analyzed(&self, novel_id: Uuid, chapter_number: u32) {
        self.publish(
            novel_id,
            WsEvent::ChapterAnalyzed {
                novel_id,
                chapter_number,
            },
        );
    }

    fn chapter_failed(&self, novel_id: Uuid, chapter_number: u32, error: &str) {
        self.publish(
            novel_id,
            WsEvent::ChapterAnalysisFailed {
                novel_id,
                chapter_number,
                error: error.to_string(),
            },
        );
    }

    fn analysis_completed(&self, novel_id: Uuid, report: &AnalysisReport) {
        self.publish(
            novel_id,
            WsEvent::AnalysisCompleted {
                novel_id,
                analyzed: report.analyzed,
                skipped: report.skipped,
                failed: report.failed,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_format() {
        let novel_id = Uuid::nil();
        let event = WsEvent::ChapterAnalyzed {
            novel_id,
            chapter_number: 4,
        };

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "ChapterAnalyzed",
                "data": {"novel_id": novel_id, "chapter_number": 4}
            })
        );
    }

    #[tokio::test]
    async fn test_global_subscriber_receives_novel_events() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.subscribe_global();
        let novel_id = Uuid::new_v4();

        publisher.publish_novel_ready(novel_id, "ORV", 12);

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            WsEvent::NovelReady {
                novel_id,
                title: "ORV".into(),
                total_chapters: 12
            }
        );
    }

    #[tokio::test]
    async fn test_novel_subscriber_only_sees_its_novel() {
        let publisher = EventPublisher::new();
        let watched = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut rx = publisher.subscribe_novel(watched);

        publisher.chapter_analyzed(other, 1);
        publisher.analysis_completed(
            watched,
            &AnalysisReport {
                analyzed: 2,
                skipped: 1,
                failed: 0,
            },
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "AnalysisCompleted");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_publish_without_receivers_is_silent() {
        let publisher = EventPublisher::new();
        publisher.publish_analysis_failed(Uuid::new_v4(), "boom");
    }

    #[test]
    fn test_release_novel_keeps_active_channels() {
        let publisher = EventPublisher::new();
        let novel_id = Uuid::new_v4();

        let rx = publisher.subscribe_novel(novel_id);
        publisher.release_novel(novel_id);
        assert!(publisher.novel_channels.contains_key(&novel_id));

        drop(rx);
        publisher.release_novel(novel_id);
        assert!(!publisher.novel_channels.contains_key(&novel_id));
    }
}
