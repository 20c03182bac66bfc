//! Analysis Worker - Background Chapter Analysis Processor

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

use crate::application::{AnalyzeNovelChapters, AnalyzeNovelChaptersHandler};
use crate::config::AnalysisConfig;
use crate::infrastructure::events::EventPublisher;

/// 分析任务
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisJob {
    pub novel_id: Uuid,
    pub force: bool,
}

/// 入队错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Analysis queue is full")]
    Full,

    #[error("Analysis worker is not running")]
    Closed,
}

/// 分析队列（发送端）
#[derive(Clone)]
pub struct AnalysisQueue {
    sender: mpsc::Sender<AnalysisJob>,
}

impl AnalysisQueue {
    /// 提交任务，队列满时立即返回错误
    pub fn submit(&self, job: AnalysisJob) -> Result<(), QueueError> {
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}

/// 创建分析队列与对应的 Worker
pub fn analysis_channel(
    config: &AnalysisConfig,
    handler: Arc<AnalyzeNovelChaptersHandler>,
    event_publisher: Arc<EventPublisher>,
) -> (AnalysisQueue, AnalysisWorker) {
    let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
    let worker = AnalysisWorker {
        max_concurrent: config.max_concurrent.max(1),
        receiver,
        handler,
        event_publisher,
    };
    (AnalysisQueue { sender }, worker)
}

/// 分析 Worker
///
/// 从队列消费任务，semaphore 限制同时分析的小说数
pub struct AnalysisWorker {
    max_concurrent: usize,
    receiver: mpsc::Receiver<AnalysisJob>,
    handler: Arc<AnalyzeNovelChaptersHandler>,
    event_publisher: Arc<EventPublisher>,
}

impl AnalysisWorker {
    /// 启动 Worker，所有发送端关闭后返回
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent = self.max_concurrent,
            "Analysis worker started"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        while let Some(job) = self.receiver.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to acquire semaphore permit");
                    continue;
                }
            };

            let handler = self.handler.clone();
            let event_publisher = self.event_publisher.clone();

            tokio::spawn(async move {
                let _permit = permit;
                Self::process_job(job, &handler, &event_publisher).await;
            });
        }

        tracing::info!("Analysis worker stopped");
    }

    async fn process_job(
        job: AnalysisJob,
        handler: &AnalyzeNovelChaptersHandler,
        event_publisher: &EventPublisher,
    ) {
        tracing::debug!(novel_id = %job.novel_id, force = job.force, "Processing analysis job");

        let command = AnalyzeNovelChapters {
            novel_id: job.novel_id,
            force: job.force,
            prompt_template: None,
        };

        if let Err(e) = handler.handle(command).await {
            tracing::error!(novel_id = %job.novel_id, error = %e, "Analysis job failed");
            event_publisher.publish_analysis_failed(job.novel_id, &e.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{ChapterRepositoryPort, NovelRepositoryPort};
    use crate::infrastructure::adapters::FakeLlmClient;
    use crate::infrastructure::events::WsEvent;
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteChapterRepository,
        SqliteNovelRepository,
    };
    use std::path::PathBuf;

    async fn handler(publisher: Arc<EventPublisher>) -> Arc<AnalyzeNovelChaptersHandler> {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let novel_repo: Arc<dyn NovelRepositoryPort> =
            Arc::new(SqliteNovelRepository::new(pool.clone()));
        let chapter_repo: Arc<dyn ChapterRepositoryPort> =
            Arc::new(SqliteChapterRepository::new(pool));

        Arc::new(AnalyzeNovelChaptersHandler::new(
            novel_repo,
            chapter_repo,
            Arc::new(FakeLlmClient::new(["{}"])),
            publisher,
            PathBuf::from("/nonexistent/prompt.txt"),
        ))
    }

    fn config(queue_capacity: usize) -> AnalysisConfig {
        AnalysisConfig {
            max_concurrent: 1,
            queue_capacity,
        }
    }

    #[tokio::test]
    async fn test_queue_full() {
        let publisher = EventPublisher::new().arc();
        let (queue, _worker) = analysis_channel(&config(1), handler(publisher.clone()).await, publisher);

        let job = AnalysisJob {
            novel_id: Uuid::new_v4(),
            force: false,
        };
        assert_eq!(queue.submit(job), Ok(()));
        assert_eq!(queue.submit(job), Err(QueueError::Full));
    }

    #[tokio::test]
    async fn test_queue_closed_without_worker() {
        let publisher = EventPublisher::new().arc();
        let (queue, worker) = analysis_channel(&config(4), handler(publisher.clone()).await, publisher);
        drop(worker);

        let job = AnalysisJob {
            novel_id: Uuid::new_v4(),
            force: true,
        };
        assert_eq!(queue.submit(job), Err(QueueError::Closed));
    }

    #[tokio::test]
    async fn test_failed_job_publishes_event() {
        let publisher = EventPublisher::new().arc();
        let mut events = publisher.subscribe_global();
        let (queue, worker) = analysis_channel(&config(4), handler(publisher.clone()).await, publisher);
        let running = tokio::spawn(worker.run());

        let novel_id = Uuid::new_v4();
        queue
            .submit(AnalysisJob {
                novel_id,
                force: false,
            })
            .unwrap();

        let event = events.recv().await.unwrap();
        assert!(matches!(event, WsEvent::AnalysisFailed { novel_id: id, .. } if id == novel_id));

        drop(queue);
        running.await.unwrap();
    }
}
