//! Worker Layer - Background Task Processing
//!
//! 实现 AnalysisWorker，后台执行章节 LLM 分析

mod analysis_worker;

pub use analysis_worker::{analysis_channel, AnalysisJob, AnalysisQueue, AnalysisWorker, QueueError};
