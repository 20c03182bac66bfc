//! LLM Engine Port - 大模型补全抽象
//!
//! OpenAI 兼容的 chat completion 接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// LLM 错误
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API key is not configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    System,
    User,
    Assistant,
}

/// 对话消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::Assistant,
            content: content.into(),
        }
    }
}

/// 补全请求
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<LlmMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// 要求返回 JSON 对象（response_format = json_object）
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(messages: Vec<LlmMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// 补全响应
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// choices[0].message.content
    pub content: String,
    /// 实际使用的模型
    pub model: String,
}

/// LLM Engine Port
#[async_trait]
pub trait LlmEnginePort: Send + Sync {
    /// 单次补全，不重试
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// 配置的模型名
    fn model_name(&self) -> &str;

    /// 检查 LLM 服务是否可用
    async fn health_check(&self) -> bool {
        true
    }
}
