//! HTTP LLM Client - 调用 OpenAI 兼容的 chat completion 服务
//!
//! 实现 LlmEnginePort trait
//!
//! 外部 API:
//! POST {base_url}/chat/completions
//! Request: {"model": "...", "messages": [...], "temperature": 0.3, "max_tokens": 1000,
//!           "response_format": {"type": "json_object"}}
//! Response: {"model": "...", "choices": [{"message": {"content": "..."}}]}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    CompletionRequest, CompletionResponse, LlmEnginePort, LlmError, LlmMessage,
};
use crate::config::LlmConfig;

/// 请求体
#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [LlmMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// 响应体（只取需要的字段）
#[derive(Debug, Deserialize)]
struct ChatCompletionReply {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP LLM 客户端配置
#[derive(Debug, Clone)]
pub struct HttpLlmClientConfig {
    /// API 基础 URL
    pub base_url: String,
    /// Bearer API Key
    pub api_key: String,
    /// 模型名
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpLlmClientConfig {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

impl From<&LlmConfig> for HttpLlmClientConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

impl HttpLlmClientConfig {
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP LLM 客户端
pub struct HttpLlmClient {
    client: Client,
    config: HttpLlmClientConfig,
}

impl HttpLlmClient {
    /// 创建新的 HTTP LLM 客户端
    pub fn new(config: HttpLlmClientConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.config.base_url)
    }
}

/// 取 choices[0].message.content
fn first_content(reply: ChatCompletionReply) -> Result<(String, Option<String>), LlmError> {
    let content = reply
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| LlmError::InvalidResponse("response has no message content".to_string()))?;

    Ok((content, reply.model))
}

#[async_trait]
impl LlmEnginePort for HttpLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if self.config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let body = ChatCompletionBody {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        tracing::debug!(
            url = %self.completions_url(),
            model = %self.config.model,
            messages = request.messages.len(),
            json_mode = request.json_mode,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else if e.is_connect() {
                    LlmError::NetworkError(format!("Cannot connect to LLM service: {}", e))
                } else {
                    LlmError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ServiceError(format!("HTTP {}: {}", status, error_text)));
        }

        let reply: ChatCompletionReply = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to decode response: {}", e)))?;

        let (content, model) = first_content(reply)?;

        tracing::info!(
            model = %self.config.model,
            content_len = content.len(),
            "Chat completion received"
        );

        Ok(CompletionResponse {
            content,
            model: model.unwrap_or_else(|| self.config.model.clone()),
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn health_check(&self) -> bool {
        if self.config.api_key.is_empty() {
            return false;
        }

        match self
            .client
            .get(self.models_url())
            .bearer_auth(&self.config.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
