//! Fake LLM Client - 用于测试和离线运行的 LLM 客户端
//!
//! 按顺序返回预设回复，最后一条重复使用，不实际调用外部服务

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::application::ports::{CompletionRequest, CompletionResponse, LlmEnginePort, LlmError};

const FAKE_MODEL: &str = "fake-llm";

/// Fake LLM Client
pub struct FakeLlmClient {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeLlmClient {
    /// 依次返回给定回复
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 追加一次服务错误
    pub fn push_error(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(message.into()));
    }

    /// 已收到的请求
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn next_reply(&self) -> Option<Result<String, String>> {
        let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        }
    }
}

#[async_trait]
impl LlmEnginePort for FakeLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        tracing::debug!(
            messages = request.messages.len(),
            json_mode = request.json_mode,
            "FakeLlmClient: returning scripted reply"
        );

        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        match self.next_reply() {
            Some(Ok(content)) => Ok(CompletionResponse {
                content,
                model: FAKE_MODEL.to_string(),
            }),
            Some(Err(message)) => Err(LlmError::ServiceError(message)),
            None => Err(LlmError::InvalidResponse("no scripted reply".to_string())),
        }
    }

    fn model_name(&self) -> &str {
        FAKE_MODEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::LlmMessage;

    fn request() -> CompletionRequest {
        CompletionRequest::new(vec![LlmMessage::user("hi")])
    }

    #[tokio::test]
    async fn test_replies_in_order_then_repeat_last() {
        let client = FakeLlmClient::new(["one", "two"]);
        assert_eq!(client.complete(request()).await.unwrap().content, "one");
        assert_eq!(client.complete(request()).await.unwrap().content, "two");
        assert_eq!(client.complete(request()).await.unwrap().content, "two");
        assert_eq!(client.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let client = FakeLlmClient::new(["ok"]);
        client.push_error("rate limited");
        assert!(client.complete(request()).await.is_ok());
        assert!(matches!(
            client.complete(request()).await,
            Err(LlmError::ServiceError(_))
        ));
    }

    #[tokio::test]
    async fn test_no_replies() {
        let client = FakeLlmClient::new(Vec::<String>::new());
        assert!(client.complete(request()).await.is_err());
    }
}
