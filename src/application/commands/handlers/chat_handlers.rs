//! Chat Command Handlers

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::application::commands::ChatAboutNovel;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ChapterRepositoryPort, ChatHistoryRepositoryPort, ChatRecord, CompletionRequest,
    LlmEnginePort, LlmMessage, NovelRepositoryPort,
};
use crate::application::prompts::{chat_context, chat_system_prompt, CHAT_CONTEXT_CHAPTERS};
use crate::domain::novel::UserMessage;

const CHAT_TEMPERATURE: f32 = 0.7;
const CHAT_MAX_TOKENS: u32 = 800;
/// 携带的历史消息条数
const CHAT_HISTORY_MESSAGES: usize = 5;

/// 聊天响应
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub chat_id: Uuid,
    pub response: String,
    pub references: Vec<String>,
    pub suggested_questions: Vec<String>,
}

/// 历史对话展开为消息，按时间正序，只保留最后几条
fn history_messages(recent_first: &[ChatRecord]) -> Vec<LlmMessage> {
    let messages: Vec<LlmMessage> = recent_first
        .iter()
        .rev()
        .flat_map(|record| {
            [
                LlmMessage::user(record.user_message.clone()),
                LlmMessage::assistant(record.assistant_response.clone()),
            ]
        })
        .collect();

    let skip = messages.len().saturating_sub(CHAT_HISTORY_MESSAGES);
    messages.into_iter().skip(skip).collect()
}

/// ChatAboutNovel Handler
pub struct ChatAboutNovelHandler {
    novel_repo: Arc<dyn NovelRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    chat_repo: Arc<dyn ChatHistoryRepositoryPort>,
    llm: Arc<dyn LlmEnginePort>,
}

impl ChatAboutNovelHandler {
    pub fn new(
        novel_repo: Arc<dyn NovelRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        chat_repo: Arc<dyn ChatHistoryRepositoryPort>,
        llm: Arc<dyn LlmEnginePort>,
    ) -> Self {
        Self {
            novel_repo,
            chapter_repo,
            chat_repo,
            llm,
        }
    }

    pub async fn handle(&self, command: ChatAboutNovel) -> Result<ChatResponse, ApplicationError> {
        let message = UserMessage::new(command.message)?;
        let novel_id = command.novel_id;

        self.novel_repo
            .find_by_id(novel_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Novel", novel_id))?;

        let chapters = self
            .chapter_repo
            .find_by_novel(novel_id, 0, CHAT_CONTEXT_CHAPTERS as u32)
            .await?;
        let (context, chapters_used) = chat_context(&chapters);

        let history = self
            .chat_repo
            .find_recent(novel_id, CHAT_HISTORY_MESSAGES.div_ceil(2) as u32)
            .await?;

        let mut messages = vec![LlmMessage::system(chat_system_prompt(&context))];
        messages.extend(history_messages(&history));
        messages.push(LlmMessage::user(message.as_str()));

        let request = CompletionRequest::new(messages)
            .temperature(CHAT_TEMPERATURE)
            .max_tokens(CHAT_MAX_TOKENS);

        let started = Instant::now();
        let response = self.llm.complete(request).await?;
        let response_time_ms = started.elapsed().as_millis() as u64;

        let record = ChatRecord {
            id: Uuid::new_v4(),
            novel_id,
            user_message: message.as_str().to_string(),
            assistant_response: response.content.clone(),
            context_used: json!({ "chapters_used": chapters_used }),
            model_used: response.model,
            response_time_ms,
            created_at: Utc::now(),
        };
        self.chat_repo.save(&record).await?;

        tracing::info!(
            novel_id = %novel_id,
            chat_id = %record.id,
            chapters_used = chapters_used,
            response_time_ms = response_time_ms,
            "Chat answered"
        );

        Ok(ChatResponse {
            chat_id: record.id,
            response: response.content,
            references: Vec::new(),
            suggested_questions: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::LlmRole;

    fn record(user: &str, assistant: &str) -> ChatRecord {
        ChatRecord {
            id: Uuid::new_v4(),
            novel_id: Uuid::new_v4(),
            user_message: user.into(),
            assistant_response: assistant.into(),
            context_used: json!({}),
            model_used: "test".into(),
            response_time_ms: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_history_is_chronological_and_capped() {
        // 最近的在前
        let recent_first = vec![record("q3", "a3"), record("q2", "a2"), record("q1", "a1")];

        let messages = history_messages(&recent_first);
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["a1", "q2", "a2", "q3", "a3"]);
        assert_eq!(messages[0].role, LlmRole::Assistant);
        assert_eq!(messages[1].role, LlmRole::User);
    }

    #[test]
    fn test_history_empty() {
        assert!(history_messages(&[]).is_empty());
    }
}
