//! LLM Adapter - OpenAI 兼容 chat completion 客户端

mod fake_llm_client;
mod http_llm_client;

pub use fake_llm_client::FakeLlmClient;
pub use http_llm_client::*;
