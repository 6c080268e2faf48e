use aerodesk_core::config::LlmConfig;
use aerodesk_core::{Message, Tool, ToolCall};
use async_trait::async_trait;

/// Parameters for one completion request.
#[derive(Debug, Clone)]
pub struct CompletionParams {
    /// Maximum tokens to generate (will be clamped to provider limits)
    pub max_tokens: u32,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.2,
        }
    }
}

impl From<&LlmConfig> for CompletionParams {
    fn from(cfg: &LlmConfig) -> Self {
        Self {
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature.clamp(0.0, 2.0),
        }
    }
}

/// One model response: a plain answer when `tool_calls` is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub stop_reason: Option<String>,
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            stop_reason: Some("stop".to_string()),
        }
    }

    pub fn calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: String::new(),
            tool_calls,
            stop_reason: Some("tool_calls".to_string()),
        }
    }
}

/// How a model call failed, after any provider-level retries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Network failure, timeout, or 5xx.
    #[error("model unavailable: {0}")]
    Unavailable(String),

    #[error("model rate limited: {0}")]
    RateLimited(String),

    /// Malformed response, or a 4xx that retrying cannot fix.
    #[error("model protocol error: {0}")]
    Protocol(String),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat completion request with tool definitions.
    ///
    /// `system` is sent ahead of `messages` and is never part of the stored
    /// conversation.
    async fn complete(
        &self,
        system: &str,
        messages: Vec<Message>,
        tools: Vec<Tool>,
        params: CompletionParams,
    ) -> Result<ModelReply, ModelError>;
}
