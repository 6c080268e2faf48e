//! Mock LLM Provider: deterministic responses for testing without API keys.
//!
//! Replays a script of replies in order. Once the script runs out it answers
//! with a fixed text, so an unscripted loop still terminates.

use crate::llm::{CompletionParams, LlmClient, ModelError, ModelReply};
use aerodesk_core::{Message, Tool};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// What the provider was asked, kept for assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub tools: Vec<Tool>,
}

pub struct MockProvider {
    model: String,
    script: Mutex<VecDeque<Result<ModelReply, ModelError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(model: &str) -> Self {
        Self::scripted_results(model, Vec::new())
    }

    pub fn scripted(replies: Vec<ModelReply>) -> Self {
        Self::scripted_results("scripted", replies.into_iter().map(Ok).collect())
    }

    /// Script that may include failures.
    pub fn scripted_results(model: &str, script: Vec<Result<ModelReply, ModelError>>) -> Self {
        Self {
            model: model.to_string(),
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl LlmClient for MockProvider {
    async fn complete(
        &self,
        system: &str,
        messages: Vec<Message>,
        tools: Vec<Tool>,
        _params: CompletionParams,
    ) -> Result<ModelReply, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let last_human = messages
            .iter()
            .rev()
            .find_map(|m| match m {
                Message::Human { content } => Some(content.clone()),
                _ => None,
            })
            .unwrap_or_default();

        if let Ok(mut log) = self.requests.lock() {
            log.push(RecordedRequest {
                system: system.to_string(),
                messages,
                tools,
            });
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(reply) => reply,
            None => Ok(ModelReply::text(format!(
                "(Mock {} Response) I received: {}",
                self.model, last_human
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerodesk_core::ToolCall;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_complete() {
        let provider = MockProvider::new("test-model");
        let resp = provider
            .complete("system", vec![Message::human("hi")], vec![], CompletionParams::default())
            .await
            .unwrap();
        assert!(resp.tool_calls.is_empty());
        assert!(resp.content.contains("Mock"));
        assert!(resp.content.contains("test-model"));
        assert!(resp.content.contains("hi"));
    }

    #[tokio::test]
    async fn test_script_replays_in_order_then_falls_back() {
        let provider = MockProvider::scripted_results(
            "s",
            vec![
                Ok(ModelReply::calls(vec![ToolCall::new("c1", "getFlightInfo", json!({}))])),
                Err(ModelError::Unavailable("down".into())),
            ],
        );
        let first = provider
            .complete("sys", vec![], vec![], CompletionParams::default())
            .await
            .unwrap();
        assert_eq!(first.tool_calls.len(), 1);
        let second = provider
            .complete("sys", vec![], vec![], CompletionParams::default())
            .await;
        assert_eq!(second, Err(ModelError::Unavailable("down".into())));
        let third = provider
            .complete("sys", vec![], vec![], CompletionParams::default())
            .await
            .unwrap();
        assert!(third.content.contains("Mock"));
        assert_eq!(provider.calls(), 3);
        assert_eq!(provider.requests().len(), 3);
        assert_eq!(provider.requests()[0].system, "sys");
    }
}
