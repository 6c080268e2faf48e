use crate::llm::{CompletionParams, LlmClient, ModelError, ModelReply};
use crate::retry::{with_retry, RetryConfig};
use aerodesk_core::config::LlmConfig;
use aerodesk_core::{Message, Tool, ToolCall};
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for any OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    retry: RetryConfig,
}

impl OpenAiClient {
    pub fn new(cfg: &LlmConfig) -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY is not set (use provider = \"mock\" to run offline)")?;
        let base_url = cfg
            .base_url
            .clone()
            .or_else(|| env::var("OPENAI_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(cfg.request_timeout_secs))
                .build()
                .context("Failed to build HTTP client")?,
            api_key,
            base_url,
            model: cfg.model.clone(),
            retry: RetryConfig::with_attempts(cfg.max_attempts),
        })
    }
}

/// Convert tool declarations to the `tools` array.
fn to_openai_tools(tools: &[Tool]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.input_schema
                }
            })
        })
        .collect()
}

/// Convert the conversation to chat-completions messages.
/// The system prompt goes first with role "system".
pub fn to_openai_messages(system: &str, messages: &[Message]) -> Vec<Value> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    out.push(json!({ "role": "system", "content": system }));

    for msg in messages {
        match msg {
            Message::System { content } => {
                out.push(json!({ "role": "system", "content": content }));
            }
            Message::Human { content } => {
                out.push(json!({ "role": "user", "content": content }));
            }
            Message::Agent { content, tool_calls } => {
                let mut obj = json!({ "role": "assistant", "content": content });
                if !tool_calls.is_empty() {
                    let calls: Vec<Value> = tool_calls
                        .iter()
                        .map(|c| {
                            json!({
                                "id": c.id,
                                "type": "function",
                                "function": {
                                    "name": c.name,
                                    // OpenAI expects stringified JSON
                                    "arguments": c.arguments.to_string()
                                }
                            })
                        })
                        .collect();
                    obj["tool_calls"] = json!(calls);
                    if content.is_empty() {
                        obj["content"] = Value::Null;
                    }
                }
                out.push(obj);
            }
            Message::ToolResult {
                tool_call_id,
                content,
                ..
            } => {
                out.push(json!({
                    "role": "tool",
                    "tool_call_id": tool_call_id,
                    "content": content
                }));
            }
        }
    }
    out
}

/// Parse a chat-completions response body.
///
/// Arguments that are not valid JSON are kept as a raw string so argument
/// validation can report them to the model instead of failing the turn.
pub fn parse_response(body: &Value) -> Result<ModelReply, ModelError> {
    let choice = body["choices"]
        .get(0)
        .ok_or_else(|| ModelError::Protocol("response has no choices".to_string()))?;
    let message = &choice["message"];
    if !message.is_object() {
        return Err(ModelError::Protocol("choice has no message".to_string()));
    }

    let content = message["content"].as_str().unwrap_or_default().to_string();
    let stop_reason = choice["finish_reason"].as_str().map(|s| s.to_string());

    let mut tool_calls = Vec::new();
    if let Some(calls) = message["tool_calls"].as_array() {
        for call in calls {
            let id = call["id"]
                .as_str()
                .ok_or_else(|| ModelError::Protocol("tool call without id".to_string()))?;
            let func = &call["function"];
            let name = func["name"]
                .as_str()
                .ok_or_else(|| ModelError::Protocol(format!("tool call {id} without name")))?;
            let arguments = match &func["arguments"] {
                Value::String(raw) if raw.trim().is_empty() => json!({}),
                Value::String(raw) => {
                    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
                }
                Value::Null => json!({}),
                other => other.clone(),
            };
            tool_calls.push(ToolCall::new(id, name, arguments));
        }
    }

    Ok(ModelReply {
        content,
        tool_calls,
        stop_reason,
    })
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        system: &str,
        messages: Vec<Message>,
        tools: Vec<Tool>,
        params: CompletionParams,
    ) -> Result<ModelReply, ModelError> {
        let mut payload = json!({
            "model": self.model,
            "messages": to_openai_messages(system, &messages),
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });
        if !tools.is_empty() {
            payload["tools"] = json!(to_openai_tools(&tools));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let response = with_retry(&self.retry, "OpenAI", || {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&payload)
                .send()
        })
        .await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ModelError::Protocol(format!("invalid JSON body: {e}")))?;
        let reply = parse_response(&body)?;
        tracing::debug!(
            "OpenAI reply: {} chars, {} tool call(s), stop={:?}",
            reply.content.len(),
            reply.tool_calls.len(),
            reply.stop_reason
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_conversion() {
        let messages = vec![
            Message::human("book me to paris"),
            Message::agent(
                "",
                vec![ToolCall::new("call_1", "getFlightInfo", json!({"destination": "paris"}))],
            ),
            Message::tool_result("call_1", "Flights found", false),
            Message::agent("There is one flight.", vec![]),
        ];
        let out = to_openai_messages("sys", &messages);
        assert_eq!(out.len(), 5);
        assert_eq!(out[0]["role"], "system");
        assert_eq!(out[1]["role"], "user");
        assert_eq!(out[2]["role"], "assistant");
        assert!(out[2]["content"].is_null());
        assert_eq!(
            out[2]["tool_calls"][0]["function"]["arguments"],
            "{\"destination\":\"paris\"}"
        );
        assert_eq!(out[3]["role"], "tool");
        assert_eq!(out[3]["tool_call_id"], "call_1");
        assert_eq!(out[4]["content"], "There is one flight.");
    }

    #[test]
    fn test_parse_tool_calls() {
        let body = json!({
            "choices": [{
                "finish_reason": "tool_calls",
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "a", "type": "function",
                         "function": {"name": "getAvailableTickets", "arguments": "{\"flightId\": 3}"}},
                        {"id": "b", "type": "function",
                         "function": {"name": "getBookingDetails", "arguments": "{not json"}}
                    ]
                }
            }]
        });
        let reply = parse_response(&body).unwrap();
        assert_eq!(reply.content, "");
        assert_eq!(reply.stop_reason.as_deref(), Some("tool_calls"));
        assert_eq!(reply.tool_calls.len(), 2);
        assert_eq!(reply.tool_calls[0].arguments["flightId"], 3);
        assert_eq!(reply.tool_calls[1].arguments, Value::String("{not json".into()));
    }

    #[test]
    fn test_parse_plain_answer() {
        let body = json!({
            "choices": [{"finish_reason": "stop", "message": {"role": "assistant", "content": "Hello"}}]
        });
        let reply = parse_response(&body).unwrap();
        assert_eq!(reply.content, "Hello");
        assert!(reply.tool_calls.is_empty());
    }

    #[test]
    fn test_parse_missing_choices_is_protocol_error() {
        let err = parse_response(&json!({"error": "boom"})).unwrap_err();
        assert!(matches!(err, ModelError::Protocol(_)));
    }
}
