//! Tool execution step: one tool-result message per requested call.

use crate::error::AgentError;
use crate::tool_registry::{ToolHandler, ToolRegistry};
use aerodesk_core::{IdempotencyLedger, Message, ToolCall, ToolOutcome};
use futures_util::FutureExt;
use regex::Regex;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, LazyLock};

static RE_INJECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(ignore\s+(all\s+)?previous\s+instructions|system\s*:\s*you\s+are|<\s*/?\s*system\s*>)").unwrap()
});

pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    ledger: Option<Arc<dyn IdempotencyLedger>>,
    max_result_chars: usize,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, max_result_chars: usize) -> Self {
        Self {
            registry,
            ledger: None,
            max_result_chars,
        }
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn IdempotencyLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Run `calls` in order and return their tool-result messages in the
    /// same order.
    ///
    /// `turn` is the log position of the human message that opened the turn;
    /// call ids are only unique within it.
    ///
    /// Every name is resolved before anything runs, so an unknown tool
    /// fails the batch without side effects.
    #[tracing::instrument(skip(self, calls), fields(calls = calls.len()))]
    pub async fn execute_batch(
        &self,
        session_id: &str,
        turn: usize,
        calls: &[ToolCall],
    ) -> Result<Vec<Message>, AgentError> {
        let mut handlers = Vec::with_capacity(calls.len());
        for call in calls {
            let handler = self.registry.resolve(&call.name).map_err(|_| {
                tracing::error!("Model requested unregistered tool '{}'", call.name);
                AgentError::ToolNotFound(call.name.clone())
            })?;
            handlers.push(handler);
        }

        let mut results = Vec::with_capacity(calls.len());
        for (call, handler) in calls.iter().zip(handlers) {
            let key = idempotency_key(session_id, turn, &call.id);
            let outcome = self.execute_one(&key, call, handler.as_ref()).await;
            results.push(Message::tool_result(
                call.id.clone(),
                sanitize_tool_result(&outcome.content, self.max_result_chars),
                outcome.is_error,
            ));
        }
        Ok(results)
    }

    async fn execute_one(&self, key: &str, call: &ToolCall, handler: &dyn ToolHandler) -> ToolOutcome {
        let ledger = if handler.side_effecting() {
            self.ledger.as_ref()
        } else {
            None
        };
        let fingerprint = call_fingerprint(call);

        if let Some(ledger) = ledger {
            match ledger.recall(key, &fingerprint).await {
                Ok(Some(outcome)) => {
                    tracing::info!("Tool {} ({}) already ran, replaying recorded result", call.name, key);
                    return outcome;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Idempotency lookup failed for {}: {:#}", key, e),
            }
        }

        tracing::info!("Tool: {} input: {}", call.name, call.arguments);
        let outcome = match AssertUnwindSafe(handler.execute(&call.arguments))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("Tool '{}' panicked: {}", call.name, reason);
                ToolOutcome::action_failed(format!("Error: {} failed unexpectedly", call.name))
            }
        };

        if outcome.is_error {
            tracing::warn!("Tool '{}' failed: {}", call.name, outcome.content);
        } else if let Some(ledger) = ledger {
            if let Err(e) = ledger.record(key, &fingerprint, &outcome).await {
                tracing::warn!("Failed to record idempotency key {}: {:#}", key, e);
            }
        }
        outcome
    }
}

pub fn idempotency_key(session_id: &str, turn: usize, call_id: &str) -> String {
    format!("{session_id}:{turn}:{call_id}")
}

/// Tool name plus arguments in canonical form (object keys sorted).
pub fn call_fingerprint(call: &ToolCall) -> String {
    format!("{}:{}", call.name, canonical(&call.arguments))
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Value::Object(keys.into_iter().map(|k| (k.clone(), canonical(&map[k]))).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

/// Sanitize tool output before it enters the conversation.
///
/// This prevents:
/// 1. Context overflow from huge tool outputs (truncate to `max_chars`)
/// 2. Potential prompt injection from tool output (offending lines are dropped)
pub fn sanitize_tool_result(text: &str, max_chars: usize) -> String {
    let mut result = text.to_string();

    // 1. Truncate overly long results (UTF-8 safe)
    if let Some((boundary, _)) = result.char_indices().nth(max_chars) {
        result.truncate(boundary);
        // Prefer a line break if it keeps most of the text
        if let Some(last_newline) = result.rfind('\n') {
            if last_newline > boundary / 2 {
                result.truncate(last_newline);
            }
        }
        result.push_str("\n... [truncated, output too long]");
    }

    // 2. Drop lines that look like system prompt injection attempts
    if RE_INJECTION.is_match(&result) {
        tracing::warn!("Potential prompt injection detected in tool result, sanitizing");
        result = result
            .lines()
            .filter(|line| !RE_INJECTION.is_match(line))
            .collect::<Vec<_>>()
            .join("\n");
    }

    result
}
