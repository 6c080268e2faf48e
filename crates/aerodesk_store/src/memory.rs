//! Process-local session store and idempotency ledger.
//!
//! Used by tests; nothing survives a restart.

use aerodesk_core::{IdempotencyLedger, Message, SessionStore, ToolOutcome};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryLedger {
    outcomes: RwLock<HashMap<(String, String), ToolOutcome>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn recorded(&self) -> usize {
        self.outcomes.read().await.len()
    }
}

#[async_trait]
impl IdempotencyLedger for InMemoryLedger {
    async fn recall(&self, key: &str, fingerprint: &str) -> Result<Option<ToolOutcome>> {
        Ok(self
            .outcomes
            .read()
            .await
            .get(&(key.to_string(), fingerprint.to_string()))
            .cloned())
    }

    async fn record(&self, key: &str, fingerprint: &str, outcome: &ToolOutcome) -> Result<()> {
        self.outcomes
            .write()
            .await
            .entry((key.to_string(), fingerprint.to_string()))
            .or_insert_with(|| outcome.clone());
        Ok(())
    }
}
