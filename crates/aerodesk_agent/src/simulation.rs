//! Two-party simulation: the support agent against a model playing a customer.
//!
//! The opening line comes from the customer. The agent answers with a full
//! tool-calling turn, then the customer replies from a role-swapped view of
//! the transcript. The run ends when the customer says `FINISHED` or the
//! transcript grows past `max_messages`. The whole run is bounded by
//! `session_timeout_secs`.

use crate::engine::Agent;
use crate::error::AgentError;
use crate::llm::{CompletionParams, LlmClient};
use crate::prompts::{CustomerPrompt, FINISHED};
use aerodesk_core::config::SimulationConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Customer,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

impl TranscriptEntry {
    pub fn customer(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Customer,
            text: text.into(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Agent,
            text: text.into(),
        }
    }
}

pub struct CustomerSimulation {
    agent: Arc<Agent>,
    customer: Arc<dyn LlmClient>,
    config: SimulationConfig,
    params: CompletionParams,
}

impl CustomerSimulation {
    pub fn new(agent: Arc<Agent>, customer: Arc<dyn LlmClient>, config: SimulationConfig) -> Self {
        Self {
            agent,
            customer,
            config,
            params: CompletionParams::default(),
        }
    }

    pub fn with_params(mut self, params: CompletionParams) -> Self {
        self.params = params;
        self
    }

    /// Run one simulation starting from the customer's `opening` line.
    ///
    /// Each run gets a fresh agent session.
    #[tracing::instrument(skip(self, opening))]
    pub async fn run(&self, opening: &str) -> Result<Vec<TranscriptEntry>, AgentError> {
        let session_id = format!("sim-{}", uuid::Uuid::new_v4());
        let secs = self.config.session_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(secs), self.converse(&session_id, opening)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Simulation {} timed out after {}s", session_id, secs);
                Err(AgentError::SessionTimeout(secs))
            }
        }
    }

    async fn converse(
        &self,
        session_id: &str,
        opening: &str,
    ) -> Result<Vec<TranscriptEntry>, AgentError> {
        let system = CustomerPrompt::system(&self.config.instructions);
        let mut transcript = vec![TranscriptEntry::customer(opening)];
        let mut prompt = opening.to_string();

        loop {
            let answer = self.agent.submit(session_id, &prompt).await?;
            transcript.push(TranscriptEntry::agent(answer));

            let reply = self
                .customer
                .complete(
                    &system,
                    CustomerPrompt::swapped_view(&transcript),
                    Vec::new(),
                    self.params.clone(),
                )
                .await?;
            let said = reply.content.trim().to_string();
            tracing::debug!("Simulated customer: {}", said);
            transcript.push(TranscriptEntry::customer(said.clone()));

            if transcript.len() > self.config.max_messages || said == FINISHED {
                tracing::info!(
                    "Simulation {} ended after {} message(s)",
                    session_id,
                    transcript.len()
                );
                return Ok(transcript);
            }
            prompt = said;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;
    use crate::tool_registry::ToolRegistry;
    use crate::llm::ModelReply;
    use aerodesk_core::config::AgentConfig;
    use aerodesk_core::Message;

    struct NoSessions;

    #[async_trait::async_trait]
    impl aerodesk_core::SessionStore for NoSessions {
        async fn load(&self, _session_id: &str) -> anyhow::Result<Vec<Message>> {
            Ok(Vec::new())
        }
        async fn append(&self, _session_id: &str, _messages: &[Message]) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn agent(replies: Vec<ModelReply>) -> Arc<Agent> {
        Arc::new(Agent::new(
            Arc::new(MockProvider::scripted(replies)),
            ToolRegistry::new(),
            Arc::new(NoSessions),
            AgentConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_stops_when_customer_finishes() {
        let customer = Arc::new(MockProvider::scripted(vec![
            ModelReply::text("I want all my money back"),
            ModelReply::text("FINISHED"),
        ]));
        let sim = CustomerSimulation::new(
            agent(vec![
                ModelReply::text("How can I help?"),
                ModelReply::text("Refunds are not possible after 5 years."),
            ]),
            customer.clone(),
            SimulationConfig::default(),
        );

        let transcript = sim.run("Hi, I need help").await.unwrap();
        let texts: Vec<_> = transcript.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Hi, I need help",
                "How can I help?",
                "I want all my money back",
                "Refunds are not possible after 5 years.",
                "FINISHED",
            ]
        );
        assert_eq!(transcript[4].speaker, Speaker::Customer);

        let first = &customer.requests()[0];
        assert!(first.system.contains("Harrison"));
        assert_eq!(first.messages[0], Message::agent("Hi, I need help", Vec::new()));
        assert_eq!(first.messages[1], Message::human("How can I help?"));
        assert!(first.tools.is_empty());
    }

    #[tokio::test]
    async fn test_stops_past_max_messages() {
        // Unscripted mocks never say FINISHED.
        let sim = CustomerSimulation::new(
            agent(Vec::new()),
            Arc::new(MockProvider::new("customer")),
            SimulationConfig {
                max_messages: 4,
                ..SimulationConfig::default()
            },
        );
        let transcript = sim.run("Hello").await.unwrap();
        assert_eq!(transcript.len(), 5);
        assert_eq!(transcript[0].speaker, Speaker::Customer);
        assert_eq!(transcript[1].speaker, Speaker::Agent);
    }

    struct SlowCustomer;

    #[async_trait::async_trait]
    impl LlmClient for SlowCustomer {
        async fn complete(
            &self,
            _system: &str,
            _messages: Vec<Message>,
            _tools: Vec<aerodesk_core::Tool>,
            _params: CompletionParams,
        ) -> Result<ModelReply, crate::llm::ModelError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ModelReply::text("Still waiting for my refund"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_whole_run_is_time_bounded() {
        let sim = CustomerSimulation::new(
            agent(Vec::new()),
            Arc::new(SlowCustomer),
            SimulationConfig {
                max_messages: 100,
                session_timeout_secs: 150,
                ..SimulationConfig::default()
            },
        );
        let err = sim.run("Hello").await.unwrap_err();
        assert!(matches!(err, AgentError::SessionTimeout(150)));
        assert!(err.is_retryable());
    }
}
