use crate::agent_loop::{
    route, CycleBudget, Termination, TurnState, CYCLE_LIMIT_ANSWER, CYCLE_LIMIT_TOOL_RESULT,
};
use crate::error::AgentError;
use crate::executor::ToolExecutor;
use crate::llm::{CompletionParams, LlmClient};
use crate::tool_registry::ToolRegistry;
use aerodesk_core::config::AgentConfig;
use aerodesk_core::{Conversation, IdempotencyLedger, Message, SessionStore};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// What happened during one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub answer: String,
    pub termination: Termination,
    /// Tool cycles executed.
    pub cycles: usize,
    /// Tool calls executed across all cycles.
    pub tool_calls: usize,
}

/// The tool-calling agent.
///
/// Holds the model, a frozen tool registry and the session store. Turns for
/// one session run one at a time; different sessions run concurrently.
pub struct Agent {
    client: Arc<dyn LlmClient>,
    executor: ToolExecutor,
    sessions: Arc<dyn SessionStore>,
    config: AgentConfig,
    params: CompletionParams,
    session_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Agent {
    pub fn new(
        client: Arc<dyn LlmClient>,
        registry: ToolRegistry,
        sessions: Arc<dyn SessionStore>,
        config: AgentConfig,
    ) -> Self {
        let executor = ToolExecutor::new(Arc::new(registry), config.max_tool_result_chars);
        Self {
            client,
            executor,
            sessions,
            config,
            params: CompletionParams::default(),
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Record side-effecting tool outcomes so a call repeated within one
    /// turn (same id, tool and arguments) is not executed twice.
    pub fn with_ledger(mut self, ledger: Arc<dyn IdempotencyLedger>) -> Self {
        self.executor = self.executor.with_ledger(ledger);
        self
    }

    pub fn with_params(mut self, params: CompletionParams) -> Self {
        self.params = params;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        self.executor.registry()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Load the session, run one turn, persist what it appended, and return
    /// the answer.
    pub async fn submit(&self, session_id: &str, text: &str) -> Result<String, AgentError> {
        self.submit_with_report(session_id, text)
            .await
            .map(|report| report.answer)
    }

    #[tracing::instrument(skip(self, text))]
    pub async fn submit_with_report(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<TurnReport, AgentError> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let history = self
            .sessions
            .load(session_id)
            .await
            .map_err(AgentError::SessionStore)?;
        let mut conversation = Conversation::resume(session_id, history);
        let start = conversation.len();

        let secs = self.config.turn_timeout_secs;
        let result = match tokio::time::timeout(
            Duration::from_secs(secs),
            self.run_turn(&mut conversation, text),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Turn for session {} timed out after {}s", session_id, secs);
                Err(AgentError::TurnTimeout(secs))
            }
        };

        // A failed turn still keeps what it completed; a tool batch cut off
        // mid-way is left out so every stored call has its result.
        let end = settled_len(conversation.messages()).max(start);
        let appended = &conversation.messages()[start..end];
        if let Err(e) = self.sessions.append(session_id, appended).await {
            tracing::error!("Failed to persist session {}: {:#}", session_id, e);
            return match result {
                Ok(_) => Err(AgentError::SessionStore(e)),
                Err(turn_err) => Err(turn_err),
            };
        }
        result
    }

    /// Run one turn against `conversation`, appending the human message,
    /// every model reply and every tool result.
    ///
    /// No store is touched except through tools; the caller owns persistence.
    #[tracing::instrument(skip(self, conversation, text), fields(session = conversation.session_id()))]
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        text: &str,
    ) -> Result<TurnReport, AgentError> {
        let turn = conversation.len();
        conversation.push(Message::human(text));

        let tools = self.executor.registry().available_tools();
        let mut budget = CycleBudget::new(self.config.max_cycles);
        let mut tool_calls = 0;
        let mut state = TurnState::AwaitingModel;

        loop {
            state = match state {
                TurnState::AwaitingModel => {
                    let reply = self
                        .client
                        .complete(
                            &self.config.system_prompt,
                            conversation.messages().to_vec(),
                            tools.clone(),
                            self.params.clone(),
                        )
                        .await
                        .map_err(|e| {
                            tracing::warn!("Model call failed: {}", e);
                            AgentError::from(e)
                        })?;
                    conversation.push(Message::agent(
                        reply.content.clone(),
                        reply.tool_calls.clone(),
                    ));
                    route(reply)
                }
                TurnState::ExecutingTools(calls) => {
                    if !budget.try_spend() {
                        tracing::warn!(
                            "Cycle limit ({}) reached with {} call(s) pending",
                            self.config.max_cycles,
                            calls.len()
                        );
                        for call in &calls {
                            conversation.push(Message::tool_result(
                                call.id.clone(),
                                CYCLE_LIMIT_TOOL_RESULT,
                                true,
                            ));
                        }
                        conversation.push(Message::agent(CYCLE_LIMIT_ANSWER, Vec::new()));
                        return Ok(TurnReport {
                            answer: CYCLE_LIMIT_ANSWER.to_string(),
                            termination: Termination::CycleLimit,
                            cycles: budget.used(),
                            tool_calls,
                        });
                    }

                    tracing::info!("API tool_use: {} call(s)", calls.len());
                    let results = self
                        .executor
                        .execute_batch(conversation.session_id(), turn, &calls)
                        .await?;
                    tool_calls += calls.len();
                    conversation.extend(results);
                    TurnState::AwaitingModel
                }
                TurnState::Done(answer) => {
                    tracing::info!(
                        "Turn done after {} cycle(s), {} tool call(s)",
                        budget.used(),
                        tool_calls
                    );
                    return Ok(TurnReport {
                        answer,
                        termination: Termination::Answered,
                        cycles: budget.used(),
                        tool_calls,
                    });
                }
            };
        }
    }

    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.session_locks.lock().await;
        // Forget locks nobody holds or waits on.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Length of the longest prefix in which every tool call has its result.
fn settled_len(messages: &[Message]) -> usize {
    let mut pending: HashSet<&str> = HashSet::new();
    let mut settled = 0;
    for (i, message) in messages.iter().enumerate() {
        match message {
            Message::Agent { tool_calls, .. } => {
                pending.extend(tool_calls.iter().map(|c| c.id.as_str()));
            }
            Message::ToolResult { tool_call_id, .. } => {
                pending.remove(tool_call_id.as_str());
            }
            _ => {}
        }
        if pending.is_empty() {
            settled = i + 1;
        }
    }
    settled
}
