use crate::llm::ModelError;

/// Failures that end a turn. Tool argument and domain failures never appear
/// here; they are folded into tool results for the model to handle.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("model rate limited: {0}")]
    ModelRateLimited(String),

    #[error("model protocol error: {0}")]
    ModelProtocol(String),

    /// The model named a tool the registry does not hold.
    #[error("tool '{0}' is not registered")]
    ToolNotFound(String),

    #[error("turn timed out after {0}s")]
    TurnTimeout(u64),

    #[error("session timed out after {0}s")]
    SessionTimeout(u64),

    #[error("session store failure: {0}")]
    SessionStore(#[source] anyhow::Error),
}

impl AgentError {
    /// True when the same request may succeed later; false when the system
    /// is misconfigured or the model speaks a protocol we cannot parse.
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::ModelUnavailable(_)
            | AgentError::ModelRateLimited(_)
            | AgentError::TurnTimeout(_)
            | AgentError::SessionTimeout(_)
            | AgentError::SessionStore(_) => true,
            AgentError::ModelProtocol(_) | AgentError::ToolNotFound(_) => false,
        }
    }
}

impl From<ModelError> for AgentError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Unavailable(msg) => AgentError::ModelUnavailable(msg),
            ModelError::RateLimited(msg) => AgentError::ModelRateLimited(msg),
            ModelError::Protocol(msg) => AgentError::ModelProtocol(msg),
        }
    }
}
