pub mod agent_loop;
pub mod engine;
pub mod error;
pub mod executor;
pub mod llm;
pub mod prompts;
pub mod providers;
pub mod retry;
pub mod simulation;
pub mod tool_registry;
pub mod tools;

pub use agent_loop::Termination;
pub use engine::{Agent, TurnReport};
pub use error::AgentError;
pub use llm::{CompletionParams, LlmClient, ModelError, ModelReply};
pub use providers::build_client;
pub use simulation::{CustomerSimulation, Speaker, TranscriptEntry};
pub use tool_registry::{ToolHandler, ToolRegistry, TypedTool};
pub use tools::airline_registry;
