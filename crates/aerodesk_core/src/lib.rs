pub mod action;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod store;
pub mod tools;

pub use action::{ActionResult, ActionStatus};
pub use config::AerodeskConfig;
pub use conversation::{Conversation, Message, ToolCall};
pub use domain::*;
pub use store::{AirlineStore, IdempotencyLedger, SessionStore, StoreError, StoreResult};
pub use tools::{Tool, ToolErrorKind, ToolInputSchema, ToolOutcome};
