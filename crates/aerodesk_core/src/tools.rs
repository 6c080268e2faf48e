//! Tool declaration and outcome types shared by the agent and the stores.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON tool declaration sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

/// JSON Schema for tool input parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: Value,
    pub required: Vec<String>,
}

impl ToolInputSchema {
    pub fn object(properties: Value, required: &[&str]) -> Self {
        Self {
            schema_type: "object".to_string(),
            properties,
            required: required.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Classification of tool execution errors.
///
/// Both kinds are recoverable: the text goes back to the model, which may
/// correct its arguments or explain the failure to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// Arguments failed to decode or violated a constraint.
    InvalidArguments,
    /// The domain action ran and reported failure (missing row, constraint).
    ActionFailed,
}

/// Structured result from a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub content: String,
    pub is_error: bool,
    pub error_kind: Option<ToolErrorKind>,
}

impl ToolOutcome {
    pub fn ok(content: String) -> Self {
        Self { content, is_error: false, error_kind: None }
    }

    pub fn invalid_arguments(msg: String) -> Self {
        Self { content: msg, is_error: true, error_kind: Some(ToolErrorKind::InvalidArguments) }
    }

    pub fn action_failed(msg: String) -> Self {
        Self { content: msg, is_error: true, error_kind: Some(ToolErrorKind::ActionFailed) }
    }
}
