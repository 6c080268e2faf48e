//! The success/error envelope every domain action returns.

use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub status: ActionStatus,
    pub message: String,
    pub data: Option<Value>,
}

impl ActionResult {
    /// Success carrying a serialisable record.
    pub fn success<T: Serialize>(message: impl Into<String>, data: &T) -> Self {
        let message = message.into();
        match serde_json::to_value(data) {
            Ok(value) => Self {
                status: ActionStatus::Success,
                message,
                data: Some(value),
            },
            Err(e) => Self::error(format!("{message}, but the record could not be encoded: {e}")),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Error,
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }

    /// Text handed to the model as the tool result.
    ///
    /// Successful results append the record as compact JSON so the model can
    /// pick ids out of it for follow-up calls.
    pub fn render(&self) -> String {
        match (&self.status, &self.data) {
            (ActionStatus::Success, Some(data)) => format!("{}\n{}", self.message, data),
            (ActionStatus::Success, None) => self.message.clone(),
            (ActionStatus::Error, _) => format!("Error: {}", self.message),
        }
    }
}

impl From<StoreError> for ActionResult {
    fn from(err: StoreError) -> Self {
        ActionResult::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_render_includes_record() {
        let result = ActionResult::success("Ticket created", &json!({"id": 7, "price": 200.0}));
        assert!(result.is_success());
        let text = result.render();
        assert!(text.starts_with("Ticket created\n"));
        assert!(text.contains("\"id\":7"));
    }

    #[test]
    fn test_error_render() {
        let result = ActionResult::error("ticket 42 not found");
        assert!(!result.is_success());
        assert_eq!(result.render(), "Error: ticket 42 not found");
        assert!(result.data.is_none());
    }

    #[test]
    fn test_from_store_error() {
        let result: ActionResult = StoreError::not_found("booking", 3).into();
        assert_eq!(result.status, ActionStatus::Error);
        assert_eq!(result.message, "booking 3 not found");
    }
}
