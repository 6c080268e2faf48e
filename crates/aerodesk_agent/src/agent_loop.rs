//! Routing policy for one turn, as an explicit state machine.
//!
//! ```text
//! AwaitingModel --(reply has calls)--> ExecutingTools --> AwaitingModel
//! AwaitingModel --(reply has none)---> Done
//! ```
//!
//! Every ExecutingTools → AwaitingModel round counts as one cycle. When the
//! cycle budget is spent the turn ends with [`CYCLE_LIMIT_ANSWER`].

use crate::llm::ModelReply;
use aerodesk_core::ToolCall;

pub const CYCLE_LIMIT_ANSWER: &str =
    "I'm sorry, I wasn't able to complete that request. Could you try again, perhaps with more detail?";

/// Tool-result text for calls skipped because the cycle budget ran out.
pub const CYCLE_LIMIT_TOOL_RESULT: &str = "Error: not executed, step limit for this request reached";

#[derive(Debug, Clone, PartialEq)]
pub enum TurnState {
    AwaitingModel,
    ExecutingTools(Vec<ToolCall>),
    Done(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The model produced an answer with no tool calls.
    Answered,
    /// The cycle budget ran out and a canned answer was substituted.
    CycleLimit,
}

/// Decide what follows a model reply.
pub fn route(reply: ModelReply) -> TurnState {
    if reply.tool_calls.is_empty() {
        TurnState::Done(reply.content)
    } else {
        TurnState::ExecutingTools(reply.tool_calls)
    }
}

/// Counts tool cycles against the configured maximum.
#[derive(Debug, Clone, Copy)]
pub struct CycleBudget {
    max: usize,
    used: usize,
}

impl CycleBudget {
    pub fn new(max: usize) -> Self {
        Self { max, used: 0 }
    }

    /// Claim one cycle; false once the budget is spent.
    pub fn try_spend(&mut self) -> bool {
        if self.used >= self.max {
            return false;
        }
        self.used += 1;
        true
    }

    pub fn used(&self) -> usize {
        self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_plain_answer_is_done() {
        assert_eq!(route(ModelReply::text("Hello")), TurnState::Done("Hello".into()));
    }

    #[test]
    fn test_route_calls_execute_in_received_order() {
        let calls = vec![
            ToolCall::new("a", "getFlightInfo", json!({})),
            ToolCall::new("b", "getAvailableTickets", json!({})),
        ];
        match route(ModelReply::calls(calls.clone())) {
            TurnState::ExecutingTools(got) => assert_eq!(got, calls),
            other => panic!("expected ExecutingTools, got {other:?}"),
        }
    }

    #[test]
    fn test_budget() {
        let mut budget = CycleBudget::new(2);
        assert!(budget.try_spend());
        assert!(budget.try_spend());
        assert!(!budget.try_spend());
        assert_eq!(budget.used(), 2);

        let mut none = CycleBudget::new(0);
        assert!(!none.try_spend());
    }
}
