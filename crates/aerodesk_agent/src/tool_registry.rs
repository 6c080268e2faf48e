use aerodesk_core::{ActionResult, Tool, ToolInputSchema, ToolOutcome};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// ToolHandler trait
// ============================================================================

#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Unique name used for dispatch (must match the tool name in schema).
    fn name(&self) -> &str;

    /// Human-readable description, sent to the model.
    fn description(&self) -> &str;

    /// JSON schema sent to the LLM so it knows how to call this tool.
    fn schema(&self) -> Tool;

    /// Whether running the tool writes to the store. Side-effecting calls
    /// are recorded in the idempotency ledger.
    fn side_effecting(&self) -> bool {
        false
    }

    /// Execute the tool with the given JSON input.
    async fn execute(&self, input: &Value) -> ToolOutcome;
}

// ============================================================================
// Typed tools
// ============================================================================

/// A tool with a concrete argument type.
///
/// Decoding and `validate` failures become `InvalidArguments` outcomes;
/// an error `ActionResult` from `call` becomes `ActionFailed`.
#[async_trait::async_trait]
pub trait TypedTool: Send + Sync + 'static {
    type Args: DeserializeOwned + Send;

    const NAME: &'static str;
    const DESCRIPTION: &'static str;
    const SIDE_EFFECTING: bool;

    fn parameters() -> ToolInputSchema;

    /// Constraint checks serde cannot express. The message names the
    /// violated constraint.
    fn validate(_args: &Self::Args) -> Result<(), String> {
        Ok(())
    }

    async fn call(&self, args: Self::Args) -> ActionResult;
}

/// Decode tool arguments. A JSON object encoded as a string is unwrapped first.
pub fn decode_args<A: DeserializeOwned>(input: &Value) -> Result<A, String> {
    let decoded;
    let value = match input {
        Value::String(raw) => {
            decoded = serde_json::from_str::<Value>(raw)
                .map_err(|_| "arguments must be a JSON object".to_string())?;
            &decoded
        }
        other => other,
    };
    if !value.is_object() {
        return Err("arguments must be a JSON object".to_string());
    }
    serde_json::from_value(value.clone()).map_err(|e| e.to_string())
}

#[async_trait::async_trait]
impl<T: TypedTool> ToolHandler for T {
    fn name(&self) -> &str {
        T::NAME
    }

    fn description(&self) -> &str {
        T::DESCRIPTION
    }

    fn schema(&self) -> Tool {
        Tool {
            name: T::NAME.to_string(),
            description: T::DESCRIPTION.to_string(),
            input_schema: T::parameters(),
        }
    }

    fn side_effecting(&self) -> bool {
        T::SIDE_EFFECTING
    }

    async fn execute(&self, input: &Value) -> ToolOutcome {
        let args: T::Args = match decode_args(input) {
            Ok(args) => args,
            Err(e) => {
                return ToolOutcome::invalid_arguments(format!(
                    "Invalid arguments for {}: {}",
                    T::NAME,
                    e
                ))
            }
        };
        if let Err(e) = T::validate(&args) {
            return ToolOutcome::invalid_arguments(format!(
                "Invalid arguments for {}: {}",
                T::NAME,
                e
            ));
        }

        let result = self.call(args).await;
        if result.is_success() {
            ToolOutcome::ok(result.render())
        } else {
            ToolOutcome::action_failed(result.render())
        }
    }
}

// ============================================================================
// ToolRegistry
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    Duplicate(String),

    #[error("tool '{0}' is not registered")]
    NotFound(String),
}

/// Tools in registration order, indexed by name.
#[derive(Default)]
pub struct ToolRegistry {
    handlers: Vec<Arc<dyn ToolHandler>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool handler. Names must be unique.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) -> Result<(), RegistryError> {
        let name = handler.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        tracing::debug!("Registered tool: {}", name);
        self.by_name.insert(name, self.handlers.len());
        self.handlers.push(handler);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ToolHandler>, RegistryError> {
        self.by_name
            .get(name)
            .map(|&i| Arc::clone(&self.handlers[i]))
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Tool schemas for the LLM, in registration order.
    pub fn available_tools(&self) -> Vec<Tool> {
        self.handlers.iter().map(|h| h.schema()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
