use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AerodeskConfig {
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub store: StoreConfig,
    pub gateway: GatewayConfig,
    pub simulation: SimulationConfig,
}

impl AerodeskConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: AerodeskConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("LLM_MAX_TOKENS") {
            if let Ok(n) = v.parse() {
                self.llm.max_tokens = n;
            }
        }
        if let Ok(v) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(n) = v.parse() {
                self.llm.temperature = n;
            }
        }
        if let Ok(v) = std::env::var("AERODESK_DB") {
            self.store.db_path = v;
        }
        if let Ok(v) = std::env::var("AERODESK_MAX_CYCLES") {
            if let Ok(n) = v.parse() {
                self.agent.max_cycles = n;
            }
        }
        if let Ok(v) = std::env::var("GATEWAY_HOST") {
            self.gateway.host = v;
        }
        if let Ok(v) = std::env::var("GATEWAY_PORT") {
            if let Ok(n) = v.parse() {
                self.gateway.port = n;
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// "openai" for any chat-completions compatible endpoint, "mock" for offline runs.
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    /// Attempts per model call, including the first. Retries happen inside
    /// the provider; the agent loop itself never retries.
    pub max_attempts: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            max_tokens: 1024,
            temperature: 0.2,
            request_timeout_secs: 60,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub system_prompt: String,
    /// Upper bound on model → tools → model cycles within one turn.
    pub max_cycles: usize,
    pub turn_timeout_secs: u64,
    /// Characters of a single tool result kept in the conversation.
    pub max_tool_result_chars: usize,
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful customer support agent for an airline. \
You can look up flights and tickets, register customers, create bookings and take payments \
by calling the tools you are given. \
Always look a flight up before booking it and quote the ticket price to the customer. \
Use the ids returned by earlier tool results; never invent ids. \
If a tool reports an error, explain it plainly or correct your arguments and try again.";

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_cycles: 8,
            turn_timeout_secs: 120,
            max_tool_result_chars: 4000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: "aerodesk.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Persona handed to the simulated customer.
    pub instructions: String,
    /// Stop once the transcript grows past this many messages.
    pub max_messages: usize,
    /// Wall-clock bound on one whole simulated conversation.
    pub session_timeout_secs: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            instructions: "Your name is Harrison. You are trying to get a refund for the trip you took to Alaska. \
                           You want them to give you ALL the money back. Be extremely persistent. \
                           This trip happened 5 years ago."
                .to_string(),
            max_messages: 6,
            session_timeout_secs: 600,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = AerodeskConfig::default();
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.agent.max_cycles, 8);
        assert_eq!(cfg.store.db_path, "aerodesk.db");
        assert_eq!(cfg.simulation.max_messages, 6);
        assert!(cfg.agent.system_prompt.contains("airline"));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[llm]
provider = "mock"
model = "scripted"
"#;
        let cfg: AerodeskConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.llm.model, "scripted");
        // Defaults for unspecified fields
        assert_eq!(cfg.llm.max_attempts, 3);
        assert_eq!(cfg.agent.turn_timeout_secs, 120);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[llm]
provider = "openai"
model = "gpt-4o"
base_url = "http://localhost:8080/v1"
max_tokens = 2048
temperature = 0.0
request_timeout_secs = 30
max_attempts = 5

[agent]
system_prompt = "You sell tickets."
max_cycles = 3
turn_timeout_secs = 45
max_tool_result_chars = 1000

[store]
db_path = "data/airline.db"

[gateway]
host = "0.0.0.0"
port = 8088

[simulation]
instructions = "You want a window seat."
max_messages = 10
session_timeout_secs = 90
"#;
        let cfg: AerodeskConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.llm.base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(cfg.llm.max_attempts, 5);
        assert_eq!(cfg.agent.system_prompt, "You sell tickets.");
        assert_eq!(cfg.agent.max_cycles, 3);
        assert_eq!(cfg.store.db_path, "data/airline.db");
        assert_eq!(cfg.gateway.port, 8088);
        assert_eq!(cfg.simulation.max_messages, 10);
        assert_eq!(cfg.simulation.session_timeout_secs, 90);
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        // Part 1: env overrides
        std::env::set_var("LLM_PROVIDER", "mock");
        std::env::set_var("AERODESK_MAX_CYCLES", "4");

        let mut cfg = AerodeskConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.agent.max_cycles, 4);

        // Clean up env vars before testing defaults
        std::env::remove_var("LLM_PROVIDER");
        std::env::remove_var("AERODESK_MAX_CYCLES");

        // Part 2: nonexistent path returns defaults (no env interference)
        let cfg = AerodeskConfig::load_or_default("/nonexistent/path.toml");
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.agent.max_cycles, 8);
    }
}
