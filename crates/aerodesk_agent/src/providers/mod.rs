pub mod mock;
pub mod openai;

use crate::llm::LlmClient;
use aerodesk_core::config::LlmConfig;
use anyhow::Result;
use std::sync::Arc;

/// Build the model client named by `llm.provider`.
pub fn build_client(cfg: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    match cfg.provider.as_str() {
        "openai" => Ok(Arc::new(openai::OpenAiClient::new(cfg)?)),
        "mock" => Ok(Arc::new(mock::MockProvider::new(&cfg.model))),
        other => anyhow::bail!("Unknown LLM provider '{}' (expected \"openai\" or \"mock\")", other),
    }
}
