use aerodesk_agent::{
    airline_registry, build_client, Agent, CompletionParams, CustomerSimulation,
};
use aerodesk_core::AerodeskConfig;
use aerodesk_store::SqliteStore;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Everything a command needs, wired from one config.
pub struct Runtime {
    pub agent: Arc<Agent>,
    pub simulation: Arc<CustomerSimulation>,
}

pub async fn open_store(config: &AerodeskConfig) -> Result<Arc<SqliteStore>> {
    tracing::info!("Opening airline database at {}", config.store.db_path);
    let store = SqliteStore::new(&config.store.db_path)
        .await
        .context("failed to open airline store")?;
    Ok(Arc::new(store))
}

pub async fn build_runtime(config: &AerodeskConfig) -> Result<Runtime> {
    let store = open_store(config).await?;
    let client = build_client(&config.llm).context("failed to initialise model client")?;
    let registry = airline_registry(store.clone()).context("failed to register airline tools")?;
    let params = CompletionParams::from(&config.llm);

    tracing::info!(
        "Agent ready: provider {} model {} with {} tools",
        config.llm.provider,
        config.llm.model,
        registry.len()
    );
    let agent = Arc::new(
        Agent::new(client.clone(), registry, store.clone(), config.agent.clone())
            .with_ledger(store)
            .with_params(params.clone()),
    );
    let simulation = Arc::new(
        CustomerSimulation::new(agent.clone(), client, config.simulation.clone())
            .with_params(params),
    );
    Ok(Runtime { agent, simulation })
}
