mod cli;
mod runtime;

use aerodesk_agent::{Agent, Speaker};
use aerodesk_core::AerodeskConfig;
use aerodesk_store::seed_demo_data;
use anyhow::Result;
use clap::Parser;
use rustyline::error::ReadlineError;
use tracing::{error, info};

use crate::cli::{Cli, Commands};
use crate::runtime::{build_runtime, open_store};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(e) = run(cli).await {
        eprintln!("aerodesk: {}", e);
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout carries only answers.
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AerodeskConfig::load_or_default(&cli.config);
    if let Some(db) = cli.db {
        config.store.db_path = db;
    }
    if let Some(provider) = cli.provider {
        config.llm.provider = provider;
    }

    match cli.command.unwrap_or(Commands::Chat { session: None }) {
        Commands::Seed => {
            let store = open_store(&config).await?;
            let today = chrono::Local::now().date_naive();
            let summary = seed_demo_data(&*store, today).await?;
            if summary.is_empty() {
                println!("Demo data already present.");
            } else {
                println!(
                    "Seeded {} users, {} flights, {} tickets, {} bookings.",
                    summary.users, summary.flights, summary.tickets, summary.bookings
                );
            }
            Ok(())
        }
        Commands::Ask { session, text } => {
            let runtime = build_runtime(&config).await?;
            let answer = runtime.agent.submit(&session, &text.join(" ")).await?;
            println!("{}", answer);
            Ok(())
        }
        Commands::Simulate { prompt, json } => {
            let runtime = build_runtime(&config).await?;
            let transcript = runtime.simulation.run(&prompt.join(" ")).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&transcript)?);
            } else {
                for entry in transcript {
                    let who = match entry.speaker {
                        Speaker::Customer => "Customer",
                        Speaker::Agent => "Agent",
                    };
                    println!("{}: {}\n", who, entry.text);
                }
            }
            Ok(())
        }
        Commands::Chat { session } => {
            let runtime = build_runtime(&config).await?;
            run_chat(&runtime.agent, session).await
        }
        #[cfg(feature = "gateway")]
        Commands::Serve { host, port } => {
            let runtime = build_runtime(&config).await?;
            let host = host.unwrap_or(config.gateway.host);
            let port = port.unwrap_or(config.gateway.port);
            let state = aerodesk_gateway::AppState {
                agent: runtime.agent,
                simulation: runtime.simulation,
            };
            aerodesk_gateway::GatewayServer::new(state, &host, port)
                .serve()
                .await
        }
    }
}

fn new_session_id() -> String {
    format!("cli-{}", uuid::Uuid::new_v4())
}

async fn run_chat(agent: &Agent, session: Option<String>) -> Result<()> {
    let mut session_id = session.unwrap_or_else(new_session_id);
    let mut rl = rustyline::DefaultEditor::new()?;

    println!("Aerodesk online (session {}). Type 'quit' to exit, '/new' for a fresh session.", session_id);

    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(trimmed);

        match trimmed {
            "quit" | "exit" => break,
            "/new" => {
                session_id = new_session_id();
                println!("Started session {}", session_id);
                continue;
            }
            _ => {}
        }

        match agent.submit(&session_id, trimmed).await {
            Ok(answer) => println!("\nAgent: {}\n", answer),
            Err(e) => {
                error!("Turn failed: {}", e);
                if e.is_retryable() {
                    println!("\n[Temporarily unavailable, try again]: {}\n", e);
                } else {
                    println!("\n[System Error]: {}\n", e);
                }
            }
        }
    }

    info!("Chat session {} closed", session_id);
    Ok(())
}
