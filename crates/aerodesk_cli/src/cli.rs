use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "AERODESK_CONFIG", default_value = "aerodesk.toml", global = true)]
    pub config: PathBuf,

    /// SQLite database path (overrides [store].db_path)
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Model provider: "openai" or "mock" (overrides [llm].provider)
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat with the support agent (default)
    Chat {
        /// Resume an existing session instead of starting a new one
        #[arg(long)]
        session: Option<String>,
    },
    /// Send one message and print the answer
    Ask {
        #[arg(long, default_value = "cli")]
        session: String,
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Let a simulated customer talk to the agent
    Simulate {
        #[arg(required = true)]
        prompt: Vec<String>,
        /// Print the transcript as JSON
        #[arg(long)]
        json: bool,
    },
    /// Insert the demo users, flights and tickets
    Seed,
    /// Run the HTTP gateway
    #[cfg(feature = "gateway")]
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}
