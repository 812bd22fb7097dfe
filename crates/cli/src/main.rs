//! Helpline CLI — the main entry point.
//!
//! Commands:
//! - `init`     — Write a default config and the sample data files
//! - `chat`     — Interactive or single-question mode
//! - `serve`    — Start the HTTP API server
//! - `inspect`  — Show loaded categories and contexts
//! - `doctor`   — Diagnose config, data and provider health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "helpline",
    about = "Helpline — LLM-routed customer support answers",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config and sample data files
    Init,

    /// Ask questions from the terminal
    Chat {
        /// Ask a single question instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show derived categories and context schemas without calling the service
    Inspect,

    /// Diagnose config, data files and provider reachability
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Inspect => commands::inspect::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
