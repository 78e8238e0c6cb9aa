mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coffeechat")]
#[command(about = "Pair people across two groups and book coffee chats on a shared calendar")]
struct Cli {
    /// Log every availability check and skipped day
    #[arg(long, global = true)]
    debug: bool,

    /// Create events without sending invitation emails
    #[arg(long)]
    no_email: bool,

    /// Show what would be scheduled without creating any events
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect a calendar account (opens the browser)
    Auth {
        #[arg(default_value = "google")]
        provider: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Auth { provider }) => commands::auth::run(&provider).await,
        None => {
            let flags = commands::schedule::Flags {
                dry_run: cli.dry_run,
                send_email: !cli.no_email,
            };
            commands::schedule::run(flags).await
        }
    }
}
