use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "baton-cmd")]
#[command(about = "Runs relay chains and turn exchanges over rendezvous hand-offs")]
#[command(version)]
struct Cli {
    /// Increase verbosity (-v for debug, -vv for per-turn trace events)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Thread a token through a chain of relay stages
    Relay {
        /// Number of stages in the chain
        #[arg(short, long)]
        length: Option<usize>,

        /// Token injected at the head of the chain
        #[arg(short, long, allow_negative_numbers = true)]
        seed: Option<i64>,
    },

    /// Run a timed ping/pong exchange between two peers
    Exchange {
        /// Token handed to the first peer
        #[arg(short, long, allow_negative_numbers = true)]
        seed: Option<i64>,

        /// Real-time budget of the exchange, in milliseconds
        #[arg(short, long)]
        duration_ms: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::BatonConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Relay { length, seed } => {
            commands::relay::run(config.relay.with_overrides(length, seed))
        }
        Commands::Exchange { seed, duration_ms } => {
            commands::exchange::run(config.exchange.with_overrides(seed, duration_ms))
        }
    }
}
