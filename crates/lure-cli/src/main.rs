use anyhow::Result;
use clap::{Parser, Subcommand};
use lure_execution::{LogFormat, SessionEventLayer, init_tracing};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "lure")]
#[command(about = "LURE - scam engagement orchestration core", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format: pretty or json
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted conversation end-to-end against a fresh session
    Simulate(commands::simulate::SimulateArgs),
    /// Print the effective configuration as TOML
    Config {
        /// Ignore the config file and environment, print built-in defaults
        #[arg(long)]
        defaults: bool,
    },
    /// List the persona catalogue
    Personas {
        /// Print the full generator profile of each persona
        #[arg(long)]
        profile: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (layer, events) = match &cli.command {
        Commands::Simulate(args) if args.events => {
            let (layer, receiver) = SessionEventLayer::channel();
            (Some(layer), Some(receiver))
        }
        _ => (None, None),
    };
    init_tracing(cli.log_format, layer)?;

    match cli.command {
        Commands::Simulate(args) => commands::simulate::run(cli.config, args, events).await?,
        Commands::Config { defaults } => commands::config::show(cli.config, defaults).await?,
        Commands::Personas { profile } => commands::personas::list(profile),
    }

    Ok(())
}
