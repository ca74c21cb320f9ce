//! Ledgertap launcher.
//!
//! Subcommands:
//! - `init`   - write a starter config file
//! - `run`    - process one new-content delta for each configured source
//! - `watch`  - long-lived poller running the same pipeline per source
//! - `cursor` - inspect or reset stored read positions
//! - `review` - work the human confirmation queue

use clap::{Parser, Subcommand};
use ledgertap_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

use cli::cursor::CursorCommand;
use cli::review::ReviewCommand;

#[derive(Parser, Debug)]
#[command(name = "ledgertap", about = "Messenger transcript to CRM event pipeline")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.ledgertap/config.toml)
    #[arg(long, global = true, env = "LEDGERTAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a starter config file
    Init,
    /// Process one new-content delta for each configured source
    Run {
        /// Only process the source with this key
        #[arg(long)]
        source: Option<String>,
    },
    /// Poll all configured sources until interrupted
    Watch,
    /// Inspect or reset stored read positions
    Cursor {
        #[command(subcommand)]
        command: CursorCommand,
    },
    /// Work the human confirmation queue
    Review {
        #[command(subcommand)]
        command: ReviewCommand,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "ledgertap",
        verbose: args.verbose,
    }) {
        eprintln!("Failed to initialize logging: {err:#}");
        return ExitCode::FAILURE;
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(cli::config::default_config_path);

    let result = match args.command {
        Commands::Init => cli::config::write_starter_config(&config_path),
        Commands::Run { source } => cli::run::run(&config_path, source.as_deref()).await,
        Commands::Watch => cli::watch::run(&config_path).await,
        Commands::Cursor { command } => cli::cursor::run(&config_path, command).await,
        Commands::Review { command } => cli::review::run(&config_path, command).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
