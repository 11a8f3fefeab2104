//! fxalert CLI - Telegram price alerts for forex and crypto quotes.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxalert_fetch::url::BASE_URL;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::run::RunOptions;

#[derive(Parser)]
#[command(name = "fxalert")]
#[command(about = "Telegram price alerts for forex and crypto quotes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Price provider base URL
    #[arg(long, env = "FXALERT_PROVIDER_URL", default_value = BASE_URL, global = true)]
    provider_url: String,

    /// Provider request timeout in seconds
    #[arg(long, default_value = "5", global = true)]
    fetch_timeout_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot until interrupted
    Run {
        /// Alert store file. Defaults to the platform data directory.
        #[arg(long, env = "FXALERT_DB")]
        db: Option<PathBuf>,

        /// Telegram bot token
        #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
        token: String,

        /// Concurrent fetch workers per quote update
        #[arg(long, default_value = "2")]
        workers: usize,

        /// Seconds between level alert passes
        #[arg(long, default_value = "65")]
        level_interval_secs: u64,

        /// Seconds between momentum passes
        #[arg(long, default_value = "300")]
        momentum_interval_secs: u64,

        /// Seconds between pattern scans
        #[arg(long, default_value = "10")]
        pattern_interval_secs: u64,

        /// Telegram long-poll duration in seconds
        #[arg(long, default_value = "60")]
        long_poll_secs: u64,
    },

    /// Fetch and print today's bar for a symbol
    Quote {
        /// Symbol (e.g., EURUSD, btcusd)
        symbol: String,
    },

    /// List the symbols the bot can quote
    Symbols {
        /// Substring filter (e.g., JPY)
        filter: Option<String>,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let fetch_timeout = Duration::from_secs(cli.fetch_timeout_secs);
    match command {
        Commands::Run {
            db,
            token,
            workers,
            level_interval_secs,
            momentum_interval_secs,
            pattern_interval_secs,
            long_poll_secs,
        } => {
            commands::run::run(RunOptions {
                db,
                token,
                provider_url: cli.provider_url,
                fetch_timeout,
                workers,
                level_interval: Duration::from_secs(level_interval_secs),
                momentum_interval: Duration::from_secs(momentum_interval_secs),
                pattern_interval: Duration::from_secs(pattern_interval_secs),
                long_poll: Duration::from_secs(long_poll_secs),
            })
            .await
        }
        Commands::Quote { symbol } => {
            commands::quote::show_quote(&symbol, &cli.provider_url, fetch_timeout).await
        }
        Commands::Symbols { filter } => commands::symbols::list_symbols(filter.as_deref()),
    }
}
