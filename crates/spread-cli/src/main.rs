mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::quote::QuoteArgs;
use commands::search::SearchArgs;

/// Rank vertical option spreads by expected result
#[derive(Parser)]
#[command(
    name = "spreads",
    version,
    about = "Rank vertical option spreads by expected result",
    long_about = "Prices every bull call or bull put spread on a strike grid around spot \
                  with Black-Scholes, scores each one by its Expected Result under a \
                  lognormal terminal price, and prints the survivors best first. \
                  Set RUST_LOG=debug for progress on stderr."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the strike grid and rank spreads by Expected Result
    Search(SearchArgs),
    /// Black-Scholes call and put quote with Greeks
    Quote(QuoteArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Search(args) => commands::search::run_search(args),
        Commands::Quote(args) => commands::quote::run_quote(args),
        Commands::Version => {
            println!("spreads {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
