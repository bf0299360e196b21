mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::recovery::RecoveryArgs;
use commands::valuation::{AggregatesArgs, EgiArgs, EvaluateArgs, ValueArgs};

/// Underwriting line-item valuation
#[derive(Parser)]
#[command(
    name = "uwv",
    version,
    about = "Underwriting line-item valuation",
    long_about = "Derives monthly and annual figures for underwriting expense and income \
                  tables from a JSON snapshot: one-time costs, operating expenses, retail \
                  expenses and recoveries, amenity and retail income, and EGI. Reads the \
                  snapshot from --input or stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level for stderr diagnostics (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Value every table in the snapshot
    Value(ValueArgs),
    /// Resolve cross-category aggregates (EGI, tax and insurance totals, retail SF)
    Aggregates(AggregatesArgs),
    /// Evaluate the rows and footer of one table
    Evaluate(EvaluateArgs),
    /// Allocate retail expense recoveries across tenants
    Recovery(RecoveryArgs),
    /// Effective gross income with its intermediate figures
    Egi(EgiArgs),
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

fn main() {
    let cli = Cli::parse();

    let _logger = match logging::init_logging(cli.log_level.as_deref()) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Value(args) => commands::valuation::run_value(args),
        Commands::Aggregates(args) => commands::valuation::run_aggregates(args),
        Commands::Evaluate(args) => commands::valuation::run_evaluate(args),
        Commands::Recovery(args) => commands::recovery::run_recovery(args),
        Commands::Egi(args) => commands::valuation::run_egi(args),
        Commands::Version => {
            println!("uwv {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("event=command_failed module=cli status=error reason={e}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
