// salesgrid CLI - sales profitability summaries from CSV

mod exit_codes;
mod report;

use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;
use report::{InputArgs, PivotArgs, RunArgs};

#[derive(Parser)]
#[command(name = "salesgrid")]
#[command(about = "Profitability by region and product category, from sales + product CSVs")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the summary CSV, plus optional pivot and JSON report
    #[command(after_help = "\
Examples:
  salesgrid run
  salesgrid run --config report.toml
  salesgrid run --sales sales.csv --products products.csv -o summary.csv
  salesgrid run --config report.toml --output - | column -t -s,
  salesgrid run --config report.toml --json-output out/report.json --pivot-output out/pivot.csv")]
    Run(RunArgs),

    /// Print the region x category revenue pivot
    #[command(after_help = "\
Examples:
  salesgrid pivot --config report.toml
  salesgrid pivot --sales sales.csv --products products.csv -o pivot.csv")]
    Pivot(PivotArgs),

    /// Check config and inputs without writing anything
    #[command(after_help = "\
Examples:
  salesgrid validate --config report.toml
  salesgrid validate --sales sales.csv --products products.csv")]
    Validate(InputArgs),
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  salesgrid-report ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => report::cmd_run(args),
        Commands::Pivot(args) => report::cmd_pivot(args),
        Commands::Validate(args) => report::cmd_validate(args),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}
