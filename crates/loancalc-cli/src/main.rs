mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::amortize::{PaymentArgs, ScheduleArgs};
use commands::changelog::ChangelogArgs;
use commands::widget::WidgetArgs;

/// Loan amortization calculations with decimal precision
#[derive(Parser)]
#[command(
    name = "loancalc",
    version,
    about = "Loan amortization calculator",
    long_about = "Computes fixed monthly payments and full amortization schedules \
                  with decimal precision. Mirrors the embeddable calculator widget: \
                  the same inputs, the same engine, on the command line."
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
    /// Payment summary: monthly payment, total payment, total interest
    Payment(PaymentArgs),
    /// Full month-by-month amortization schedule
    Schedule(ScheduleArgs),
    /// Run the calculator from widget attribute pairs (loan-amount=..., theme=...)
    Widget(WidgetArgs),
    /// Update CHANGELOG.md from conventional commits since the last tag
    Changelog(ChangelogArgs),
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

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Payment(args) => commands::amortize::run_payment(args),
        Commands::Schedule(args) => commands::amortize::run_schedule(args),
        Commands::Widget(args) => commands::widget::run_widget(args),
        Commands::Changelog(args) => {
            // Release tooling writes its own progress; no format dispatch.
            if let Err(e) = commands::changelog::run_changelog(args) {
                eprintln!("{}: {}", "error".red().bold(), e);
                process::exit(1);
            }
            return;
        }
        Commands::Version => {
            println!("loancalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
