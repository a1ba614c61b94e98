use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loancalc_core::amortization::{self, LoanInput};

use crate::input;

/// Arguments for the payment summary
#[derive(Args)]
pub struct PaymentArgs {
    /// Loan amount (principal)
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Nominal annual interest rate in percent (e.g. 5 for 5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub term: Option<u32>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the full amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Loan amount (principal)
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Nominal annual interest rate in percent (e.g. 5 for 5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub term: Option<u32>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = resolve_input(args.amount, args.rate, args.term, args.input.as_deref())?;
    let result = amortization::compute_amortization(&loan)?;

    // Summary only: the schedule is the `schedule` command's job.
    let mut value = serde_json::to_value(result)?;
    if let Some(inner) = value.get_mut("result").and_then(Value::as_object_mut) {
        inner.remove("schedule");
    }
    Ok(value)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = resolve_input(args.amount, args.rate, args.term, args.input.as_deref())?;
    let result = amortization::compute_amortization(&loan)?;
    Ok(serde_json::to_value(result)?)
}

fn resolve_input(
    amount: Option<Decimal>,
    rate: Option<Decimal>,
    term: Option<u32>,
    path: Option<&str>,
) -> Result<LoanInput, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return input::read_json(path);
    }
    if let Some(data) = input::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    Ok(LoanInput {
        principal: amount.ok_or("--amount is required (or provide --input)")?,
        annual_rate_pct: rate.ok_or("--rate is required (or provide --input)")?,
        term_years: term.ok_or("--term is required (or provide --input)")?,
    })
}
