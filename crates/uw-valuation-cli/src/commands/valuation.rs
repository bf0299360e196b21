use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use uw_valuation_core::{
    calculate_egi, evaluate_category, resolve_aggregates, value_model, Category,
};

use super::envelope;
use crate::input;

/// Arguments for a full valuation
#[derive(Args)]
pub struct ValueArgs {
    /// Path to JSON snapshot (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for aggregate resolution
#[derive(Args)]
pub struct AggregatesArgs {
    /// Path to JSON snapshot (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for evaluating one table
#[derive(Args)]
pub struct EvaluateArgs {
    /// Table to evaluate, e.g. "Closing Costs" or operating-expense
    #[arg(long)]
    pub category: Category,

    /// Path to JSON snapshot (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for EGI. Flags override the snapshot's model parameters.
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct EgiArgs {
    /// Path to JSON snapshot (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Vacancy, percent (e.g. 5 for 5%)
    #[arg(long)]
    pub vacancy: Option<Decimal>,

    /// Bad debt, percent
    #[arg(long)]
    pub bad_debt: Option<Decimal>,

    /// Annual turnover, percent
    #[arg(long)]
    pub annual_turnover: Option<Decimal>,

    /// Free months of rent per new lease
    #[arg(long)]
    pub free_months_rent: Option<Decimal>,

    /// Broker fee, in months of rent
    #[arg(long)]
    pub broker_fee: Option<Decimal>,
}

pub fn run_value(args: ValueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = input::read_snapshot(args.input.as_deref())?;
    envelope(value_model(&snapshot))
}

pub fn run_aggregates(args: AggregatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = input::read_snapshot(args.input.as_deref())?;
    envelope(resolve_aggregates(&snapshot))
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = input::read_snapshot(args.input.as_deref())?;
    envelope(evaluate_category(&snapshot, args.category))
}

pub fn run_egi(args: EgiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut snapshot = input::read_snapshot(args.input.as_deref())?;
    let cfg = snapshot.config.clone();
    let overrides = [
        (&cfg.vacancy_key, args.vacancy),
        (&cfg.bad_debt_key, args.bad_debt),
        (&cfg.annual_turnover_key, args.annual_turnover),
        (&cfg.free_months_rent_key, args.free_months_rent),
        (&cfg.broker_fee_key, args.broker_fee),
    ];
    for (key, value) in overrides {
        if let Some(v) = value {
            snapshot.model_parameters.set(key.as_str(), v);
        }
    }
    envelope(calculate_egi(&snapshot))
}
