use clap::Args;
use serde_json::Value;

use uw_valuation_core::{allocate_recoveries, RecoveryBasis};

use super::envelope;
use crate::input;

/// Arguments for the retail recovery table
#[derive(Args)]
pub struct RecoveryArgs {
    /// Path to JSON snapshot (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Expense pooling: pooled or by-rent-type (defaults to the snapshot's config)
    #[arg(long)]
    pub basis: Option<RecoveryBasis>,
}

pub fn run_recovery(args: RecoveryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut snapshot = input::read_snapshot(args.input.as_deref())?;
    if let Some(basis) = args.basis {
        snapshot.config.recovery_basis = basis;
    }
    envelope(allocate_recoveries(&snapshot))
}
