use crate::core::SettlementPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// Settlement policy as accepted on the command line
#[derive(Debug, Clone, Copy)]
pub enum PolicyArg {
    Arrival,
    MaxFee,
}

impl FromStr for PolicyArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<SettlementPolicy>() {
            Ok(SettlementPolicy::Arrival) => Ok(PolicyArg::Arrival),
            Ok(SettlementPolicy::MaxFee) => Ok(PolicyArg::MaxFee),
            Err(e) => Err(e.to_string()),
        }
    }
}

impl From<PolicyArg> for SettlementPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Arrival => SettlementPolicy::Arrival,
            PolicyArg::MaxFee => SettlementPolicy::MaxFee,
        }
    }
}

impl std::fmt::Display for PolicyArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        SettlementPolicy::from(*self).fmt(f)
    }
}

#[derive(Debug, Parser)]
#[command(name = "ledger-settlement")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        name = "demo",
        about = "Settle two transactions racing for the same output"
    )]
    Demo {
        #[arg(long, help = "Settlement policy (arrival, max-fee)")]
        policy: Option<PolicyArg>,
        #[arg(long, help = "Seed this snapshot store with the starting pool")]
        db: Option<PathBuf>,
        #[arg(long = "batch-out", help = "Write the demo batch as JSON to this file")]
        batch_out: Option<PathBuf>,
    },
    #[command(name = "settle", about = "Settle a JSON batch against the stored pool")]
    Settle {
        #[arg(long, help = "JSON file holding an array of transactions")]
        batch: PathBuf,
        #[arg(long, help = "Snapshot store (defaults to the configured path)")]
        db: Option<PathBuf>,
        #[arg(long, help = "Settlement policy (arrival, max-fee)")]
        policy: Option<PolicyArg>,
        #[arg(long, help = "Report the outcome without saving the new pool")]
        dry_run: bool,
    },
    #[command(name = "inspect", about = "Print the stored pool")]
    Inspect {
        #[arg(long, help = "Snapshot store (defaults to the configured path)")]
        db: Option<PathBuf>,
    },
}
