//! Fee handling and settlement policies
//!
//! - Arrival order: settle the batch exactly as presented
//! - Max fee: reorder by descending fee first (see `max_fee`)

pub mod max_fee;

pub use max_fee::{order_by_fee, score, MaxFeeTxHandler};

use crate::core::handler::{EpochHandler, TxHandler};
use crate::error::{Result, SettlementError};
use crate::storage::UTXOPool;
use crate::utils::SignatureVerifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How a batch is ordered before settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettlementPolicy {
    #[default]
    Arrival,
    MaxFee,
}

impl FromStr for SettlementPolicy {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "arrival" => Ok(SettlementPolicy::Arrival),
            "max-fee" | "maxfee" => Ok(SettlementPolicy::MaxFee),
            _ => Err(SettlementError::Config(format!(
                "Invalid policy: {s}. Valid options: arrival, max-fee"
            ))),
        }
    }
}

impl fmt::Display for SettlementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementPolicy::Arrival => write!(f, "arrival"),
            SettlementPolicy::MaxFee => write!(f, "max-fee"),
        }
    }
}

/// Build the handler for `policy` over a private copy of `utxo_pool`
pub fn build_handler(
    policy: SettlementPolicy,
    utxo_pool: &UTXOPool,
    verifier: Arc<dyn SignatureVerifier>,
    parallel_verification: bool,
) -> Result<Box<dyn EpochHandler>> {
    let handler = TxHandler::with_verifier(utxo_pool, verifier)?
        .with_parallel_verification(parallel_verification);
    Ok(match policy {
        SettlementPolicy::Arrival => Box::new(handler),
        SettlementPolicy::MaxFee => Box::new(MaxFeeTxHandler::from_handler(handler)),
    })
}
