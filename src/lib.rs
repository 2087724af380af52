//! # Ledger Settlement - single-epoch UTXO settlement
//!
//! Given a snapshot of unspent outputs and a batch of proposed transactions,
//! this crate decides which transactions are valid, resolves conflicts among
//! transactions competing for the same output, and applies the accepted subset
//! to produce the next snapshot.
//!
//! ## What Is Here
//! - **Validation**: five rules per transaction (inputs exist, signatures
//!   verify, no output claimed twice, no negative outputs, no value created)
//! - **Settlement**: first-come-wins in batch order, applied to a private copy
//!   of the caller's pool
//! - **Fee policy**: a greedy reordering by fee before settlement
//! - **Snapshots**: sled-backed persistence of the pool between epochs
//!
//! ## How The Code Is Organized
//! - `core/`: transaction model, validation, settlement handlers, fee policy
//! - `storage/`: the in-memory UTXO pool and the snapshot store
//! - `utils/`: hashing, signing, signature verification, serialization
//! - `wallet/`: key pairs that own outputs and sign inputs
//! - `config/`: settings from TOML and the environment
//! - `cli/`: command-line interface
//!
//! ## Where To Start
//! 1. `core/handler.rs` for the settlement loop and its ordering contract
//! 2. `core/validation.rs` for the validity rules
//! 3. `core/fees/max_fee.rs` for the fee-ordering heuristic and its limits

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt, PolicyArg};
pub use config::{Config, Settings, GLOBAL_CONFIG};
pub use core::{
    build_handler, check_transaction, is_valid_tx, transaction_fee, Amount, EpochHandler,
    EpochReport, MaxFeeTxHandler, RejectedTx, Rejection, SettlementPolicy, TXInput, TXOutput,
    Transaction, TxHandler, Verdict, UNITS_PER_COIN, UTXO,
};
pub use error::{Result, SettlementError};
pub use storage::{SnapshotStore, UTXOPool};
pub use utils::{EcdsaP256Verifier, SignatureVerifier};
pub use wallet::{owner_address, Wallet};
