//! Core settlement functionality
//!
//! The transaction model, the validity rules, the epoch settlement engine and
//! the fee-ordering policy layered on top of it.

pub mod fees;
pub mod handler;
pub mod monetary;
pub mod transaction;
pub mod validation;

pub use fees::{build_handler, MaxFeeTxHandler, SettlementPolicy};
pub use handler::{transaction_fee, EpochHandler, EpochReport, RejectedTx, TxHandler};
pub use monetary::{Amount, UNITS_PER_COIN};
pub use transaction::{TXInput, TXOutput, Transaction, UTXO};
pub use validation::{check_transaction, is_valid_tx, Rejection, Verdict};
