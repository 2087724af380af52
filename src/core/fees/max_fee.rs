//! Fee-maximizing ordering policy
//!
//! Picking the conflict-free subset of a batch with the largest total fee is a
//! weighted independent-set problem and is deliberately not attempted. Instead
//! the batch is sorted by descending score and handed to the ordinary
//! first-come-wins settlement, which drops whatever conflicts with an earlier,
//! higher-fee transaction. This is a greedy approximation with known bad
//! cases: one fee-10 transaction spending outputs X and Y beats two fee-6
//! transactions spending X and Y separately. Changing it into an exact solver
//! changes observable outcomes and needs its own correctness argument.

use crate::core::handler::{EpochHandler, EpochReport, TxHandler};
use crate::core::monetary::wide_sum;
use crate::core::validation::is_valid_tx;
use crate::core::Transaction;
use crate::error::Result;
use crate::storage::UTXOPool;
use crate::utils::SignatureVerifier;

/// Ordering score of `tx` against `pool`.
///
/// Inputs count only when the transaction is valid as a whole; outputs are
/// always subtracted. A valid transaction therefore scores exactly its fee and
/// an invalid one scores minus its declared output total, which usually sorts
/// it to the back. An invalid transaction with no (or zero-valued) outputs
/// scores 0 and ties with zero-fee valid transactions.
pub fn score(tx: &Transaction, pool: &UTXOPool, verifier: &dyn SignatureVerifier) -> i128 {
    // validity is evaluated once per transaction, not once per input
    let valid = is_valid_tx(tx, pool, verifier);
    let inputs = if valid {
        wide_sum(
            tx.get_vin()
                .iter()
                .filter_map(|input| pool.get(&input.utxo()))
                .map(|out| out.get_value()),
        )
    } else {
        0
    };
    inputs - wide_sum(tx.get_vout().iter().map(|out| out.get_value()))
}

/// `possible_txs` stably sorted by descending `score`; ties keep their
/// relative order.
pub fn order_by_fee(
    possible_txs: &[Transaction],
    pool: &UTXOPool,
    verifier: &dyn SignatureVerifier,
) -> Vec<Transaction> {
    let mut scored: Vec<(i128, &Transaction)> = possible_txs
        .iter()
        .map(|tx| (score(tx, pool, verifier), tx))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, tx)| tx.clone()).collect()
}

/// Settlement that processes the highest apparent fee first
pub struct MaxFeeTxHandler {
    inner: TxHandler,
}

impl MaxFeeTxHandler {
    pub fn new(utxo_pool: &UTXOPool) -> Result<MaxFeeTxHandler> {
        Ok(Self::from_handler(TxHandler::new(utxo_pool)?))
    }

    pub fn from_handler(inner: TxHandler) -> MaxFeeTxHandler {
        MaxFeeTxHandler { inner }
    }

    /// Score against the pool as it stands before the epoch
    pub fn score(&self, tx: &Transaction) -> i128 {
        score(tx, self.inner.get_utxo_pool(), self.inner.verifier())
    }

    pub fn order(&self, possible_txs: &[Transaction]) -> Vec<Transaction> {
        order_by_fee(
            possible_txs,
            self.inner.get_utxo_pool(),
            self.inner.verifier(),
        )
    }
}

impl EpochHandler for MaxFeeTxHandler {
    fn handle_epoch(&mut self, possible_txs: &[Transaction]) -> Result<EpochReport> {
        let ordered = self.order(possible_txs);
        log::debug!("Reordered {} transactions by fee", ordered.len());
        self.inner.handle_epoch(&ordered)
    }

    fn pool(&self) -> &UTXOPool {
        self.inner.pool()
    }
}
