// The epoch settlement engine.
// I take a batch of proposed transactions, walk it in the order given, and
// apply every transaction that is valid against the pool as it stands at that
// moment. Applying a transaction removes the outputs it spends, so a later
// transaction in the same batch that spends any of them fails the "input is in
// the pool" rule. That is the whole conflict-resolution mechanism: first in
// batch order wins, and the caller decides the order.

use crate::core::monetary::{wide_sum, Amount};
use crate::core::validation::{self, Rejection, Verdict};
use crate::core::{TXOutput, Transaction, UTXO};
use crate::error::{Result, SettlementError};
use crate::storage::UTXOPool;
use crate::utils::{EcdsaP256Verifier, SignatureVerifier};
use log::{debug, error, info};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

/// Below this batch size signatures are verified inline even when parallel
/// verification is enabled.
pub const PARALLEL_THRESHOLD: usize = 4;

/// A transaction that was not accepted, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedTx {
    pub id: Vec<u8>,
    pub reason: Rejection,
}

/// Result of settling one epoch
#[derive(Debug, Clone, Default)]
pub struct EpochReport {
    /// Accepted transactions, in the order they were applied
    pub accepted: Vec<Transaction>,
    pub rejected: Vec<RejectedTx>,
    pub total_fees: i128,
}

impl EpochReport {
    pub fn submitted(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }
}

/// Something that settles epochs against a pool it owns.
pub trait EpochHandler {
    fn handle_epoch(&mut self, possible_txs: &[Transaction]) -> Result<EpochReport>;

    /// The mutually valid subset of `possible_txs` that was applied
    fn handle_txs(&mut self, possible_txs: &[Transaction]) -> Result<Vec<Transaction>> {
        Ok(self.handle_epoch(possible_txs)?.accepted)
    }

    /// The pool as of the end of the last epoch
    fn pool(&self) -> &UTXOPool;
}

pub struct TxHandler {
    utxo_pool: UTXOPool,
    verifier: Arc<dyn SignatureVerifier>,
    parallel_verification: bool,
}

impl TxHandler {
    /// Start from a private copy of `utxo_pool`, verifying with ECDSA P-256.
    pub fn new(utxo_pool: &UTXOPool) -> Result<TxHandler> {
        Self::with_verifier(utxo_pool, Arc::new(EcdsaP256Verifier))
    }

    pub fn with_verifier(
        utxo_pool: &UTXOPool,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Result<TxHandler> {
        let negative = utxo_pool.negative_outputs();
        if let Some(first) = negative.first() {
            return Err(SettlementError::LedgerIntegrity(format!(
                "{} pool outputs hold negative values (first: {first})",
                negative.len()
            )));
        }

        Ok(TxHandler {
            utxo_pool: utxo_pool.clone(),
            verifier,
            parallel_verification: false,
        })
    }

    /// Verify signatures concurrently before the (always sequential) commit
    pub fn with_parallel_verification(mut self, enabled: bool) -> TxHandler {
        self.parallel_verification = enabled;
        self
    }

    pub fn is_valid_tx(&self, tx: &Transaction) -> bool {
        validation::is_valid_tx(tx, &self.utxo_pool, self.verifier.as_ref())
    }

    pub fn get_utxo_pool(&self) -> &UTXOPool {
        &self.utxo_pool
    }

    pub(crate) fn verifier(&self) -> &dyn SignatureVerifier {
        self.verifier.as_ref()
    }

    fn settle(
        &mut self,
        possible_txs: &[Transaction],
        signatures: Option<&[Vec<Option<CachedSignature>>]>,
        journal: &mut Journal,
    ) -> Result<EpochReport> {
        let mut report = EpochReport::default();
        let mut accepted_ids: HashSet<Vec<u8>> = HashSet::new();

        for (pos, tx) in possible_txs.iter().enumerate() {
            if accepted_ids.contains(tx.get_id()) {
                report.rejected.push(RejectedTx {
                    id: tx.get_id().to_vec(),
                    reason: Rejection::AlreadyAccepted,
                });
                continue;
            }

            let verifier = self.verifier.as_ref();
            let verdict = match signatures.and_then(|cache| cache.get(pos)) {
                Some(cached) => validation::check_with(tx, &self.utxo_pool, |idx, out| {
                    match cached.get(idx).and_then(Option::as_ref) {
                        // only reusable while the claimed output is unchanged
                        Some(hit) if hit.output == *out => Ok(hit.valid),
                        _ => validation::verify_input(tx, idx, out, verifier),
                    }
                })?,
                None => validation::check_transaction(tx, &self.utxo_pool, verifier)?,
            };

            match verdict {
                Verdict::Valid { fee } => {
                    apply(&mut self.utxo_pool, tx, journal);
                    accepted_ids.insert(tx.get_id().to_vec());
                    report.total_fees += i128::from(fee);
                    report.accepted.push(tx.clone());
                }
                Verdict::Invalid(reason) => {
                    debug!("Rejected transaction {}: {reason}", tx.get_id_hex());
                    report.rejected.push(RejectedTx {
                        id: tx.get_id().to_vec(),
                        reason,
                    });
                }
            }
        }
        Ok(report)
    }
}

impl EpochHandler for TxHandler {
    fn handle_epoch(&mut self, possible_txs: &[Transaction]) -> Result<EpochReport> {
        let signatures = if self.parallel_verification && possible_txs.len() >= PARALLEL_THRESHOLD
        {
            Some(verify_signatures_parallel(
                possible_txs,
                &self.utxo_pool,
                self.verifier.as_ref(),
            )?)
        } else {
            None
        };

        let mut journal = Journal::default();
        match self.settle(possible_txs, signatures.as_deref(), &mut journal) {
            Ok(report) => {
                info!(
                    "Epoch settled: {} submitted, {} accepted, {} rejected, fees {}",
                    report.submitted(),
                    report.accepted.len(),
                    report.rejected.len(),
                    report.total_fees
                );
                Ok(report)
            }
            Err(e) => {
                error!("Aborting epoch, restoring pool to its starting state: {e}");
                journal.rollback(&mut self.utxo_pool);
                Err(e)
            }
        }
    }

    fn pool(&self) -> &UTXOPool {
        &self.utxo_pool
    }
}

// Spend the inputs, then create the outputs under (tx id, index).
fn apply(pool: &mut UTXOPool, tx: &Transaction, journal: &mut Journal) {
    for input in tx.get_vin() {
        let utxo = input.utxo();
        if let Some(spent) = pool.remove(&utxo) {
            journal.entries.push(JournalEntry::Removed(utxo, spent));
        }
    }
    for (utxo, out) in tx.output_utxos() {
        let previous = pool.insert(utxo.clone(), out.clone());
        journal.entries.push(JournalEntry::Inserted(utxo, previous));
    }
}

#[derive(Debug, Clone)]
struct CachedSignature {
    output: TXOutput,
    valid: bool,
}

// Signature verdicts for every input whose claimed output exists at epoch
// start. Outputs created during the epoch are verified during commit.
fn verify_signatures_parallel(
    possible_txs: &[Transaction],
    pool: &UTXOPool,
    verifier: &dyn SignatureVerifier,
) -> Result<Vec<Vec<Option<CachedSignature>>>> {
    possible_txs
        .par_iter()
        .map(|tx| {
            tx.get_vin()
                .iter()
                .enumerate()
                .map(|(idx, input)| match pool.get(&input.utxo()) {
                    Some(out) => Ok(Some(CachedSignature {
                        output: out.clone(),
                        valid: validation::verify_input(tx, idx, out, verifier)?,
                    })),
                    None => Ok(None),
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

#[derive(Debug)]
enum JournalEntry {
    Removed(UTXO, TXOutput),
    Inserted(UTXO, Option<TXOutput>),
}

/// Undo log of one epoch's pool mutations
#[derive(Debug, Default)]
struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    fn rollback(self, pool: &mut UTXOPool) {
        for entry in self.entries.into_iter().rev() {
            match entry {
                JournalEntry::Removed(utxo, out) => {
                    pool.insert(utxo, out);
                }
                JournalEntry::Inserted(utxo, Some(previous)) => {
                    pool.insert(utxo, previous);
                }
                JournalEntry::Inserted(utxo, None) => {
                    pool.remove(&utxo);
                }
            }
        }
    }
}

/// Fee of a transaction whose inputs are all in `pool`
pub fn transaction_fee(tx: &Transaction, pool: &UTXOPool) -> Option<i128> {
    let mut inputs: Vec<Amount> = Vec::with_capacity(tx.get_vin().len());
    for input in tx.get_vin() {
        inputs.push(pool.get(&input.utxo())?.get_value());
    }
    Some(wide_sum(inputs) - wide_sum(tx.get_vout().iter().map(|out| out.get_value())))
}
