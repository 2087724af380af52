//! Transaction validity against a pool snapshot
//!
//! A transaction is valid when, checking its inputs left to right:
//! 1. every claimed output is in the pool,
//! 2. every input carries a signature from the claimed output's owner,
//! 3. no output is claimed twice by the same transaction,
//!
//! and then
//! 4. no output value is negative, and
//! 5. the inputs are worth at least as much as the outputs.
//!
//! The first failing rule decides the `Rejection`. Nothing here mutates the
//! pool. Rejection is an ordinary answer; `Err` is reserved for a pool or
//! collaborator that is itself broken.

use crate::core::monetary::{checked_sum, Amount};
use crate::core::{TXOutput, Transaction, UTXO};
use crate::error::{Result, SettlementError};
use crate::storage::UTXOPool;
use crate::utils::SignatureVerifier;
use std::collections::HashSet;
use std::fmt;

/// Why a transaction was not accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The claimed output is not (or no longer) in the pool
    MissingInput { index: usize, utxo: UTXO },
    /// The signature does not verify against the claimed output's owner
    BadSignature { index: usize },
    /// The same output is claimed by two inputs of this transaction
    DuplicateInput { index: usize, utxo: UTXO },
    NegativeOutput { index: usize, value: Amount },
    /// The input or output total does not fit in an `Amount`
    ValueOverflow,
    InsufficientInputValue { inputs: Amount, outputs: Amount },
    /// Identical transaction already accepted earlier in the epoch
    AlreadyAccepted,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingInput { index, utxo } => {
                write!(f, "input {index} claims unavailable output {utxo}")
            }
            Rejection::BadSignature { index } => write!(f, "input {index} has an invalid signature"),
            Rejection::DuplicateInput { index, utxo } => {
                write!(f, "input {index} claims {utxo} a second time")
            }
            Rejection::NegativeOutput { index, value } => {
                write!(f, "output {index} has negative value {value}")
            }
            Rejection::ValueOverflow => write!(f, "value total overflows the amount range"),
            Rejection::InsufficientInputValue { inputs, outputs } => {
                write!(f, "inputs worth {inputs} cannot cover outputs worth {outputs}")
            }
            Rejection::AlreadyAccepted => write!(f, "already accepted this epoch"),
        }
    }
}

/// Outcome of checking one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid { fee: Amount },
    Invalid(Rejection),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid { .. })
    }
}

/// Check `tx` against `pool`, verifying every signature with `verifier`.
pub fn check_transaction(
    tx: &Transaction,
    pool: &UTXOPool,
    verifier: &dyn SignatureVerifier,
) -> Result<Verdict> {
    check_with(tx, pool, |idx, out| verify_input(tx, idx, out, verifier))
}

/// Boolean form of `check_transaction`. An integrity fault is logged and
/// answered with `false`; callers that must abort on it use the full check.
pub fn is_valid_tx(tx: &Transaction, pool: &UTXOPool, verifier: &dyn SignatureVerifier) -> bool {
    match check_transaction(tx, pool, verifier) {
        Ok(verdict) => verdict.is_valid(),
        Err(e) => {
            log::error!("Integrity fault while validating {}: {e}", tx.get_id_hex());
            false
        }
    }
}

pub(crate) fn verify_input(
    tx: &Transaction,
    index: usize,
    claimed: &TXOutput,
    verifier: &dyn SignatureVerifier,
) -> Result<bool> {
    let message = tx.signable_bytes(index)?;
    Ok(verifier.verify(
        claimed.get_owner(),
        &message,
        tx.get_vin()[index].get_signature(),
    ))
}

/// The rule evaluation itself, with the signature question delegated to
/// `signature_ok(input_index, claimed_output)`.
pub(crate) fn check_with<F>(tx: &Transaction, pool: &UTXOPool, mut signature_ok: F) -> Result<Verdict>
where
    F: FnMut(usize, &TXOutput) -> Result<bool>,
{
    let mut claimed: HashSet<UTXO> = HashSet::new();
    let mut input_values: Vec<Amount> = Vec::with_capacity(tx.get_vin().len());

    for (idx, input) in tx.get_vin().iter().enumerate() {
        let utxo = input.utxo();
        let out = match pool.get(&utxo) {
            Some(out) => out,
            None => {
                return Ok(Verdict::Invalid(Rejection::MissingInput { index: idx, utxo }));
            }
        };
        if out.get_value() < 0 {
            return Err(SettlementError::LedgerIntegrity(format!(
                "pool output {utxo} holds negative value {}",
                out.get_value()
            )));
        }

        if !signature_ok(idx, out)? {
            return Ok(Verdict::Invalid(Rejection::BadSignature { index: idx }));
        }

        if !claimed.insert(utxo.clone()) {
            return Ok(Verdict::Invalid(Rejection::DuplicateInput { index: idx, utxo }));
        }
        input_values.push(out.get_value());
    }

    for (idx, out) in tx.get_vout().iter().enumerate() {
        if out.get_value() < 0 {
            return Ok(Verdict::Invalid(Rejection::NegativeOutput {
                index: idx,
                value: out.get_value(),
            }));
        }
    }

    let (inputs, outputs) = match (
        checked_sum(input_values),
        checked_sum(tx.get_vout().iter().map(|out| out.get_value())),
    ) {
        (Some(inputs), Some(outputs)) => (inputs, outputs),
        _ => return Ok(Verdict::Invalid(Rejection::ValueOverflow)),
    };
    if inputs < outputs {
        return Ok(Verdict::Invalid(Rejection::InsufficientInputValue {
            inputs,
            outputs,
        }));
    }

    // both totals are non-negative here
    Ok(Verdict::Valid {
        fee: inputs - outputs,
    })
}
