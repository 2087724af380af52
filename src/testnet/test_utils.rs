//! Test utilities for settlement testing

use crate::core::monetary::Amount;
use crate::core::{TXOutput, Transaction, UTXO};
use crate::storage::UTXOPool;
use crate::utils::sha256_digest;
use crate::wallet::Wallet;

/// Identifier of the `index`-th genesis output
pub fn genesis_utxo(index: usize) -> UTXO {
    UTXO::new(&sha256_digest(b"genesis"), index)
}

/// A pool of genesis outputs, one per wallet.
///
/// `TestLedger::new(&[10, 5])` creates two wallets; wallet 0 owns
/// `genesis_utxo(0)` worth 10 and wallet 1 owns `genesis_utxo(1)` worth 5.
pub struct TestLedger {
    pub wallets: Vec<Wallet>,
    pub pool: UTXOPool,
}

impl TestLedger {
    pub fn new(values: &[Amount]) -> TestLedger {
        let wallets: Vec<Wallet> = values
            .iter()
            .map(|_| Wallet::new().expect("wallet generation should work"))
            .collect();
        let pool = values
            .iter()
            .zip(&wallets)
            .enumerate()
            .map(|(idx, (value, wallet))| (genesis_utxo(idx), TXOutput::to_wallet(*value, wallet)))
            .collect();
        TestLedger { wallets, pool }
    }

    /// Spend the given genesis outputs, each signed by its owner
    pub fn spend(&self, genesis_indices: &[usize], outputs: Vec<TXOutput>) -> Transaction {
        let inputs: Vec<(UTXO, &Wallet)> = genesis_indices
            .iter()
            .map(|&idx| (genesis_utxo(idx), &self.wallets[idx]))
            .collect();
        Transaction::new_signed(&inputs, outputs).expect("signing should work")
    }
}

/// Spend output `vout` of `parent`, signed by `owner`
pub fn spend_output(
    parent: &Transaction,
    vout: usize,
    owner: &Wallet,
    outputs: Vec<TXOutput>,
) -> Transaction {
    Transaction::new_signed(&[(UTXO::new(parent.get_id(), vout), owner)], outputs)
        .expect("signing should work")
}
