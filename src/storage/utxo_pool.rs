use crate::core::monetary::wide_sum;
use crate::core::{TXOutput, UTXO};
use std::collections::HashMap;

/// The set of currently unspent outputs.
///
/// `Clone` is a deep value copy: a handler always works on its own clone, so
/// mutating it can never leak back into the pool a caller handed over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UTXOPool {
    inner: HashMap<UTXO, TXOutput>,
}

impl UTXOPool {
    pub fn new() -> UTXOPool {
        UTXOPool {
            inner: HashMap::new(),
        }
    }

    pub fn contains(&self, utxo: &UTXO) -> bool {
        self.inner.contains_key(utxo)
    }

    pub fn get(&self, utxo: &UTXO) -> Option<&TXOutput> {
        self.inner.get(utxo)
    }

    /// Insert or overwrite. Callers are responsible for never overwriting a
    /// live output by accident; returns what was there before.
    pub fn insert(&mut self, utxo: UTXO, output: TXOutput) -> Option<TXOutput> {
        self.inner.insert(utxo, output)
    }

    pub fn remove(&mut self, utxo: &UTXO) -> Option<TXOutput> {
        self.inner.remove(utxo)
    }

    /// Every identifier in the pool, sorted so listings are deterministic
    pub fn all(&self) -> Vec<UTXO> {
        let mut utxos: Vec<UTXO> = self.inner.keys().cloned().collect();
        utxos.sort();
        utxos
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UTXO, &TXOutput)> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Total value held by the pool
    pub fn total_value(&self) -> i128 {
        wide_sum(self.inner.values().map(|out| out.get_value()))
    }

    /// Outputs whose value is negative. A consistent ledger has none.
    pub fn negative_outputs(&self) -> Vec<UTXO> {
        let mut found: Vec<UTXO> = self
            .inner
            .iter()
            .filter(|(_, out)| out.get_value() < 0)
            .map(|(utxo, _)| utxo.clone())
            .collect();
        found.sort();
        found
    }
}

impl From<HashMap<UTXO, TXOutput>> for UTXOPool {
    fn from(inner: HashMap<UTXO, TXOutput>) -> Self {
        UTXOPool { inner }
    }
}

impl FromIterator<(UTXO, TXOutput)> for UTXOPool {
    fn from_iter<I: IntoIterator<Item = (UTXO, TXOutput)>>(iter: I) -> Self {
        UTXOPool {
            inner: iter.into_iter().collect(),
        }
    }
}
