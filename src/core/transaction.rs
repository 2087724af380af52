// The transaction model: what the settlement engine consumes.
// A transaction spends previously created outputs (each input points at one and
// carries a signature from its owner) and creates new outputs. Its id is a hash
// over the whole content, and the outputs it creates are keyed by (id, index).

use crate::core::monetary::Amount;
use crate::error::{Result, SettlementError};
use crate::utils::{serialize, sha256_digest};
use crate::wallet::Wallet;
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of one spendable output: the creating transaction's id and the
/// output's position in that transaction.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct UTXO {
    txid: Vec<u8>,
    vout: usize,
}

impl UTXO {
    pub fn new(txid: &[u8], vout: usize) -> UTXO {
        UTXO {
            txid: txid.to_vec(),
            vout,
        }
    }

    pub fn get_txid(&self) -> &[u8] {
        self.txid.as_slice()
    }

    pub fn get_vout(&self) -> usize {
        self.vout
    }
}

impl fmt::Display for UTXO {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", HEXLOWER.encode(&self.txid), self.vout)
    }
}

// An input says "I spend output #vout of transaction txid, and here is the
// owner's signature over this transaction".
#[derive(Debug, Clone, Default, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TXInput {
    txid: Vec<u8>,      // Id of the transaction that created the output being spent
    vout: usize,        // Index of that output
    signature: Vec<u8>, // Owner's signature over signable_bytes(this input's index)
}

impl TXInput {
    pub fn new(txid: &[u8], vout: usize) -> TXInput {
        TXInput {
            txid: txid.to_vec(),
            vout,
            signature: vec![], // filled in by Transaction::sign_input
        }
    }

    pub fn spending(utxo: &UTXO) -> TXInput {
        TXInput::new(utxo.get_txid(), utxo.get_vout())
    }

    pub fn get_txid(&self) -> &[u8] {
        self.txid.as_slice()
    }

    pub fn get_vout(&self) -> usize {
        self.vout
    }

    pub fn get_signature(&self) -> &[u8] {
        self.signature.as_slice()
    }

    /// The output this input claims
    pub fn utxo(&self) -> UTXO {
        UTXO::new(&self.txid, self.vout)
    }
}

// An output is an amount locked to an owner credential (a public key).
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct TXOutput {
    value: Amount,
    owner: Vec<u8>,
}

impl TXOutput {
    pub fn new(value: Amount, owner: &[u8]) -> TXOutput {
        TXOutput {
            value,
            owner: owner.to_vec(),
        }
    }

    pub fn to_wallet(value: Amount, wallet: &Wallet) -> TXOutput {
        TXOutput::new(value, wallet.get_public_key())
    }

    pub fn get_value(&self) -> Amount {
        self.value
    }

    pub fn get_owner(&self) -> &[u8] {
        self.owner.as_slice()
    }
}

/// An immutable transfer of value.
///
/// Two transactions are the same transaction exactly when their ids match;
/// `PartialEq` and `Hash` only look at the id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Transaction {
    id: Vec<u8>,
    vin: Vec<TXInput>,
    vout: Vec<TXOutput>,
}

impl Transaction {
    pub fn new(vin: Vec<TXInput>, vout: Vec<TXOutput>) -> Result<Transaction> {
        let mut tx = Transaction {
            id: vec![],
            vin,
            vout,
        };
        tx.id = tx.calculate_id()?;
        Ok(tx)
    }

    /// Build a transaction spending `inputs` (each signed by the paired wallet)
    /// and creating `outputs`.
    pub fn new_signed(inputs: &[(UTXO, &Wallet)], outputs: Vec<TXOutput>) -> Result<Transaction> {
        let vin = inputs.iter().map(|(utxo, _)| TXInput::spending(utxo)).collect();
        let mut tx = Transaction::new(vin, outputs)?;
        for (idx, (_, wallet)) in inputs.iter().enumerate() {
            tx.sign_input(idx, wallet)?;
        }
        Ok(tx)
    }

    /// The exact bytes the signature on input `index` must cover.
    ///
    /// Covers the claimed output of that input plus every output of the
    /// transaction. No signature is ever part of the signed bytes.
    pub fn signable_bytes(&self, index: usize) -> Result<Vec<u8>> {
        let input = self.vin.get(index).ok_or_else(|| {
            SettlementError::Transaction(format!(
                "Input index {index} out of range ({} inputs)",
                self.vin.len()
            ))
        })?;
        serialize(&(input.txid.clone(), input.vout, self.vout.clone()))
    }

    pub fn sign_input(&mut self, index: usize, wallet: &Wallet) -> Result<()> {
        let message = self.signable_bytes(index)?;
        let signature = wallet.sign(&message)?;
        self.vin[index].signature = signature;
        // signatures are part of the identity hash
        self.id = self.calculate_id()?;
        Ok(())
    }

    fn calculate_id(&self) -> Result<Vec<u8>> {
        let tx_copy = Transaction {
            id: vec![],
            vin: self.vin.clone(),
            vout: self.vout.clone(),
        };
        Ok(sha256_digest(&serialize(&tx_copy)?))
    }

    /// Whether the declared id matches the content. Externally loaded
    /// transactions should be checked before they are settled.
    pub fn has_consistent_id(&self) -> Result<bool> {
        Ok(self.calculate_id()? == self.id)
    }

    pub fn get_id(&self) -> &[u8] {
        self.id.as_slice()
    }

    pub fn get_id_hex(&self) -> String {
        HEXLOWER.encode(&self.id)
    }

    pub fn get_vin(&self) -> &[TXInput] {
        self.vin.as_slice()
    }

    pub fn get_vout(&self) -> &[TXOutput] {
        self.vout.as_slice()
    }

    /// Identifiers the outputs of this transaction receive once accepted
    pub fn output_utxos(&self) -> impl Iterator<Item = (UTXO, &TXOutput)> + '_ {
        self.vout
            .iter()
            .enumerate()
            .map(move |(idx, out)| (UTXO::new(&self.id, idx), out))
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Transaction {}

impl Hash for Transaction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{EcdsaP256Verifier, SignatureVerifier};

    #[test]
    fn test_id_is_content_hash() {
        let owner = Wallet::new().unwrap();
        let tx = Transaction::new(
            vec![TXInput::new(b"prev", 0)],
            vec![TXOutput::to_wallet(5, &owner)],
        )
        .unwrap();

        assert_eq!(tx.get_id().len(), 32);
        assert!(tx.has_consistent_id().unwrap());

        let same = Transaction::new(
            vec![TXInput::new(b"prev", 0)],
            vec![TXOutput::to_wallet(5, &owner)],
        )
        .unwrap();
        assert_eq!(tx, same);

        let different = Transaction::new(
            vec![TXInput::new(b"prev", 1)],
            vec![TXOutput::to_wallet(5, &owner)],
        )
        .unwrap();
        assert_ne!(tx, different);
    }

    #[test]
    fn test_signing_changes_id_but_not_signable_bytes() {
        let owner = Wallet::new().unwrap();
        let mut tx = Transaction::new(
            vec![TXInput::new(b"prev", 0)],
            vec![TXOutput::to_wallet(5, &owner)],
        )
        .unwrap();
        let unsigned_id = tx.get_id().to_vec();
        let message = tx.signable_bytes(0).unwrap();

        tx.sign_input(0, &owner).unwrap();

        assert_ne!(tx.get_id(), unsigned_id.as_slice());
        assert_eq!(tx.signable_bytes(0).unwrap(), message);
        assert!(tx.has_consistent_id().unwrap());
        assert!(EcdsaP256Verifier.verify(
            owner.get_public_key(),
            &message,
            tx.get_vin()[0].get_signature()
        ));
    }

    #[test]
    fn test_signable_bytes_differ_per_input() {
        let owner = Wallet::new().unwrap();
        let tx = Transaction::new(
            vec![TXInput::new(b"a", 0), TXInput::new(b"a", 1)],
            vec![TXOutput::to_wallet(1, &owner)],
        )
        .unwrap();
        assert_ne!(tx.signable_bytes(0).unwrap(), tx.signable_bytes(1).unwrap());
        assert!(tx.signable_bytes(2).is_err());
    }

    #[test]
    fn test_output_utxos_use_tx_id() {
        let owner = Wallet::new().unwrap();
        let tx = Transaction::new(
            vec![],
            vec![TXOutput::to_wallet(0, &owner), TXOutput::to_wallet(0, &owner)],
        )
        .unwrap();
        let ids: Vec<UTXO> = tx.output_utxos().map(|(utxo, _)| utxo).collect();
        assert_eq!(ids, vec![UTXO::new(tx.get_id(), 0), UTXO::new(tx.get_id(), 1)]);
    }

    #[test]
    fn test_tampered_id_is_detected() {
        let json = {
            let owner = Wallet::new().unwrap();
            let tx = Transaction::new(vec![], vec![TXOutput::to_wallet(0, &owner)]).unwrap();
            serde_json::to_string(&tx).unwrap()
        };
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["id"] = serde_json::json!([1, 2, 3]);
        let tampered: Transaction = serde_json::from_value(value).unwrap();
        assert!(!tampered.has_consistent_id().unwrap());
    }
}
