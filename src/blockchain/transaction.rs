use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::crypto::{Address, CryptoError, DigitalSignature, Hash, Wallet};

/// Errors that can occur during transaction operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Output {index} of transaction {tx_hash} is not unspent")]
    MissingUtxo { tx_hash: Hash, index: u32 },

    #[error("Invalid signature on input {0}")]
    InvalidSignature(usize),

    #[error("Input {0} is not signed")]
    NotSigned(usize),

    #[error("Output {index} of transaction {tx_hash} is claimed more than once")]
    DoubleClaim { tx_hash: Hash, index: u32 },

    #[error("Insufficient input value: inputs {inputs}, outputs {outputs}")]
    InsufficientFunds { inputs: u64, outputs: u64 },

    #[error("Value overflow")]
    ValueOverflow,

    #[error("No input at index {0}")]
    InputOutOfRange(usize),

    #[error("Crypto error: {0}")]
    CryptoError(#[from] CryptoError),
}

/// A reference to an output of an earlier transaction, plus the owner's signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    /// Hash of the transaction holding the claimed output
    pub prev_tx_hash: Hash,

    /// Position of the claimed output in that transaction
    pub output_index: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<DigitalSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub value: u64,
    pub address: Address,
}

/// A transaction in the UTXO model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default = "default_version")]
    pub version: u32,

    pub inputs: Vec<Input>,

    pub outputs: Vec<Output>,

    /// Distinguishes otherwise identical transactions (coinbases paying the same miner)
    pub nonce: u64,

    pub timestamp: DateTime<Utc>,

    /// Hash of the transaction (calculated by `finalize`)
    pub hash: Hash,
}

fn default_version() -> u32 {
    1
}

impl Transaction {
    /// Creates an empty, unsigned transaction
    pub fn new() -> Self {
        Transaction {
            version: default_version(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            nonce: 0,
            timestamp: Utc::now(),
            hash: Hash::ZERO,
        }
    }

    /// Creates a finalized coinbase transaction paying `value` to `recipient`
    pub fn new_coinbase(recipient: Address, value: u64) -> Self {
        let mut transaction = Transaction::new();
        transaction.nonce = rand::random();
        transaction.add_output(value, recipient);
        transaction.finalize();
        transaction
    }

    pub fn add_input(&mut self, prev_tx_hash: Hash, output_index: u32) {
        self.inputs.push(Input {
            prev_tx_hash,
            output_index,
            signature: None,
        });
    }

    pub fn add_output(&mut self, value: u64, address: Address) {
        self.outputs.push(Output { value, address });
    }

    pub fn input(&self, index: usize) -> Option<&Input> {
        self.inputs.get(index)
    }

    pub fn output(&self, index: usize) -> Option<&Output> {
        self.outputs.get(index)
    }

    /// Coinbase transactions claim nothing
    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    /// The bytes the owner of input `index` signs: the claimed output and
    /// every output of this transaction.
    pub fn raw_data_to_sign(&self, index: usize) -> Result<Vec<u8>, TransactionError> {
        let input = self
            .inputs
            .get(index)
            .ok_or(TransactionError::InputOutOfRange(index))?;

        let mut data = Vec::new();
        data.extend_from_slice(input.prev_tx_hash.as_bytes());
        data.extend_from_slice(&input.output_index.to_be_bytes());
        for output in &self.outputs {
            data.extend_from_slice(&output.value.to_be_bytes());
            data.extend_from_slice(output.address.0.as_bytes());
        }
        data.extend_from_slice(&self.nonce.to_be_bytes());
        Ok(data)
    }

    /// Signs input `index` with `wallet`
    pub fn sign_input(&mut self, index: usize, wallet: &Wallet) -> Result<(), TransactionError> {
        let message = self.raw_data_to_sign(index)?;
        let signature = wallet.sign(&message);
        self.inputs[index].signature = Some(signature);
        Ok(())
    }

    /// Sum of all output values, `None` on overflow
    pub fn output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, output| acc.checked_add(output.value))
    }

    /// Recomputes and stores the transaction hash
    pub fn finalize(&mut self) {
        self.hash = self.calculate_hash();
    }

    /// SHA-256 over every field except the stored hash
    pub fn calculate_hash(&self) -> Hash {
        let mut data = Vec::new();
        data.extend_from_slice(&self.version.to_be_bytes());
        data.extend_from_slice(&(self.inputs.len() as u64).to_be_bytes());
        for input in &self.inputs {
            data.extend_from_slice(input.prev_tx_hash.as_bytes());
            data.extend_from_slice(&input.output_index.to_be_bytes());
            if let Some(signature) = &input.signature {
                data.extend_from_slice(signature.0.as_bytes());
            }
            data.push(0);
        }
        data.extend_from_slice(&(self.outputs.len() as u64).to_be_bytes());
        for output in &self.outputs {
            data.extend_from_slice(&output.value.to_be_bytes());
            data.extend_from_slice(output.address.0.as_bytes());
            data.push(0);
        }
        data.extend_from_slice(&self.nonce.to_be_bytes());
        data.extend_from_slice(self.timestamp.to_rfc3339().as_bytes());

        Hash::digest([data.as_slice()])
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::crypto::verify_signature;

    #[test]
    fn test_coinbase_transaction() {
        let miner = Wallet::new();
        let coinbase = Transaction::new_coinbase(miner.address().clone(), 25);

        assert!(coinbase.is_coinbase());
        assert_eq!(coinbase.outputs.len(), 1);
        assert_eq!(coinbase.output(0).unwrap().value, 25);
        assert_eq!(coinbase.hash, coinbase.calculate_hash());
        assert_ne!(coinbase.hash, Hash::ZERO);
    }

    #[test]
    fn test_coinbases_to_same_miner_differ() {
        let miner = Wallet::new();
        let a = Transaction::new_coinbase(miner.address().clone(), 25);
        let b = Transaction::new_coinbase(miner.address().clone(), 25);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_sign_input() {
        let owner = Wallet::new();
        let recipient = Wallet::new();

        let mut tx = Transaction::new();
        tx.add_input(Hash::digest([b"prev".as_slice()]), 0);
        tx.add_output(5, recipient.address().clone());
        tx.sign_input(0, &owner).unwrap();
        tx.finalize();

        let signature = tx.input(0).unwrap().signature.clone().unwrap();
        let message = tx.raw_data_to_sign(0).unwrap();
        assert!(verify_signature(&message, &signature, owner.address()));
        assert!(!tx.is_coinbase());
    }

    #[test]
    fn test_sign_missing_input() {
        let owner = Wallet::new();
        let mut tx = Transaction::new();
        let result = tx.sign_input(3, &owner);
        assert!(matches!(result, Err(TransactionError::InputOutOfRange(3))));
    }

    #[test]
    fn test_signature_changes_hash() {
        let owner = Wallet::new();
        let mut tx = Transaction::new();
        tx.add_input(Hash::digest([b"prev".as_slice()]), 1);
        tx.add_output(3, owner.address().clone());
        let unsigned = tx.calculate_hash();

        tx.sign_input(0, &owner).unwrap();
        assert_ne!(unsigned, tx.calculate_hash());
    }

    #[test]
    fn test_output_value_overflow() {
        let owner = Wallet::new();
        let mut tx = Transaction::new();
        tx.add_output(u64::MAX, owner.address().clone());
        assert_eq!(tx.output_value(), Some(u64::MAX));
        tx.add_output(1, owner.address().clone());
        assert_eq!(tx.output_value(), None);
    }
}
