use log::debug;

use std::collections::HashSet;

use super::crypto::verify_signature;
use super::transaction::{Transaction, TransactionError};
use super::utxo::{Utxo, UtxoPool};

/// Validates transactions against a private copy of an unspent-output set
#[derive(Debug, Clone)]
pub struct TxHandler {
    utxo_pool: UtxoPool,
}

impl TxHandler {
    /// Takes ownership of `utxo_pool`; pass a clone to keep the caller's copy intact
    pub fn new(utxo_pool: UtxoPool) -> Self {
        TxHandler { utxo_pool }
    }

    /// Checks `tx` against the current pool.
    ///
    /// Every claimed output must be unspent, each input must carry a valid
    /// signature by the claimed output's owner, no output may be claimed twice,
    /// and the inputs must cover the outputs. Returns the fee on success.
    pub fn is_valid_tx(&self, tx: &Transaction) -> Result<u64, TransactionError> {
        let mut claimed = HashSet::new();
        let mut input_value: u64 = 0;

        for (index, input) in tx.inputs.iter().enumerate() {
            let utxo = Utxo::new(input.prev_tx_hash, input.output_index);

            let output = self
                .utxo_pool
                .get_output(&utxo)
                .ok_or(TransactionError::MissingUtxo {
                    tx_hash: utxo.tx_hash,
                    index: utxo.index,
                })?;

            let signature = input
                .signature
                .as_ref()
                .ok_or(TransactionError::NotSigned(index))?;
            let message = tx.raw_data_to_sign(index)?;
            if !verify_signature(&message, signature, &output.address) {
                return Err(TransactionError::InvalidSignature(index));
            }

            if !claimed.insert(utxo) {
                return Err(TransactionError::DoubleClaim {
                    tx_hash: utxo.tx_hash,
                    index: utxo.index,
                });
            }

            input_value = input_value
                .checked_add(output.value)
                .ok_or(TransactionError::ValueOverflow)?;
        }

        let output_value = tx.output_value().ok_or(TransactionError::ValueOverflow)?;
        if input_value < output_value {
            return Err(TransactionError::InsufficientFunds {
                inputs: input_value,
                outputs: output_value,
            });
        }

        Ok(input_value - output_value)
    }

    /// Accepts, in order, every transaction that is valid given the ones
    /// accepted before it, and applies it to the pool.
    ///
    /// The returned list is an order-preserving subsequence of `txs`.
    pub fn handle_txs(&mut self, txs: &[Transaction]) -> Vec<Transaction> {
        let mut accepted = Vec::with_capacity(txs.len());

        for tx in txs {
            match self.is_valid_tx(tx) {
                Ok(_) => {
                    self.apply(tx);
                    accepted.push(tx.clone());
                }
                Err(err) => {
                    debug!("Rejected transaction {}: {}", tx.hash.short(), err);
                }
            }
        }

        accepted
    }

    pub fn utxo_pool(&self) -> &UtxoPool {
        &self.utxo_pool
    }

    pub fn into_utxo_pool(self) -> UtxoPool {
        self.utxo_pool
    }

    fn apply(&mut self, tx: &Transaction) {
        for input in &tx.inputs {
            self.utxo_pool
                .remove_utxo(&Utxo::new(input.prev_tx_hash, input.output_index));
        }
        self.utxo_pool.add_outputs(tx);
    }
}
