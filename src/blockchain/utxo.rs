use serde::{Deserialize, Serialize};

use std::collections::HashMap;
use std::fmt;

use super::crypto::{Address, Hash};
use super::transaction::{Output, Transaction};

/// Identifies an unspent output: the hash of the transaction that created it
/// and its position in that transaction's outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Utxo {
    pub tx_hash: Hash,
    pub index: u32,
}

impl Utxo {
    pub fn new(tx_hash: Hash, index: u32) -> Self {
        Utxo { tx_hash, index }
    }
}

impl fmt::Display for Utxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash.short(), self.index)
    }
}

/// The set of unspent outputs reachable on one branch.
///
/// Cloning yields a fully independent copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoPool {
    utxos: HashMap<Utxo, Output>,
}

impl UtxoPool {
    pub fn new() -> Self {
        UtxoPool {
            utxos: HashMap::new(),
        }
    }

    pub fn add_utxo(&mut self, utxo: Utxo, output: Output) {
        self.utxos.insert(utxo, output);
    }

    pub fn remove_utxo(&mut self, utxo: &Utxo) -> Option<Output> {
        self.utxos.remove(utxo)
    }

    pub fn get_output(&self, utxo: &Utxo) -> Option<&Output> {
        self.utxos.get(utxo)
    }

    pub fn contains(&self, utxo: &Utxo) -> bool {
        self.utxos.contains_key(utxo)
    }

    pub fn all_utxos(&self) -> Vec<Utxo> {
        self.utxos.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Adds every output of `transaction` keyed by its hash
    pub fn add_outputs(&mut self, transaction: &Transaction) {
        for (index, output) in transaction.outputs.iter().enumerate() {
            self.add_utxo(Utxo::new(transaction.hash, index as u32), output.clone());
        }
    }

    /// Total value held by `address`
    pub fn balance_of(&self, address: &Address) -> u64 {
        self.utxos
            .values()
            .filter(|output| &output.address == address)
            .fold(0u64, |acc, output| acc.saturating_add(output.value))
    }

    /// Unspent outputs owned by `address`
    pub fn utxos_for(&self, address: &Address) -> Vec<(Utxo, &Output)> {
        self.utxos
            .iter()
            .filter(|(_, output)| &output.address == address)
            .map(|(utxo, output)| (*utxo, output))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::crypto::Wallet;

    #[test]
    fn test_add_remove_lookup() {
        let owner = Wallet::new();
        let coinbase = Transaction::new_coinbase(owner.address().clone(), 10);
        let utxo = Utxo::new(coinbase.hash, 0);

        let mut pool = UtxoPool::new();
        assert!(pool.is_empty());
        pool.add_outputs(&coinbase);

        assert!(pool.contains(&utxo));
        assert_eq!(pool.get_output(&utxo).unwrap().value, 10);
        assert_eq!(pool.balance_of(owner.address()), 10);
        assert_eq!(pool.utxos_for(owner.address()).len(), 1);

        let removed = pool.remove_utxo(&utxo).unwrap();
        assert_eq!(removed.value, 10);
        assert!(!pool.contains(&utxo));
        assert!(pool.remove_utxo(&utxo).is_none());
    }

    #[test]
    fn test_clone_is_independent() {
        let owner = Wallet::new();
        let coinbase = Transaction::new_coinbase(owner.address().clone(), 10);
        let utxo = Utxo::new(coinbase.hash, 0);

        let mut original = UtxoPool::new();
        original.add_outputs(&coinbase);

        let mut copy = original.clone();
        copy.remove_utxo(&utxo);

        assert!(original.contains(&utxo));
        assert!(!copy.contains(&utxo));
        assert_eq!(original.all_utxos(), vec![utxo]);
    }
}
