use dashmap::DashMap;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::crypto::Hash;
use super::transaction::Transaction;

/// Pending transactions waiting to be included in a block.
///
/// Clones share the same underlying pool. Nothing is validated on submission.
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    transactions: Arc<DashMap<Hash, (u64, Transaction)>>,
    next_seq: Arc<AtomicU64>,
}

impl TransactionPool {
    pub fn new() -> Self {
        TransactionPool::default()
    }

    /// Adds a transaction; a hash already in the pool is left as is
    pub fn add_transaction(&self, transaction: Transaction) {
        self.transactions.entry(transaction.hash).or_insert_with(|| {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            (seq, transaction)
        });
    }

    pub fn remove_transaction(&self, hash: &Hash) -> Option<Transaction> {
        self.transactions.remove(hash).map(|(_, (_, tx))| tx)
    }

    pub fn get_transaction(&self, hash: &Hash) -> Option<Transaction> {
        self.transactions.get(hash).map(|entry| entry.value().1.clone())
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.transactions.contains_key(hash)
    }

    /// All pending transactions in submission order
    pub fn transactions(&self) -> Vec<Transaction> {
        let mut entries: Vec<(u64, Transaction)> = self
            .transactions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, tx)| tx).collect()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
