use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::block::Block;
use super::chain::{BlockChain, BlockchainError};
use super::transaction::Transaction;
use super::transaction_pool::TransactionPool;
use super::utxo::UtxoPool;

/// A `BlockChain` shared between threads.
///
/// Admission runs entirely under the write lock, so no other admitter can
/// observe or change the tree between parent lookup and best-tip update.
/// Readers get copies under the read lock.
#[derive(Debug, Clone)]
pub struct SharedBlockChain {
    chain: Arc<RwLock<BlockChain>>,
    tx_pool: TransactionPool,
}

impl SharedBlockChain {
    pub fn new(chain: BlockChain) -> Self {
        let tx_pool = chain.transaction_pool().clone();
        SharedBlockChain {
            chain: Arc::new(RwLock::new(chain)),
            tx_pool,
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, BlockChain> {
        self.chain.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, BlockChain> {
        self.chain.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_block(&self, block: Block) -> Result<(), BlockchainError> {
        self.write().add_block(block)
    }

    pub fn max_height_block(&self) -> Block {
        self.read().max_height_block().clone()
    }

    pub fn max_height_utxo_pool(&self) -> UtxoPool {
        self.read().max_height_utxo_pool()
    }

    pub fn max_height(&self) -> u64 {
        self.read().max_height()
    }

    /// Queues a transaction without taking the chain lock
    pub fn add_transaction(&self, transaction: Transaction) {
        self.tx_pool.add_transaction(transaction);
    }

    pub fn transaction_pool(&self) -> &TransactionPool {
        &self.tx_pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::crypto::Wallet;

    use std::thread;

    #[test]
    fn test_concurrent_admission_keeps_best_height() {
        let miner = Wallet::new();
        let genesis = Block::genesis(miner.address(), 10);
        let shared = SharedBlockChain::new(BlockChain::new(genesis));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                let miner = miner.clone();
                thread::spawn(move || {
                    for _ in 0..5 {
                        let mut chain = shared.write();
                        let tip = chain.max_height_block().hash;
                        let block = Block::new(Some(tip), miner.address(), 1);
                        chain.add_block(block).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.max_height(), 21);
        assert_eq!(shared.read().node_count(), 11);
    }

    #[test]
    fn test_concurrent_submission_reaches_pool() {
        let miner = Wallet::new();
        let genesis = Block::genesis(miner.address(), 10);
        let shared = SharedBlockChain::new(BlockChain::new(genesis));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                let miner = miner.clone();
                thread::spawn(move || {
                    for j in 0..10 {
                        let tx = Transaction::new_coinbase(miner.address().clone(), i * 10 + j);
                        shared.add_transaction(tx);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.transaction_pool().len(), 40);
        assert_eq!(shared.read().transaction_pool().len(), 40);
    }

    #[test]
    fn test_reads_return_copies() {
        let miner = Wallet::new();
        let genesis = Block::genesis(miner.address(), 10);
        let shared = SharedBlockChain::new(BlockChain::new(genesis.clone()));

        let block = Block::new(Some(genesis.hash), miner.address(), 5);
        shared.add_block(block.clone()).unwrap();
        assert_eq!(shared.max_height_block(), block);

        let mut pool = shared.max_height_utxo_pool();
        let before = pool.len();
        for utxo in pool.all_utxos() {
            pool.remove_utxo(&utxo);
        }
        assert_eq!(shared.max_height_utxo_pool().len(), before);
        assert_eq!(before, 2);
    }
}
