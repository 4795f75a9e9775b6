use log::info;

use super::block::Block;
use super::chain::{BlockChain, BlockchainError};
use super::crypto::Address;
use super::transaction::Transaction;
use super::tx_handler::TxHandler;

/// Assembles blocks on the best tip from pending transactions
#[derive(Debug, Clone)]
pub struct Miner {
    address: Address,
    reward: u64,
}

impl Miner {
    /// Creates a miner paying `reward` per block to `address`
    pub fn new(address: Address, reward: u64) -> Self {
        Miner { address, reward }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Builds the next block on the best tip and submits it to `chain`.
    ///
    /// Pending transactions that are not valid against the best tip are left
    /// out of the block and stay in the pool. Transactions included in an
    /// admitted block are removed from the pool.
    ///
    /// # Returns
    ///
    /// The admitted block, or the reason `chain` rejected it
    pub fn mine_block(&self, chain: &mut BlockChain) -> Result<Block, BlockchainError> {
        let parent_hash = chain.max_height_block().hash;
        let pending = chain.transaction_pool().transactions();

        let mut handler = TxHandler::new(chain.max_height_utxo_pool());
        let included = handler.handle_txs(&pending);

        let coinbase = Transaction::new_coinbase(self.address.clone(), self.reward);
        let block = Block::with_coinbase(Some(parent_hash), coinbase, included);

        chain.add_block(block.clone())?;

        let pool = chain.transaction_pool();
        for transaction in &block.transactions {
            pool.remove_transaction(&transaction.hash);
        }

        info!(
            "Mined block {} with {} of {} pending transactions",
            block.hash.short(),
            block.transactions.len(),
            pending.len()
        );

        Ok(block)
    }
}
