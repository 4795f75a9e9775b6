use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::crypto::{Address, Hash};
use super::transaction::Transaction;

/// Represents a block in the blockchain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Version of the block structure
    #[serde(default = "default_version")]
    pub version: u32,

    /// Hash of the parent block; only the genesis block has none
    pub prev_block_hash: Option<Hash>,

    /// Reward transaction whose outputs become spendable once the block is accepted
    pub coinbase: Transaction,

    /// Regular transactions included in this block
    pub transactions: Vec<Transaction>,

    /// Timestamp when the block was created
    pub timestamp: DateTime<Utc>,

    /// Hash of the current block (calculated)
    pub hash: Hash,
}

/// Default version for blocks
fn default_version() -> u32 {
    1
}

impl Block {
    /// Creates a new block on top of `prev_block_hash` paying `reward` to `miner`
    ///
    /// # Arguments
    ///
    /// * `prev_block_hash` - The hash of the parent block, `None` for genesis
    /// * `miner` - The address receiving the coinbase output
    /// * `reward` - The coinbase value
    ///
    /// # Returns
    ///
    /// A new Block instance with no regular transactions
    pub fn new(prev_block_hash: Option<Hash>, miner: &Address, reward: u64) -> Self {
        Block::with_coinbase(
            prev_block_hash,
            Transaction::new_coinbase(miner.clone(), reward),
            Vec::new(),
        )
    }

    /// Creates a block from an explicit coinbase and transaction list
    pub fn with_coinbase(
        prev_block_hash: Option<Hash>,
        coinbase: Transaction,
        transactions: Vec<Transaction>,
    ) -> Self {
        let mut block = Block {
            version: default_version(),
            prev_block_hash,
            coinbase,
            transactions,
            timestamp: Utc::now(),
            hash: Hash::ZERO,
        };
        block.finalize();
        block
    }

    /// Creates a genesis block (no parent)
    pub fn genesis(miner: &Address, reward: u64) -> Self {
        Block::new(None, miner, reward)
    }

    /// Appends a transaction and refreshes the block hash
    pub fn add_transaction(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
        self.finalize();
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_block_hash.is_none()
    }

    /// Recomputes and stores the block hash
    pub fn finalize(&mut self) {
        self.hash = self.calculate_hash();
    }

    /// Calculates the hash of the block
    ///
    /// # Returns
    ///
    /// SHA-256 over the parent hash, coinbase hash, transaction hashes and timestamp
    pub fn calculate_hash(&self) -> Hash {
        let mut data = Vec::new();
        data.extend_from_slice(&self.version.to_be_bytes());
        match &self.prev_block_hash {
            Some(prev) => {
                data.push(1);
                data.extend_from_slice(prev.as_bytes());
            }
            None => data.push(0),
        }
        data.extend_from_slice(self.coinbase.hash.as_bytes());
        for transaction in &self.transactions {
            data.extend_from_slice(transaction.hash.as_bytes());
        }
        data.extend_from_slice(self.timestamp.to_rfc3339().as_bytes());

        Hash::digest([data.as_slice()])
    }
}
