use log::{debug, info};
use thiserror::Error;

use std::collections::HashMap;

use super::block::Block;
use super::config::ChainConfig;
use super::crypto::Hash;
use super::transaction::Transaction;
use super::transaction_pool::TransactionPool;
use super::tx_handler::TxHandler;
use super::utxo::UtxoPool;

/// Reasons a block is not admitted. None of them leave a trace in the tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockchainError {
    #[error("Block declares no parent but is not the genesis block")]
    MissingParentMarker,

    #[error("Block {0} is already in the tree")]
    DuplicateBlock(Hash),

    #[error("Parent block {0} is unknown or pruned")]
    OrphanParent(Hash),

    #[error("Only {accepted} of {submitted} transactions are valid")]
    InvalidTransactions { accepted: usize, submitted: usize },

    #[error("Block at height {height} is too far behind best height {best_height} (cut-off age {cut_off_age})")]
    TooFarBehind {
        height: u64,
        best_height: u64,
        cut_off_age: u64,
    },
}

/// One accepted block positioned in the tree
#[derive(Debug, Clone)]
struct ForkNode {
    block: Block,
    parent: Option<Hash>,
    children: Vec<Hash>,
    height: u64,
    /// Unspent outputs after applying every block from genesis to this one
    utxo_pool: UtxoPool,
}

/// A forest of competing branches rooted at the genesis block.
///
/// Nodes are held in an arena keyed by block hash; parent and child links are
/// hashes into that arena. Every node owns an independent copy of the unspent
/// outputs on its branch, so blocks are validated against exactly the history
/// they extend.
#[derive(Debug)]
pub struct BlockChain {
    nodes: HashMap<Hash, ForkNode>,
    max_height_node: Hash,
    tx_pool: TransactionPool,
    config: ChainConfig,
}

impl BlockChain {
    /// Creates a chain holding only `genesis_block`, which is trusted as valid
    pub fn new(genesis_block: Block) -> Self {
        Self::with_config(genesis_block, ChainConfig::default())
    }

    pub fn with_config(genesis_block: Block, config: ChainConfig) -> Self {
        let mut utxo_pool = UtxoPool::new();
        utxo_pool.add_outputs(&genesis_block.coinbase);

        let genesis_hash = genesis_block.hash;
        let genesis_node = ForkNode {
            block: genesis_block,
            parent: None,
            children: Vec::new(),
            height: 1,
            utxo_pool,
        };

        let mut nodes = HashMap::new();
        nodes.insert(genesis_hash, genesis_node);

        info!("Initialized block chain at genesis {}", genesis_hash.short());

        BlockChain {
            nodes,
            max_height_node: genesis_hash,
            tx_pool: TransactionPool::new(),
            config,
        }
    }

    fn best_node(&self) -> &ForkNode {
        // the best node is never pruned
        &self.nodes[&self.max_height_node]
    }

    /// The block at the tip of the highest branch
    pub fn max_height_block(&self) -> &Block {
        &self.best_node().block
    }

    pub fn max_height(&self) -> u64 {
        self.best_node().height
    }

    /// A copy of the unspent outputs at the best tip, for assembling the next block
    pub fn max_height_utxo_pool(&self) -> UtxoPool {
        self.best_node().utxo_pool.clone()
    }

    pub fn transaction_pool(&self) -> &TransactionPool {
        &self.tx_pool
    }

    /// Queues a transaction for a future block; nothing is validated here
    pub fn add_transaction(&self, transaction: Transaction) {
        self.tx_pool.add_transaction(transaction);
    }

    /// Attempts to extend the tree with `block`.
    ///
    /// The block must name a tracked parent, every one of its transactions
    /// must be valid against the parent's unspent outputs, and its height must
    /// exceed `max_height() - cut_off_age`. On success the block becomes the
    /// best tip if it is strictly higher than the current one.
    pub fn add_block(&mut self, block: Block) -> Result<(), BlockchainError> {
        let prev_hash = block
            .prev_block_hash
            .ok_or(BlockchainError::MissingParentMarker)?;

        if self.nodes.contains_key(&block.hash) {
            return Err(BlockchainError::DuplicateBlock(block.hash));
        }

        let parent = self
            .nodes
            .get(&prev_hash)
            .ok_or(BlockchainError::OrphanParent(prev_hash))?;

        let mut handler = TxHandler::new(parent.utxo_pool.clone());
        let accepted = handler.handle_txs(&block.transactions);
        if accepted.len() != block.transactions.len() {
            return Err(BlockchainError::InvalidTransactions {
                accepted: accepted.len(),
                submitted: block.transactions.len(),
            });
        }

        let height = parent.height + 1;
        let best_height = self.max_height();
        if height <= best_height.saturating_sub(self.config.cut_off_age) {
            return Err(BlockchainError::TooFarBehind {
                height,
                best_height,
                cut_off_age: self.config.cut_off_age,
            });
        }

        let mut utxo_pool = handler.into_utxo_pool();
        utxo_pool.add_outputs(&block.coinbase);

        let hash = block.hash;
        debug!(
            "Admitted block {} at height {} on {} ({} transactions)",
            hash.short(),
            height,
            prev_hash.short(),
            block.transactions.len()
        );

        if let Some(parent) = self.nodes.get_mut(&prev_hash) {
            parent.children.push(hash);
        }
        self.nodes.insert(
            hash,
            ForkNode {
                block,
                parent: Some(prev_hash),
                children: Vec::new(),
                height,
                utxo_pool,
            },
        );

        if height > best_height {
            self.max_height_node = hash;
            info!("New best block {} at height {}", hash.short(), height);

            if self.config.prune_dead_branches {
                self.prune();
            }
        }

        Ok(())
    }

    /// Drops every node that can no longer be a parent: a child of it would
    /// land at or below `max_height() - cut_off_age`.
    fn prune(&mut self) {
        let threshold = self.max_height().saturating_sub(self.config.cut_off_age);
        let before = self.nodes.len();

        self.nodes.retain(|_, node| node.height >= threshold);

        let evicted = before - self.nodes.len();
        if evicted > 0 {
            info!(
                "Pruned {} block(s) below height {}, {} remain",
                evicted,
                threshold,
                self.nodes.len()
            );
        }
    }

    pub fn contains_block(&self, hash: &Hash) -> bool {
        self.nodes.contains_key(hash)
    }

    pub fn get_block(&self, hash: &Hash) -> Option<&Block> {
        self.nodes.get(hash).map(|node| &node.block)
    }

    pub fn height_of(&self, hash: &Hash) -> Option<u64> {
        self.nodes.get(hash).map(|node| node.height)
    }

    /// The parent recorded for `hash`; the parent itself may have been pruned
    pub fn parent_of(&self, hash: &Hash) -> Option<Hash> {
        self.nodes.get(hash).and_then(|node| node.parent)
    }

    pub fn children_of(&self, hash: &Hash) -> Option<&[Hash]> {
        self.nodes.get(hash).map(|node| node.children.as_slice())
    }

    /// A copy of the unspent outputs as of block `hash`
    pub fn utxo_pool_at(&self, hash: &Hash) -> Option<UtxoPool> {
        self.nodes.get(hash).map(|node| node.utxo_pool.clone())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Hashes of tracked blocks with no children, highest first
    pub fn tips(&self) -> Vec<Hash> {
        let mut tips: Vec<(u64, Hash)> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(hash, node)| (node.height, *hash))
            .collect();
        tips.sort_by(|a, b| b.cmp(a));
        tips.into_iter().map(|(_, hash)| hash).collect()
    }

    pub fn cut_off_age(&self) -> u64 {
        self.config.cut_off_age
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }
}
