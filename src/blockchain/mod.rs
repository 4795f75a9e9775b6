// Blockchain module
//
// This module contains the fork-tracking block chain including:
// - Block and transaction structures
// - Unspent-output pools and the transaction validator
// - The fork tree with best-chain tracking and pruning
// - Pending-transaction pool and block assembly

pub mod block;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod miner;
pub mod shared;
pub mod transaction;
pub mod transaction_pool;
pub mod tx_handler;
pub mod utxo;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{BlockChain, BlockchainError};
pub use config::{ChainConfig, CUT_OFF_AGE};
pub use crypto::{Address, DigitalSignature, Hash, Wallet};
pub use miner::Miner;
pub use shared::SharedBlockChain;
pub use transaction::{Transaction, TransactionError};
pub use transaction_pool::TransactionPool;
pub use tx_handler::TxHandler;
pub use utxo::{Utxo, UtxoPool};
