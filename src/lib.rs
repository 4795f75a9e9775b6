//! A bounded-memory view of a proof-of-work block chain.
//!
//! [`BlockChain`] keeps every competing branch within a cut-off window of the
//! best tip, validates each incoming block against the unspent outputs of the
//! branch it extends, and drops branches that can no longer become the best
//! chain.

pub mod blockchain;

pub use blockchain::{
    Block, BlockChain, BlockchainError, ChainConfig, Hash, Miner, SharedBlockChain, Transaction,
    TransactionPool, TxHandler, Utxo, UtxoPool, Wallet,
};
