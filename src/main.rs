use anyhow::Context;
use log::{info, warn};

use fork_chain::blockchain::{
    Block, BlockChain, ChainConfig, Miner, SharedBlockChain, Transaction, Wallet,
};

const COINBASE_REWARD: u64 = 25;

// Load the chain config from the path given as the first argument, if any
fn load_config() -> anyhow::Result<ChainConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let config = ChainConfig::from_json_file(&path)
                .with_context(|| format!("loading config from {}", path))?;
            info!("Loaded config from {}: {:?}", path, config);
            Ok(config)
        }
        None => {
            info!("No config file given, using defaults");
            Ok(ChainConfig::default())
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = load_config()?;

    let alice = Wallet::new();
    let bob = Wallet::new();
    let miner_wallet = Wallet::new();
    let miner = Miner::new(miner_wallet.address().clone(), COINBASE_REWARD);

    let genesis = Block::genesis(alice.address(), COINBASE_REWARD);
    let shared = SharedBlockChain::new(BlockChain::with_config(genesis.clone(), config));

    // Alice pays Bob from the genesis coinbase
    let mut payment = Transaction::new();
    payment.add_input(genesis.coinbase.hash, 0);
    payment.add_output(20, bob.address().clone());
    payment.add_output(5, alice.address().clone());
    payment.sign_input(0, &alice)?;
    payment.finalize();
    shared.add_transaction(payment);

    // A competing block on genesis from another miner
    let rival = Block::new(Some(genesis.hash), bob.address(), COINBASE_REWARD);
    let cut_off_age = shared.read().cut_off_age();

    for round in 0..(cut_off_age + 3) {
        let block = miner.mine_block(&mut shared.write())?;
        info!(
            "Round {}: mined {}, best height {}",
            round,
            block.hash.short(),
            shared.max_height()
        );

        if round == 0 {
            if let Err(err) = shared.add_block(rival.clone()) {
                warn!("Rival block rejected: {}", err);
            }
        }
    }

    // By now the rival branch has fallen out of the window
    match shared.add_block(Block::new(Some(rival.hash), bob.address(), COINBASE_REWARD)) {
        Ok(()) => info!("Extended the rival branch"),
        Err(err) => info!("Rival branch can no longer be extended: {}", err),
    }

    let chain = shared.read();
    let best = chain.max_height_block();
    let utxo_pool = chain.max_height_utxo_pool();

    info!("Best block {} at height {}", best.hash, chain.max_height());
    info!("Tracking {} blocks, {} tips", chain.node_count(), chain.tips().len());
    info!("Alice balance: {}", utxo_pool.balance_of(alice.address()));
    info!("Bob balance: {}", utxo_pool.balance_of(bob.address()));
    info!("Miner balance: {}", utxo_pool.balance_of(miner.address()));
    info!("Pending transactions: {}", chain.transaction_pool().len());

    Ok(())
}
