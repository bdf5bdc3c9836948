use clap::Parser;
use data_encoding::HEXLOWER;
use ember_ledger::{
    address_to_pub_key_hash, convert_address, hash_pub_key, validate_address, Command, Ledger, Opt,
    ProofOfWork, Transaction, UtxoIndex, Wallets,
};
use log::{error, LevelFilter};
use std::process;

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();

    // Errors terminate here, at the outermost boundary, and nowhere else.
    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::CreateBlockchain { address } => {
            if !validate_address(&address) {
                return Err(format!("Invalid address: {address}").into());
            }
            let ledger = Ledger::create(&address)?;
            let utxo_index = UtxoIndex::new(ledger);
            utxo_index.reindex();
            println!("Done!");
        }
        Command::CreateWallet => {
            let mut wallets = Wallets::new()?;
            let address = wallets.create_wallet()?;
            println!("Your new address: {address}");
        }
        Command::ListAddresses => {
            let wallets = Wallets::new()?;
            for address in wallets.get_addresses() {
                println!("{address}");
            }
        }
        Command::GetBalance { address } => {
            if !validate_address(&address) {
                return Err(format!("Invalid address: {address}").into());
            }
            let pub_key_hash = address_to_pub_key_hash(&address)?;

            let ledger = Ledger::open()?;
            let utxo_index = UtxoIndex::new(ledger);
            let balance: u64 = utxo_index
                .find_unspent_outputs(&pub_key_hash)
                .iter()
                .map(|utxo| utxo.get_value())
                .sum();
            println!("Balance of {address}: {balance}");
        }
        Command::Send { from, to, amount } => {
            if !validate_address(&from) {
                return Err(format!("Invalid sender address: {from}").into());
            }
            if !validate_address(&to) {
                return Err(format!("Invalid recipient address: {to}").into());
            }
            if amount == 0 {
                return Err("Amount must be positive".into());
            }

            let ledger = Ledger::open()?;
            let utxo_index = UtxoIndex::new(ledger.clone());
            let wallets = Wallets::new()?;

            let transaction =
                Transaction::new_utxo_transaction(&from, &to, amount, &utxo_index, &wallets)?;
            // the sender mines the block and collects the reward
            let coinbase_tx = Transaction::new_coinbase_tx(&from, "")?;
            let block = ledger.mine_block(&[coinbase_tx, transaction])?;
            utxo_index.update(&block);
            println!("Success!");
        }
        Command::PrintChain => {
            let ledger = Ledger::open()?;
            let difficulty_bits = ledger.get_difficulty_bits();
            let mut iterator = ledger.iterator();
            while let Some(block) = iterator.next() {
                println!("============ Block {} ============", HEXLOWER.encode(block.get_hash()));
                println!("Prev. block: {}", HEXLOWER.encode(block.get_pre_block_hash()));
                println!("Height: {}", block.get_height());
                println!("Timestamp: {}", block.get_timestamp());
                println!(
                    "PoW: {}",
                    ProofOfWork::validate(&block, difficulty_bits)
                );

                for tx in block.get_transactions() {
                    println!("- Transaction {}", HEXLOWER.encode(tx.get_id()));
                    if !tx.is_coinbase() {
                        for input in tx.get_vin() {
                            let pub_key_hash = hash_pub_key(input.get_pub_key());
                            println!(
                                "-- Input txid = {}, vout = {}, from = {}",
                                HEXLOWER.encode(input.get_txid()),
                                input.get_vout(),
                                convert_address(pub_key_hash.as_slice()),
                            );
                        }
                    }
                    for output in tx.get_vout() {
                        println!(
                            "-- Output value = {}, to = {}",
                            output.get_value(),
                            convert_address(output.get_pub_key_hash()),
                        );
                    }
                }
                println!();
            }
        }
    }
    Ok(())
}
