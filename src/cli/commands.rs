use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ember-ledger", about = "Minimal single-node UTXO ledger")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        name = "createblockchain",
        about = "Create a new chain and mine its genesis block"
    )]
    CreateBlockchain {
        #[arg(help = "The address receiving the genesis block reward")]
        address: String,
    },
    #[command(name = "createwallet", about = "Create a new wallet")]
    CreateWallet,
    #[command(name = "listaddresses", about = "Print local wallet addresses")]
    ListAddresses,
    #[command(name = "getbalance", about = "Get the balance of an address")]
    GetBalance {
        #[arg(help = "The wallet address")]
        address: String,
    },
    #[command(
        name = "send",
        about = "Transfer value and mine the containing block"
    )]
    Send {
        #[arg(help = "Source wallet address")]
        from: String,
        #[arg(help = "Destination wallet address")]
        to: String,
        #[arg(help = "Amount to send")]
        amount: u64,
    },
    #[command(name = "printchain", about = "Print all blocks from tip to genesis")]
    PrintChain,
}
