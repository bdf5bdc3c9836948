//! # Ember Ledger
//!
//! A minimal single-node ledger: an append-only chain of blocks bundling
//! value-transfer transactions validated against an unspent-output (UTXO)
//! model, secured by SHA-256 proof-of-work and ECDSA P-256 signatures.
//!
//! ## Layout
//! - `core/`: blocks, transactions, the Merkle summary, proof-of-work,
//!   and the persistent chain (`Ledger`)
//! - `storage/`: the derived UTXO index
//! - `wallet/`: key pairs, the Base58Check address codec, wallet file
//! - `config/`: environment-seeded settings (data dir, wallet file)
//! - `utils/`: digests, signatures, encoding, bincode wrappers
//! - `cli/`: command definitions for the binary
//!
//! Blocks persist in a sled tree keyed by block hash next to a single
//! reserved tip-pointer key; everything else (UTXO state, best height) is
//! re-derived from block records. Library code returns typed errors and
//! never terminates the process.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{Config, GLOBAL_CONFIG};
pub use core::{
    merkle_root, Block, Ledger, LedgerIterator, ProofOfWork, TXInput, TXOutput, Transaction,
    DIFFICULTY_BITS, SUBSIDY,
};
pub use error::{LedgerError, Result};
pub use storage::UtxoIndex;
pub use utils::{base58_decode, base58_encode, current_timestamp, sha256_digest};
pub use wallet::{
    address_to_pub_key_hash, convert_address, hash_pub_key, validate_address, Wallet, Wallets,
    ADDRESS_CHECKSUM_LEN,
};
