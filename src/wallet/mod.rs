//! Wallet key management and the address codec
//!
//! The ledger core never generates or stores keys; this module is the
//! key provider and Base58Check address codec it collaborates with.

#[allow(clippy::module_inception)]
pub mod wallet;
pub mod wallets;

pub use wallet::{
    address_to_pub_key_hash, convert_address, hash_pub_key, validate_address, Wallet,
    ADDRESS_CHECKSUM_LEN,
};
pub use wallets::Wallets;
