//! Error handling for the ledger
//!
//! Every fallible operation in the library returns [`Result`]; termination
//! on error is reserved for the binary boundary.

use std::fmt;
use std::path::PathBuf;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error taxonomy for ledger operations
#[derive(Debug, Clone)]
pub enum LedgerError {
    /// Storage engine errors
    Database(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// Cryptographic operation errors
    Crypto(String),
    /// File I/O errors
    Io(String),
    /// Wallet operation errors
    Wallet(String),
    /// Invalid address format
    InvalidAddress(String),
    /// Block validation errors
    InvalidBlock(String),
    /// Transaction validation errors
    InvalidTransaction(String),
    /// A referenced prior transaction is not on the chain (txid in hex)
    TransactionNotFound(String),
    /// Insufficient funds for a spend
    InsufficientFunds { required: u64, available: u64 },
    /// A chain already exists where `create` was asked to start one
    ChainAlreadyExists(PathBuf),
    /// No chain exists where `open` was asked to load one
    ChainNotFound(PathBuf),
    /// The nonce space was exhausted without finding a valid digest
    NonceSpaceExhausted,
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Database(msg) => write!(f, "Database error: {msg}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
            LedgerError::Wallet(msg) => write!(f, "Wallet error: {msg}"),
            LedgerError::InvalidAddress(addr) => write!(f, "Invalid address: {addr}"),
            LedgerError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            LedgerError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {msg}"),
            LedgerError::TransactionNotFound(txid) => {
                write!(f, "Transaction not found: {txid}")
            }
            LedgerError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            LedgerError::ChainAlreadyExists(path) => {
                write!(f, "Chain already exists at {}", path.display())
            }
            LedgerError::ChainNotFound(path) => {
                write!(
                    f,
                    "No existing chain found at {}. Create one first.",
                    path.display()
                )
            }
            LedgerError::NonceSpaceExhausted => {
                write!(f, "Nonce space exhausted without a valid digest")
            }
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<sled::Error> for LedgerError {
    fn from(err: sled::Error) -> Self {
        LedgerError::Database(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for LedgerError {
    fn from(err: bincode::error::EncodeError) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for LedgerError {
    fn from(err: bincode::error::DecodeError) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}
