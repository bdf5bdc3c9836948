//! Configuration management
//!
//! Environment-seeded settings for the ledger: where the chain database
//! lives and where the wallet file is kept.

pub mod settings;

pub use settings::{Config, GLOBAL_CONFIG};
