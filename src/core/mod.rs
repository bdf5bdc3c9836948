//! Core ledger functionality
//!
//! Blocks, transactions, the Merkle summary, proof-of-work consensus,
//! and the persistent chain itself.

pub mod block;
pub mod ledger;
pub mod merkle;
pub mod proof_of_work;
pub mod transaction;

pub use block::Block;
pub use ledger::{Ledger, LedgerIterator};
pub use merkle::merkle_root;
pub use proof_of_work::{ProofOfWork, DIFFICULTY_BITS};
pub use transaction::{TXInput, TXOutput, Transaction, SUBSIDY};
