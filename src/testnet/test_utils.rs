//! Shared fixtures for ledger unit tests

use crate::core::Ledger;
use crate::error::{LedgerError, Result};
use crate::wallet::Wallets;
use tempfile::TempDir;

/// Low difficulty so test mining finishes in a few hundred hashes
pub const TEST_DIFFICULTY_BITS: u32 = 8;

/// A fresh chain in a temporary directory: `wallet_count` wallets are
/// created alongside it and the first address receives the genesis
/// reward. The `TempDir` keeps the storage alive for the test's duration.
pub fn create_test_ledger(wallet_count: usize) -> Result<(Ledger, Wallets, Vec<String>, TempDir)> {
    let dir = tempfile::tempdir().map_err(|e| LedgerError::Io(e.to_string()))?;

    let mut wallets = Wallets::with_path(dir.path().join("wallet.dat"))?;
    let mut addresses = Vec::with_capacity(wallet_count);
    for _ in 0..wallet_count {
        addresses.push(wallets.create_wallet()?);
    }

    let ledger =
        Ledger::create_with_options(&addresses[0], dir.path().join("chain"), TEST_DIFFICULTY_BITS)?;

    Ok((ledger, wallets, addresses, dir))
}
