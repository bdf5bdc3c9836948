use crate::config::GLOBAL_CONFIG;
use crate::error::{LedgerError, Result};
use crate::utils::{deserialize, serialize};
use crate::wallet::Wallet;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::PathBuf;

/// Address -> wallet map persisted to a single bincode file.
pub struct Wallets {
    wallets: HashMap<String, Wallet>,
    path: PathBuf,
}

impl Wallets {
    /// Load the wallet file from the configured location (empty set if absent)
    pub fn new() -> Result<Wallets> {
        Self::with_path(GLOBAL_CONFIG.wallet_file())
    }

    /// Load a wallet file from an explicit location (empty set if absent)
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Wallets> {
        let mut wallets = Wallets {
            wallets: HashMap::new(),
            path: path.into(),
        };
        wallets.load_from_file()?;
        Ok(wallets)
    }

    /// Generate a key pair, register it, and persist the file
    pub fn create_wallet(&mut self) -> Result<String> {
        let wallet = Wallet::new()?;
        let address = wallet.get_address();
        self.wallets.insert(address.clone(), wallet);
        self.save_to_file()?;
        Ok(address)
    }

    pub fn get_addresses(&self) -> Vec<String> {
        self.wallets.keys().cloned().collect()
    }

    pub fn get_wallet(&self, address: &str) -> Option<&Wallet> {
        self.wallets.get(address)
    }

    fn load_from_file(&mut self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        let mut file = File::open(&self.path)
            .map_err(|e| LedgerError::Wallet(format!("Failed to open wallet file: {e}")))?;
        let metadata = file
            .metadata()
            .map_err(|e| LedgerError::Wallet(format!("Failed to stat wallet file: {e}")))?;
        let mut buf = vec![0; metadata.len() as usize];
        file.read_exact(&mut buf)
            .map_err(|e| LedgerError::Wallet(format!("Failed to read wallet file: {e}")))?;
        self.wallets = deserialize(&buf[..])?;
        Ok(())
    }

    fn save_to_file(&self) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| LedgerError::Wallet(format!("Failed to open wallet file: {e}")))?;
        let mut writer = BufWriter::new(file);
        let wallets_bytes = serialize(&self.wallets)?;
        writer
            .write_all(wallets_bytes.as_slice())
            .map_err(|e| LedgerError::Wallet(format!("Failed to write wallet file: {e}")))?;
        writer
            .flush()
            .map_err(|e| LedgerError::Wallet(format!("Failed to flush wallet file: {e}")))?;
        Ok(())
    }
}
