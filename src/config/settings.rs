use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::RwLock;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

static DEFAULT_DATA_DIR: &str = "data";
static DEFAULT_WALLET_FILE: &str = "wallet.dat";

const DATA_DIR_KEY: &str = "DATA_DIR";
const WALLET_FILE_KEY: &str = "WALLET_FILE";

const DATA_DIR_ENV: &str = "LEDGER_DATA_DIR";
const WALLET_FILE_ENV: &str = "LEDGER_WALLET_FILE";

pub struct Config {
    inner: RwLock<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Config {
        let mut map = HashMap::new();
        map.insert(
            String::from(DATA_DIR_KEY),
            env::var(DATA_DIR_ENV).unwrap_or_else(|_| String::from(DEFAULT_DATA_DIR)),
        );
        map.insert(
            String::from(WALLET_FILE_KEY),
            env::var(WALLET_FILE_ENV).unwrap_or_else(|_| String::from(DEFAULT_WALLET_FILE)),
        );

        Config {
            inner: RwLock::new(map),
        }
    }

    /// Directory holding the sled chain database
    pub fn data_dir(&self) -> PathBuf {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config");
        PathBuf::from(
            inner
                .get(DATA_DIR_KEY)
                .expect("Data dir should always be present in config"),
        )
    }

    /// Location of the persisted wallet file
    pub fn wallet_file(&self) -> PathBuf {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config");
        PathBuf::from(
            inner
                .get(WALLET_FILE_KEY)
                .expect("Wallet file should always be present in config"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_present() {
        let config = Config::new();
        assert!(!config.data_dir().as_os_str().is_empty());
        assert!(!config.wallet_file().as_os_str().is_empty());
    }
}
