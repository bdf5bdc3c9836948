// The append-only chain: sled-backed block records plus a single tip
// pointer. Every operation goes through an explicit Ledger handle; there
// is no process-wide chain state.

use crate::config::GLOBAL_CONFIG;
use crate::core::{Block, TXOutput, Transaction, DIFFICULTY_BITS};
use crate::error::{LedgerError, Result};
use data_encoding::HEXLOWER;
use log::info;
use sled::Db;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

const TIP_BLOCK_HASH_KEY: &str = "tip_block_hash";
const BLOCKS_TREE: &str = "blocks";

const GENESIS_COINBASE_NOTE: &str =
    "The Times 03/Jan/2009 Chancellor on brink of second bailout for banks";

/// Handle on one persistent chain: the in-memory tip mirror, the store,
/// and the difficulty the proof-of-work engine runs at.
#[derive(Clone)]
pub struct Ledger {
    tip_hash: Arc<RwLock<Vec<u8>>>,
    db: Db,
    difficulty_bits: u32,
}

impl Ledger {
    /// Start a new chain at the configured data directory
    pub fn create(genesis_address: &str) -> Result<Ledger> {
        Self::create_with_options(genesis_address, GLOBAL_CONFIG.data_dir(), DIFFICULTY_BITS)
    }

    /// Open the existing chain at the configured data directory
    pub fn open() -> Result<Ledger> {
        Self::open_with_options(GLOBAL_CONFIG.data_dir(), DIFFICULTY_BITS)
    }

    /// Start a new chain: fails with [`LedgerError::ChainAlreadyExists`]
    /// when a tip record is already present, otherwise mines the genesis
    /// block from a coinbase paying `genesis_address`.
    pub fn create_with_options(
        genesis_address: &str,
        db_path: impl AsRef<Path>,
        difficulty_bits: u32,
    ) -> Result<Ledger> {
        let path = db_path.as_ref();
        let db = sled::open(path)
            .map_err(|e| LedgerError::Database(format!("Failed to open database: {e}")))?;
        let blocks_tree = db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| LedgerError::Database(format!("Failed to open blocks tree: {e}")))?;

        if blocks_tree
            .get(TIP_BLOCK_HASH_KEY)
            .map_err(|e| LedgerError::Database(format!("Failed to get tip hash: {e}")))?
            .is_some()
        {
            return Err(LedgerError::ChainAlreadyExists(PathBuf::from(path)));
        }

        info!("creating genesis block for address {genesis_address}");
        let coinbase_tx = Transaction::new_coinbase_tx(genesis_address, GENESIS_COINBASE_NOTE)?;
        let genesis = Block::generate_genesis_block(&coinbase_tx, difficulty_bits)?;

        let ledger = Ledger {
            tip_hash: Arc::new(RwLock::new(vec![])),
            db,
            difficulty_bits,
        };
        ledger.persist_block(&genesis)?;
        Ok(ledger)
    }

    /// Open an existing chain: fails with [`LedgerError::ChainNotFound`]
    /// when no tip record exists.
    pub fn open_with_options(db_path: impl AsRef<Path>, difficulty_bits: u32) -> Result<Ledger> {
        let path = db_path.as_ref();
        let db = sled::open(path)
            .map_err(|e| LedgerError::Database(format!("Failed to open database: {e}")))?;
        let blocks_tree = db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| LedgerError::Database(format!("Failed to open blocks tree: {e}")))?;

        let tip_bytes = blocks_tree
            .get(TIP_BLOCK_HASH_KEY)
            .map_err(|e| LedgerError::Database(format!("Failed to get tip hash: {e}")))?
            .ok_or_else(|| LedgerError::ChainNotFound(PathBuf::from(path)))?;

        Ok(Ledger {
            tip_hash: Arc::new(RwLock::new(tip_bytes.to_vec())),
            db,
            difficulty_bits,
        })
    }

    pub fn get_tip_hash(&self) -> Vec<u8> {
        self.tip_hash
            .read()
            .expect("tip hash lock poisoned")
            .clone()
    }

    fn set_tip_hash(&self, new_tip_hash: &[u8]) {
        let mut tip_hash = self.tip_hash.write().expect("tip hash lock poisoned");
        *tip_hash = new_tip_hash.to_vec();
    }

    pub fn get_difficulty_bits(&self) -> u32 {
        self.difficulty_bits
    }

    /// Verify, assemble, and mine a block of `transactions` on top of the
    /// current tip. The caller supplies the full transaction list,
    /// coinbase included.
    pub fn mine_block(&self, transactions: &[Transaction]) -> Result<Block> {
        for transaction in transactions {
            if !self.verify_transaction(transaction)? {
                return Err(LedgerError::InvalidTransaction(format!(
                    "Signature check failed for transaction {}",
                    HEXLOWER.encode(transaction.get_id())
                )));
            }
        }
        Self::check_block_double_spend(transactions)?;

        let best_height = self.get_best_height()?;
        let block = Block::new_block(
            self.get_tip_hash(),
            transactions,
            best_height + 1,
            self.difficulty_bits,
        )?;

        let advanced = self.persist_block(&block)?;
        info!(
            "mined block {} at height {} (tip advanced: {advanced})",
            HEXLOWER.encode(block.get_hash()),
            block.get_height()
        );
        Ok(block)
    }

    /// Append an externally produced block. Idempotent: a hash that is
    /// already stored is a no-op; the tip only advances when the block's
    /// height exceeds the stored tip's (longest-chain tie-break, no
    /// reorganization).
    pub fn add_block(&self, block: &Block) -> Result<()> {
        let blocks_tree = self
            .db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| LedgerError::Database(format!("Failed to open blocks tree: {e}")))?;

        if blocks_tree
            .get(block.get_hash())
            .map_err(|e| LedgerError::Database(format!("Failed to check block existence: {e}")))?
            .is_some()
        {
            return Ok(());
        }

        self.persist_block(block)?;
        Ok(())
    }

    // Atomically store the block record and, when its height exceeds the
    // stored tip's, move the tip pointer. A missing tip record (fresh
    // chain) always advances. Returns whether the tip moved.
    fn persist_block(&self, block: &Block) -> Result<bool> {
        let blocks_tree = self
            .db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| LedgerError::Database(format!("Failed to open blocks tree: {e}")))?;
        let block_data = block.serialize()?;

        let advanced = blocks_tree
            .transaction(|tx_db| {
                tx_db.insert(block.get_hash(), block_data.as_slice())?;

                let tip_height = match tx_db.get(TIP_BLOCK_HASH_KEY)? {
                    Some(tip_hash) => {
                        let tip_block_bytes = tx_db.get(tip_hash)?.ok_or_else(|| {
                            sled::Error::Io(std::io::Error::new(
                                std::io::ErrorKind::NotFound,
                                "Tip block record not found",
                            ))
                        })?;
                        let tip_block =
                            Block::deserialize(tip_block_bytes.as_ref()).map_err(|_| {
                                sled::Error::Io(std::io::Error::new(
                                    std::io::ErrorKind::InvalidData,
                                    "Failed to deserialize tip block",
                                ))
                            })?;
                        Some(tip_block.get_height())
                    }
                    None => None,
                };

                let advance = match tip_height {
                    Some(height) => block.get_height() > height,
                    None => true,
                };
                if advance {
                    tx_db.insert(TIP_BLOCK_HASH_KEY, block.get_hash())?;
                }
                Ok(advance)
            })
            .map_err(|e: sled::transaction::TransactionError| {
                LedgerError::Database(format!("Failed to persist block: {e}"))
            })?;

        if advanced {
            self.set_tip_hash(block.get_hash());
        }
        Ok(advanced)
    }

    pub fn iterator(&self) -> LedgerIterator {
        LedgerIterator::new(self.get_tip_hash(), self.db.clone())
    }

    /// Backward scan of the whole chain: txid (hex) -> unspent
    /// (output index, output) pairs. A spending transaction always sits at
    /// or after the block defining the output it spends, so the scan
    /// records every spend before reaching the defining transaction.
    pub fn find_utxo(&self) -> HashMap<String, Vec<(usize, TXOutput)>> {
        let mut utxo: HashMap<String, Vec<(usize, TXOutput)>> = HashMap::new();
        let mut spent_txos: HashMap<String, Vec<i64>> = HashMap::new();

        let mut iterator = self.iterator();
        while let Some(block) = iterator.next() {
            for tx in block.get_transactions() {
                let txid_hex = HEXLOWER.encode(tx.get_id());
                for (idx, out) in tx.get_vout().iter().enumerate() {
                    let spent = spent_txos
                        .get(txid_hex.as_str())
                        .map(|outs| outs.contains(&(idx as i64)))
                        .unwrap_or(false);
                    if spent {
                        continue;
                    }
                    utxo.entry(txid_hex.clone())
                        .or_default()
                        .push((idx, out.clone()));
                }

                if tx.is_coinbase() {
                    continue;
                }
                for txin in tx.get_vin() {
                    let spent_txid_hex = HEXLOWER.encode(txin.get_txid());
                    spent_txos
                        .entry(spent_txid_hex)
                        .or_default()
                        .push(txin.get_vout());
                }
            }
        }
        utxo
    }

    /// Linear scan for a transaction by id, newest block first
    pub fn find_transaction(&self, txid: &[u8]) -> Option<Transaction> {
        let mut iterator = self.iterator();
        while let Some(block) = iterator.next() {
            for transaction in block.get_transactions() {
                if txid.eq(transaction.get_id()) {
                    return Some(transaction.clone());
                }
            }
        }
        None
    }

    /// Gather the prior transactions referenced by `tx`'s inputs, keyed by
    /// hex txid. A reference that resolves to nothing is a typed error.
    fn prev_transactions(&self, tx: &Transaction) -> Result<HashMap<String, Transaction>> {
        let mut prev_txs = HashMap::new();
        for vin in tx.get_vin() {
            let prev_tx = self.find_transaction(vin.get_txid()).ok_or_else(|| {
                LedgerError::TransactionNotFound(HEXLOWER.encode(vin.get_txid()))
            })?;
            prev_txs.insert(HEXLOWER.encode(prev_tx.get_id()), prev_tx);
        }
        Ok(prev_txs)
    }

    /// Sign `tx` against the chain's prior transactions
    pub fn sign_transaction(&self, tx: &mut Transaction, pkcs8: &[u8]) -> Result<()> {
        if tx.is_coinbase() {
            return Ok(());
        }
        let prev_txs = self.prev_transactions(tx)?;
        tx.sign(pkcs8, &prev_txs)
    }

    /// Verify `tx`'s signatures against the chain's prior transactions
    pub fn verify_transaction(&self, tx: &Transaction) -> Result<bool> {
        if tx.is_coinbase() {
            return Ok(true);
        }
        let prev_txs = self.prev_transactions(tx)?;
        tx.verify(&prev_txs)
    }

    // Two transactions inside one candidate block must not claim the same
    // prior output.
    fn check_block_double_spend(transactions: &[Transaction]) -> Result<()> {
        let mut claimed: HashSet<(Vec<u8>, i64)> = HashSet::new();

        for transaction in transactions {
            if transaction.is_coinbase() {
                continue;
            }
            for input in transaction.get_vin() {
                let output_ref = (input.get_txid().to_vec(), input.get_vout());
                if !claimed.insert(output_ref) {
                    return Err(LedgerError::InvalidTransaction(format!(
                        "Output {}:{} claimed twice in one block",
                        HEXLOWER.encode(input.get_txid()),
                        input.get_vout()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn get_best_height(&self) -> Result<usize> {
        let tip_block = self
            .get_block(self.get_tip_hash().as_slice())?
            .ok_or_else(|| LedgerError::Database("Tip block record not found".to_string()))?;
        Ok(tip_block.get_height())
    }

    pub fn get_block(&self, block_hash: &[u8]) -> Result<Option<Block>> {
        let blocks_tree = self
            .db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| LedgerError::Database(format!("Failed to open blocks tree: {e}")))?;

        if let Some(block_bytes) = blocks_tree
            .get(block_hash)
            .map_err(|e| LedgerError::Database(format!("Failed to get block: {e}")))?
        {
            let block = Block::deserialize(block_bytes.as_ref())?;
            return Ok(Some(block));
        }
        Ok(None)
    }

    pub fn block_exists(&self, block_hash: &[u8]) -> Result<bool> {
        let blocks_tree = self
            .db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| LedgerError::Database(format!("Failed to open blocks tree: {e}")))?;
        Ok(blocks_tree
            .get(block_hash)
            .map_err(|e| LedgerError::Database(format!("Failed to check block existence: {e}")))?
            .is_some())
    }

    /// Every block hash on the canonical chain, tip first
    pub fn get_block_hashes(&self) -> Vec<Vec<u8>> {
        let mut iterator = self.iterator();
        let mut hashes = vec![];
        while let Some(block) = iterator.next() {
            hashes.push(block.get_hash_bytes());
        }
        hashes
    }
}

/// Cursor walking the chain backwards from the tip. Iteration ends after
/// the block whose previous hash is empty (the genesis block).
pub struct LedgerIterator {
    db: Db,
    current_hash: Vec<u8>,
}

impl LedgerIterator {
    fn new(tip_hash: Vec<u8>, db: Db) -> LedgerIterator {
        LedgerIterator {
            current_hash: tip_hash,
            db,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Block> {
        Iterator::next(self)
    }
}

impl Iterator for LedgerIterator {
    type Item = Block;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_hash.is_empty() {
            return None;
        }
        let blocks_tree = self.db.open_tree(BLOCKS_TREE).ok()?;
        let data = blocks_tree.get(self.current_hash.as_slice()).ok()??;
        let block = Block::deserialize(data.as_ref()).ok()?;
        self.current_hash = block.get_pre_block_hash().to_vec();
        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::test_utils::{create_test_ledger, TEST_DIFFICULTY_BITS};

    #[test]
    fn create_twice_fails() {
        let (ledger, _wallets, addresses, dir) = create_test_ledger(1).unwrap();
        drop(ledger);

        let result = Ledger::create_with_options(
            &addresses[0],
            dir.path().join("chain"),
            TEST_DIFFICULTY_BITS,
        );
        assert!(matches!(result, Err(LedgerError::ChainAlreadyExists(_))));
    }

    #[test]
    fn open_without_chain_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Ledger::open_with_options(dir.path().join("absent"), TEST_DIFFICULTY_BITS);
        assert!(matches!(result, Err(LedgerError::ChainNotFound(_))));
    }

    #[test]
    fn genesis_chain_shape() {
        let (ledger, _wallets, _addresses, _dir) = create_test_ledger(1).unwrap();

        assert_eq!(ledger.get_best_height().unwrap(), 0);
        assert_eq!(ledger.get_block_hashes().len(), 1);

        let mut iterator = ledger.iterator();
        let genesis = iterator.next().unwrap();
        assert!(genesis.is_genesis());
        assert!(iterator.next().is_none());
    }

    #[test]
    fn mining_links_blocks_by_hash() {
        let (ledger, _wallets, addresses, _dir) = create_test_ledger(1).unwrap();

        let coinbase = Transaction::new_coinbase_tx(&addresses[0], "").unwrap();
        let block = ledger.mine_block(&[coinbase]).unwrap();

        assert_eq!(block.get_height(), 1);
        assert_eq!(ledger.get_best_height().unwrap(), 1);

        let parent = ledger.get_block(block.get_pre_block_hash()).unwrap();
        let parent = parent.unwrap();
        assert_eq!(parent.get_height(), block.get_height() - 1);
        assert!(parent.is_genesis());
    }

    #[test]
    fn double_claim_in_one_block_rejected() {
        let (ledger, wallets, addresses, _dir) = create_test_ledger(2).unwrap();
        let utxo_index = crate::storage::UtxoIndex::new(ledger.clone());

        let spend_a =
            Transaction::new_utxo_transaction(&addresses[0], &addresses[1], 3, &utxo_index, &wallets)
                .unwrap();
        let spend_b =
            Transaction::new_utxo_transaction(&addresses[0], &addresses[1], 5, &utxo_index, &wallets)
                .unwrap();

        // both spends select the single genesis output
        let result = ledger.mine_block(&[spend_a, spend_b]);
        assert!(matches!(result, Err(LedgerError::InvalidTransaction(_))));
    }
}
