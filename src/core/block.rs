use crate::core::{ProofOfWork, Transaction};
use crate::error::{LedgerError, Result};
use crate::utils::{current_timestamp, deserialize, serialize};
use log::info;
use serde::{Deserialize, Serialize};

/// Immutable record of one chain entry. An empty `pre_block_hash` marks
/// the genesis block; `hash` is the proof-of-work digest over the block's
/// contents and is filled in during mining.
#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Block {
    timestamp: i64,
    pre_block_hash: Vec<u8>,
    hash: Vec<u8>,
    transactions: Vec<Transaction>,
    nonce: i64,
    height: usize,
}

impl Block {
    /// Assemble and mine a block. The nonce and hash come out of the
    /// proof-of-work engine; everything else is fixed up front.
    pub fn new_block(
        pre_block_hash: Vec<u8>,
        transactions: &[Transaction],
        height: usize,
        difficulty_bits: u32,
    ) -> Result<Block> {
        if transactions.is_empty() {
            return Err(LedgerError::InvalidBlock(
                "Block must contain at least one transaction".to_string(),
            ));
        }
        // height == 0 <=> empty previous hash
        if (height == 0) != pre_block_hash.is_empty() {
            return Err(LedgerError::InvalidBlock(
                "Only the genesis block may have an empty previous hash".to_string(),
            ));
        }

        let mut block = Block {
            timestamp: current_timestamp()?,
            pre_block_hash,
            hash: vec![],
            transactions: transactions.to_vec(),
            nonce: 0,
            height,
        };

        let pow = ProofOfWork::new_proof_of_work(block.clone(), difficulty_bits)?;
        let (nonce, hash) = pow.run()?;
        block.nonce = nonce;
        block.hash = hash;
        info!(
            "mined block at height {height} with {} transaction(s)",
            block.transactions.len()
        );

        Ok(block)
    }

    pub fn generate_genesis_block(transaction: &Transaction, difficulty_bits: u32) -> Result<Block> {
        Block::new_block(vec![], &[transaction.clone()], 0, difficulty_bits)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        deserialize::<Block>(bytes)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    /// The ordered transaction serializations the Merkle summary folds
    pub fn transaction_payloads(&self) -> Result<Vec<Vec<u8>>> {
        self.transactions.iter().map(|tx| tx.serialize()).collect()
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_pre_block_hash(&self) -> &[u8] {
        self.pre_block_hash.as_slice()
    }

    pub fn get_hash(&self) -> &[u8] {
        self.hash.as_slice()
    }

    pub fn get_hash_bytes(&self) -> Vec<u8> {
        self.hash.clone()
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_height(&self) -> usize {
        self.height
    }

    pub fn get_nonce(&self) -> i64 {
        self.nonce
    }

    pub fn is_genesis(&self) -> bool {
        self.pre_block_hash.is_empty()
    }
}
