use crate::core::{merkle, Block};
use crate::error::{LedgerError, Result};
use crate::utils::sha256_digest;
use data_encoding::HEXLOWER;
use log::debug;
use num_bigint::{BigInt, Sign};
use std::ops::ShlAssign;

/// Default difficulty: a block digest must fall strictly below
/// 2^(256 - DIFFICULTY_BITS) interpreted as a big-endian integer.
pub const DIFFICULTY_BITS: u32 = 24;

const MAX_NONCE: i64 = i64::MAX;

pub struct ProofOfWork {
    block: Block,
    merkle_root: Vec<u8>,
    target: BigInt,
    difficulty_bits: u32,
}

impl ProofOfWork {
    /// The Merkle root is folded once here; the nonce loop only re-hashes
    /// the assembled preimage.
    pub fn new_proof_of_work(block: Block, difficulty_bits: u32) -> Result<ProofOfWork> {
        let merkle_root = merkle::merkle_root(&block.transaction_payloads()?)?;
        let mut target = BigInt::from(1);
        target.shl_assign(256 - difficulty_bits);
        Ok(ProofOfWork {
            block,
            merkle_root,
            target,
            difficulty_bits,
        })
    }

    /// Re-check a block against the target using its stored nonce
    pub fn validate(block: &Block, difficulty_bits: u32) -> bool {
        let pow = match ProofOfWork::new_proof_of_work(block.clone(), difficulty_bits) {
            Ok(pow) => pow,
            Err(_) => return false,
        };
        let digest = sha256_digest(pow.prepare_data(block.get_nonce()).as_slice());
        let digest_int = BigInt::from_bytes_be(Sign::Plus, digest.as_slice());
        digest_int < pow.target
    }

    // previousHash || merkleRoot || timestamp || difficultyBits || nonce
    fn prepare_data(&self, nonce: i64) -> Vec<u8> {
        let mut data_bytes = vec![];
        data_bytes.extend(self.block.get_pre_block_hash());
        data_bytes.extend(self.merkle_root.as_slice());
        data_bytes.extend(self.block.get_timestamp().to_be_bytes());
        data_bytes.extend(self.difficulty_bits.to_be_bytes());
        data_bytes.extend(nonce.to_be_bytes());
        data_bytes
    }

    /// Search the nonce space for the first digest below the target.
    ///
    /// Exhausting the space is a configuration fault surfaced as
    /// [`LedgerError::NonceSpaceExhausted`], not an abort.
    pub fn run(&self) -> Result<(i64, Vec<u8>)> {
        let mut nonce = 0;
        while nonce < MAX_NONCE {
            let digest = sha256_digest(self.prepare_data(nonce).as_slice());
            let digest_int = BigInt::from_bytes_be(Sign::Plus, digest.as_slice());
            if digest_int < self.target {
                debug!(
                    "proof-of-work solved at nonce {}: {}",
                    nonce,
                    HEXLOWER.encode(digest.as_slice())
                );
                return Ok((nonce, digest));
            }
            nonce += 1;
        }
        Err(LedgerError::NonceSpaceExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;
    use crate::wallet::Wallet;

    const TEST_BITS: u32 = 8;

    fn mined_block() -> Block {
        let address = Wallet::new().unwrap().get_address();
        let coinbase_tx = Transaction::new_coinbase_tx(&address, "pow test").unwrap();
        Block::new_block(vec![], &[coinbase_tx], 0, TEST_BITS).unwrap()
    }

    #[test]
    fn mined_block_validates() {
        let block = mined_block();
        assert!(ProofOfWork::validate(&block, TEST_BITS));
    }

    #[test]
    fn digest_falls_below_target() {
        let block = mined_block();
        let mut target = BigInt::from(1);
        target.shl_assign(256 - TEST_BITS);
        let digest_int = BigInt::from_bytes_be(Sign::Plus, block.get_hash());
        assert!(digest_int < target);
    }

    #[test]
    fn rerunning_the_engine_reproduces_the_solution() {
        let block = mined_block();
        let pow = ProofOfWork::new_proof_of_work(block.clone(), TEST_BITS).unwrap();
        let (nonce, digest) = pow.run().unwrap();
        assert_eq!(nonce, block.get_nonce());
        assert_eq!(digest, block.get_hash());
    }

    #[test]
    fn higher_difficulty_means_smaller_target() {
        let block = mined_block();
        let easy = ProofOfWork::new_proof_of_work(block.clone(), 4).unwrap();
        let hard = ProofOfWork::new_proof_of_work(block, 16).unwrap();
        assert!(hard.target < easy.target);
    }
}
