//! Merkle summary of a block's transactions
//!
//! The ordered transaction serializations are folded into one digest:
//! adjacent leaves are paired left-to-right (the last leaf is duplicated
//! when the count is odd) and each parent is the SHA-256 of the
//! concatenated pair, level by level until a single root remains.

use crate::error::{LedgerError, Result};
use crate::utils::sha256_digest;

/// Fold an ordered, non-empty list of leaves into a single root digest.
///
/// A lone leaf hashes directly to `sha256(leaf)`; any one-byte change in
/// any leaf changes the root.
pub fn merkle_root(leaves: &[Vec<u8>]) -> Result<Vec<u8>> {
    if leaves.is_empty() {
        return Err(LedgerError::InvalidBlock(
            "Cannot summarize an empty transaction list".to_string(),
        ));
    }

    if leaves.len() == 1 {
        return Ok(sha256_digest(leaves[0].as_slice()));
    }

    let mut level: Vec<Vec<u8>> = leaves.to_vec();
    while level.len() > 1 {
        let mut next_level = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            next_level.push(hash_pair(left, right));
        }
        level = next_level;
    }

    level
        .into_iter()
        .next()
        .ok_or_else(|| LedgerError::InvalidBlock("Merkle fold produced no root".to_string()))
}

fn hash_pair(left: &[u8], right: &[u8]) -> Vec<u8> {
    let mut combined = Vec::with_capacity(left.len() + right.len());
    combined.extend_from_slice(left);
    combined.extend_from_slice(right);
    sha256_digest(combined.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|i| vec![i as u8; 8]).collect()
    }

    #[test]
    fn empty_list_is_an_error() {
        assert!(merkle_root(&[]).is_err());
    }

    #[test]
    fn single_leaf_hashes_directly() {
        let leaf = vec![7u8; 16];
        let root = merkle_root(std::slice::from_ref(&leaf)).unwrap();
        assert_eq!(root, sha256_digest(&leaf));
    }

    #[test]
    fn two_leaves_hash_as_one_pair() {
        let items = leaves(2);
        let root = merkle_root(&items).unwrap();

        let mut combined = items[0].clone();
        combined.extend_from_slice(&items[1]);
        assert_eq!(root, sha256_digest(&combined));
    }

    #[test]
    fn odd_count_duplicates_the_last_leaf() {
        let three = leaves(3);
        let mut four = three.clone();
        four.push(three[2].clone());

        assert_eq!(merkle_root(&three).unwrap(), merkle_root(&four).unwrap());
    }

    #[test]
    fn deterministic() {
        let items = leaves(5);
        assert_eq!(merkle_root(&items).unwrap(), merkle_root(&items).unwrap());
    }

    #[test]
    fn one_byte_mutation_changes_the_root() {
        let items = leaves(6);
        let root = merkle_root(&items).unwrap();

        for idx in 0..items.len() {
            let mut mutated = items.clone();
            mutated[idx][3] ^= 0x01;
            assert_ne!(
                root,
                merkle_root(&mutated).unwrap(),
                "mutating leaf {idx} left the root unchanged"
            );
        }
    }

    #[test]
    fn root_is_thirty_two_bytes() {
        for n in 1..=9 {
            assert_eq!(merkle_root(&leaves(n)).unwrap().len(), 32);
        }
    }
}
