use crate::core::{Block, Ledger, TXOutput};
use data_encoding::HEXLOWER;
use std::collections::HashMap;
use std::sync::RwLock;

/// Derived view of unspent outputs: txid (hex) -> (output index, output)
/// pairs. Backed by an in-memory cache that is rebuilt from a full
/// backward scan of the chain; the chain itself stays the source of truth.
pub struct UtxoIndex {
    ledger: Ledger,
    cache: RwLock<HashMap<String, Vec<(usize, TXOutput)>>>,
}

impl UtxoIndex {
    pub fn new(ledger: Ledger) -> UtxoIndex {
        UtxoIndex {
            ledger,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Rebuild the cache from a full chain scan
    pub fn reindex(&self) {
        let rebuilt = self.ledger.find_utxo();
        let mut cache = self.cache.write().expect("utxo cache lock poisoned");
        *cache = rebuilt;
    }

    /// Apply one freshly appended block to the cache. Must be called
    /// exactly once per append; a never-built cache falls back to a full
    /// rebuild (which already includes the block).
    pub fn update(&self, block: &Block) {
        let mut cache = self.cache.write().expect("utxo cache lock poisoned");
        if cache.is_empty() {
            *cache = self.ledger.find_utxo();
            return;
        }

        for tx in block.get_transactions() {
            if !tx.is_coinbase() {
                for vin in tx.get_vin() {
                    let spent_txid_hex = HEXLOWER.encode(vin.get_txid());
                    let now_empty = match cache.get_mut(spent_txid_hex.as_str()) {
                        Some(outputs) => {
                            outputs.retain(|(idx, _)| *idx as i64 != vin.get_vout());
                            outputs.is_empty()
                        }
                        None => false,
                    };
                    if now_empty {
                        cache.remove(spent_txid_hex.as_str());
                    }
                }
            }

            let txid_hex = HEXLOWER.encode(tx.get_id());
            let outputs = tx
                .get_vout()
                .iter()
                .cloned()
                .enumerate()
                .collect::<Vec<_>>();
            cache.insert(txid_hex, outputs);
        }
    }

    // Current unspent view, rebuilding the cache on first use.
    fn snapshot(&self) -> HashMap<String, Vec<(usize, TXOutput)>> {
        {
            let cache = self.cache.read().expect("utxo cache lock poisoned");
            if !cache.is_empty() {
                return cache.clone();
            }
        }
        let rebuilt = self.ledger.find_utxo();
        let mut cache = self.cache.write().expect("utxo cache lock poisoned");
        *cache = rebuilt.clone();
        rebuilt
    }

    /// All unspent outputs locked with `pub_key_hash`
    pub fn find_unspent_outputs(&self, pub_key_hash: &[u8]) -> Vec<TXOutput> {
        let mut utxos = vec![];
        for outputs in self.snapshot().values() {
            for (_, out) in outputs {
                if out.is_locked_with_key(pub_key_hash) {
                    utxos.push(out.clone());
                }
            }
        }
        utxos
    }

    /// First-fit coin selection: accumulate matching outputs until the
    /// target is reached. An accumulated value below `amount` means
    /// insufficient funds and the caller must reject before building
    /// inputs.
    pub fn find_spendable_outputs(
        &self,
        pub_key_hash: &[u8],
        amount: u64,
    ) -> (u64, HashMap<String, Vec<usize>>) {
        let mut spendable: HashMap<String, Vec<usize>> = HashMap::new();
        let mut accumulated = 0;

        'outer: for (txid_hex, outputs) in self.snapshot() {
            for (idx, out) in outputs {
                if !out.is_locked_with_key(pub_key_hash) {
                    continue;
                }
                accumulated += out.get_value();
                spendable.entry(txid_hex.clone()).or_default().push(idx);
                if accumulated >= amount {
                    break 'outer;
                }
            }
        }

        (accumulated, spendable)
    }

    /// Number of transactions currently holding unspent outputs
    pub fn count_transactions(&self) -> usize {
        self.snapshot().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Transaction, SUBSIDY};
    use crate::testnet::test_utils::create_test_ledger;
    use crate::wallet::{address_to_pub_key_hash, hash_pub_key};

    #[test]
    fn genesis_only_chain_holds_one_output() {
        let (ledger, _wallets, addresses, _dir) = create_test_ledger(1).unwrap();
        let utxo_index = UtxoIndex::new(ledger);

        let pub_key_hash = address_to_pub_key_hash(&addresses[0]).unwrap();
        let utxos = utxo_index.find_unspent_outputs(&pub_key_hash);
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].get_value(), SUBSIDY);
        assert_eq!(utxo_index.count_transactions(), 1);
    }

    #[test]
    fn overdrawn_selection_under_accumulates() {
        let (ledger, _wallets, addresses, _dir) = create_test_ledger(1).unwrap();
        let utxo_index = UtxoIndex::new(ledger);

        let pub_key_hash = address_to_pub_key_hash(&addresses[0]).unwrap();
        let (accumulated, _) = utxo_index.find_spendable_outputs(&pub_key_hash, SUBSIDY * 5);
        assert!(accumulated < SUBSIDY * 5);
        assert_eq!(accumulated, SUBSIDY);
    }

    #[test]
    fn selection_stops_at_the_target() {
        let (ledger, _wallets, addresses, _dir) = create_test_ledger(1).unwrap();

        // two more coinbase rewards for the same address
        for _ in 0..2 {
            let coinbase = Transaction::new_coinbase_tx(&addresses[0], "").unwrap();
            ledger.mine_block(&[coinbase]).unwrap();
        }

        let utxo_index = UtxoIndex::new(ledger);
        let pub_key_hash = address_to_pub_key_hash(&addresses[0]).unwrap();
        let (accumulated, spendable) = utxo_index.find_spendable_outputs(&pub_key_hash, SUBSIDY);

        assert!(accumulated >= SUBSIDY);
        assert!(accumulated < SUBSIDY * 3);
        let selected: usize = spendable.values().map(|outs| outs.len()).sum();
        assert_eq!(selected, 1);
    }

    #[test]
    fn update_matches_reindex() {
        let (ledger, wallets, addresses, _dir) = create_test_ledger(2).unwrap();
        let utxo_index = UtxoIndex::new(ledger.clone());
        utxo_index.reindex();

        let spend = Transaction::new_utxo_transaction(
            &addresses[0],
            &addresses[1],
            4,
            &utxo_index,
            &wallets,
        )
        .unwrap();
        let coinbase = Transaction::new_coinbase_tx(&addresses[0], "").unwrap();
        let block = ledger.mine_block(&[coinbase, spend]).unwrap();
        utxo_index.update(&block);

        let incremental = utxo_index.snapshot();

        let fresh_index = UtxoIndex::new(ledger);
        fresh_index.reindex();
        let rebuilt = fresh_index.snapshot();

        assert_eq!(incremental.len(), rebuilt.len());
        for (txid_hex, outputs) in &rebuilt {
            let other = incremental.get(txid_hex).unwrap();
            assert_eq!(outputs.len(), other.len());
        }

        // the recipient now holds the payment
        let recipient_hash = hash_pub_key(
            wallets
                .get_wallet(&addresses[1])
                .unwrap()
                .get_public_key(),
        );
        let received = utxo_index.find_unspent_outputs(&recipient_hash);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].get_value(), 4);
    }
}
