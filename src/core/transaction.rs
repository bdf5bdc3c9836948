// Value transfer under the UTXO model: a transaction consumes prior
// outputs through its inputs and locks new outputs to recipients. The
// canonical id is the SHA-256 of the serialized transaction with the id
// field cleared.

use crate::error::{LedgerError, Result};
use crate::storage::UtxoIndex;
use crate::utils::{
    deserialize, ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify, serialize,
    sha256_digest,
};
use crate::wallet::{address_to_pub_key_hash, hash_pub_key, validate_address, Wallets};
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Fixed reward minted by every coinbase transaction
pub const SUBSIDY: u64 = 10;

/// Output index claimed by the coinbase input, which spends nothing
const COINBASE_VOUT: i64 = -1;

/// A claim on one output of a prior transaction. `signature` and
/// `pub_key` stay empty until signing; the coinbase input carries its
/// note payload in `pub_key` instead of a key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TXInput {
    txid: Vec<u8>,
    vout: i64,
    signature: Vec<u8>,
    pub_key: Vec<u8>,
}

impl TXInput {
    pub fn new(txid: &[u8], vout: i64) -> TXInput {
        TXInput {
            txid: txid.to_vec(),
            vout,
            signature: vec![],
            pub_key: vec![],
        }
    }

    pub fn get_txid(&self) -> &[u8] {
        self.txid.as_slice()
    }

    pub fn get_vout(&self) -> i64 {
        self.vout
    }

    pub fn get_signature(&self) -> &[u8] {
        self.signature.as_slice()
    }

    pub fn get_pub_key(&self) -> &[u8] {
        self.pub_key.as_slice()
    }
}

/// An amount locked to one public-key hash. Lock equality is
/// byte-for-byte.
#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TXOutput {
    value: u64,
    pub_key_hash: Vec<u8>,
}

impl TXOutput {
    pub fn new(value: u64, address: &str) -> Result<TXOutput> {
        if value == 0 {
            return Err(LedgerError::InvalidTransaction(
                "Output value must be positive".to_string(),
            ));
        }

        let mut output = TXOutput {
            value,
            pub_key_hash: vec![],
        };
        output.lock(address)?;
        Ok(output)
    }

    pub fn get_value(&self) -> u64 {
        self.value
    }

    pub fn get_pub_key_hash(&self) -> &[u8] {
        self.pub_key_hash.as_slice()
    }

    fn lock(&mut self, address: &str) -> Result<()> {
        self.pub_key_hash = address_to_pub_key_hash(address)?;
        Ok(())
    }

    pub fn is_locked_with_key(&self, pub_key_hash: &[u8]) -> bool {
        self.pub_key_hash.eq(pub_key_hash)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Transaction {
    id: Vec<u8>,
    vin: Vec<TXInput>,
    vout: Vec<TXOutput>,
}

impl Transaction {
    /// Mint the block reward to `to`. The single input claims no prior
    /// output; an empty note defaults to a unique reward message so two
    /// coinbases never share an id.
    pub fn new_coinbase_tx(to: &str, note: &str) -> Result<Transaction> {
        let note = if note.is_empty() {
            format!("Reward to '{to}' {}", Uuid::new_v4())
        } else {
            note.to_string()
        };

        let tx_input = TXInput {
            txid: vec![],
            vout: COINBASE_VOUT,
            signature: vec![],
            pub_key: note.into_bytes(),
        };
        let tx_output = TXOutput::new(SUBSIDY, to)?;

        let mut tx = Transaction {
            id: vec![],
            vin: vec![tx_input],
            vout: vec![tx_output],
        };
        tx.id = tx.hash()?;
        Ok(tx)
    }

    /// Build and sign a spend of `amount` from `from` to `to`, selecting
    /// prior outputs through the UTXO index and paying change back to the
    /// sender when the selection overshoots.
    pub fn new_utxo_transaction(
        from: &str,
        to: &str,
        amount: u64,
        utxo_index: &UtxoIndex,
        wallets: &Wallets,
    ) -> Result<Transaction> {
        if amount == 0 {
            return Err(LedgerError::InvalidTransaction(
                "Amount must be positive".to_string(),
            ));
        }
        if !validate_address(from) {
            return Err(LedgerError::InvalidAddress(format!(
                "Invalid sender address: {from}"
            )));
        }
        if !validate_address(to) {
            return Err(LedgerError::InvalidAddress(format!(
                "Invalid recipient address: {to}"
            )));
        }

        let wallet = wallets
            .get_wallet(from)
            .ok_or_else(|| LedgerError::Wallet(format!("Wallet not found for address: {from}")))?;
        let pub_key_hash = hash_pub_key(wallet.get_public_key());

        let (accumulated, valid_outputs) =
            utxo_index.find_spendable_outputs(pub_key_hash.as_slice(), amount);
        if accumulated < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: accumulated,
            });
        }

        let mut inputs = vec![];
        for (txid_hex, out_indices) in valid_outputs {
            let txid = HEXLOWER.decode(txid_hex.as_bytes()).map_err(|e| {
                LedgerError::InvalidTransaction(format!("Invalid transaction id: {e}"))
            })?;
            for out_idx in out_indices {
                inputs.push(TXInput {
                    txid: txid.clone(),
                    vout: out_idx as i64,
                    signature: vec![],
                    pub_key: wallet.get_public_key().to_vec(),
                });
            }
        }

        let mut outputs = vec![TXOutput::new(amount, to)?];
        if accumulated > amount {
            outputs.push(TXOutput::new(accumulated - amount, from)?);
        }

        let mut tx = Transaction {
            id: vec![],
            vin: inputs,
            vout: outputs,
        };
        tx.id = tx.hash()?;

        utxo_index
            .get_ledger()
            .sign_transaction(&mut tx, wallet.get_pkcs8())?;
        Ok(tx)
    }

    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].txid.is_empty() && self.vin[0].vout == COINBASE_VOUT
    }

    // Inputs with signature and pub_key cleared, outputs intact.
    fn trimmed_copy(&self) -> Transaction {
        let inputs = self
            .vin
            .iter()
            .map(|input| TXInput::new(input.get_txid(), input.get_vout()))
            .collect();
        Transaction {
            id: self.id.clone(),
            vin: inputs,
            vout: self.vout.clone(),
        }
    }

    /// Digest binding input `idx` to the prior output it claims and to the
    /// full output set. Built on a fresh trimmed copy each time; nothing in
    /// `self` is touched.
    fn signing_digest(
        &self,
        idx: usize,
        prev_txs: &HashMap<String, Transaction>,
    ) -> Result<Vec<u8>> {
        let vin = &self.vin[idx];
        let txid_hex = HEXLOWER.encode(vin.get_txid());
        let prev_tx = prev_txs
            .get(txid_hex.as_str())
            .ok_or_else(|| LedgerError::TransactionNotFound(txid_hex.clone()))?;

        let out_idx = usize::try_from(vin.get_vout()).map_err(|_| {
            LedgerError::InvalidTransaction(
                "Spend input claims the coinbase output index".to_string(),
            )
        })?;
        let prev_out = prev_tx.vout.get(out_idx).ok_or_else(|| {
            LedgerError::InvalidTransaction(format!(
                "Referenced output {out_idx} of {txid_hex} does not exist"
            ))
        })?;

        let mut tx_copy = self.trimmed_copy();
        tx_copy.vin[idx].pub_key = prev_out.pub_key_hash.clone();
        tx_copy.id = vec![];
        tx_copy.hash()
    }

    /// Sign every input against the prior transactions it references.
    /// No-op for coinbase.
    pub fn sign(&mut self, pkcs8: &[u8], prev_txs: &HashMap<String, Transaction>) -> Result<()> {
        if self.is_coinbase() {
            return Ok(());
        }

        for idx in 0..self.vin.len() {
            let digest = self.signing_digest(idx, prev_txs)?;
            self.vin[idx].signature = ecdsa_p256_sha256_sign_digest(pkcs8, digest.as_slice())?;
        }
        Ok(())
    }

    /// Check every input's signature against the digest it was bound to.
    /// Coinbase verifies trivially; a missing referenced transaction is a
    /// typed error, not a verification failure.
    pub fn verify(&self, prev_txs: &HashMap<String, Transaction>) -> Result<bool> {
        if self.is_coinbase() {
            return Ok(true);
        }

        for (idx, vin) in self.vin.iter().enumerate() {
            let digest = self.signing_digest(idx, prev_txs)?;
            if !ecdsa_p256_sha256_sign_verify(
                vin.pub_key.as_slice(),
                vin.signature.as_slice(),
                digest.as_slice(),
            ) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // sha256 over the serialized transaction with the id cleared
    fn hash(&self) -> Result<Vec<u8>> {
        let tx_copy = Transaction {
            id: vec![],
            vin: self.vin.clone(),
            vout: self.vout.clone(),
        };
        Ok(sha256_digest(tx_copy.serialize()?.as_slice()))
    }

    pub fn get_id(&self) -> &[u8] {
        self.id.as_slice()
    }

    pub fn get_id_bytes(&self) -> Vec<u8> {
        self.id.clone()
    }

    pub fn get_vin(&self) -> &[TXInput] {
        self.vin.as_slice()
    }

    pub fn get_vout(&self) -> &[TXOutput] {
        self.vout.as_slice()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        deserialize(bytes)
    }
}
