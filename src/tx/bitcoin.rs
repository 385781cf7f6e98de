//! Bitcoin-family transaction builder
//!
//! Inputs are selected from caller-supplied unspents, one digest is produced
//! per input (BIP143 for P2WPKH, the legacy algorithm for P2PKH), and
//! `build_for_send` serializes the witness or scriptSig for each.

use serde::{Deserialize, Serialize};

use super::{
    amount_units, check_signature_count, fee_units, foreign_payload, to_u64, ChainData, TransactionBuilder,
    UnsignedTransaction,
};
use crate::address::bitcoin::p2pkh_script;
use crate::address::BitcoinAddressProvider;
use crate::error::{BuildError, BuildResult};
use crate::signing::{ecdsa, SignPayload, SignedResult};
use crate::types::{PublicKey, Transaction, TransactionParams};
use crate::utils::chain_config::UtxoNetwork;
use crate::utils::crypto::{compress_secp256k1, double_sha256, hash160};
use crate::log_debug;

const SIGHASH_ALL: u8 = 0x01;

/// A spendable output owned by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unspent {
    /// Transaction id in display (big-endian) hex.
    pub txid: String,
    pub vout: u32,
    pub amount: u64,
    #[serde(with = "crate::types::hex_bytes")]
    pub script: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// P2WPKH, signed with BIP143.
    WitnessKeyHash,
    /// P2PKH, signed with the legacy algorithm.
    KeyHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoInput {
    /// Previous txid in internal (little-endian) byte order.
    pub txid: [u8; 32],
    pub vout: u32,
    pub amount: u64,
    pub script_pubkey: Vec<u8>,
    pub sequence: u32,
    pub kind: InputKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoOutput {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedUtxoTransaction {
    pub version: u32,
    pub inputs: Vec<UtxoInput>,
    pub outputs: Vec<UtxoOutput>,
    pub lock_time: u32,
}

#[derive(Debug, Clone)]
pub struct BitcoinTransactionBuilder {
    addresses: BitcoinAddressProvider,
    public_key: PublicKey,
}

impl BitcoinTransactionBuilder {
    pub fn new(network: UtxoNetwork, public_key: PublicKey) -> Self {
        Self {
            addresses: BitcoinAddressProvider::new(network),
            public_key,
        }
    }

    fn network(&self) -> &UtxoNetwork {
        self.addresses.network()
    }

    /// Key bytes that hash to `script_pubkey`, and how the input is spent.
    fn classify(&self, script_pubkey: &[u8]) -> BuildResult<(InputKind, Vec<u8>)> {
        let compressed = compress_secp256k1(&self.public_key.bytes)?;
        let compressed_hash = hash160(&compressed);

        let mut witness = vec![0x00, 0x14];
        witness.extend_from_slice(&compressed_hash);
        if script_pubkey == witness.as_slice() {
            return Ok((InputKind::WitnessKeyHash, compressed.to_vec()));
        }
        if script_pubkey == p2pkh_script(&compressed_hash).as_slice() {
            return Ok((InputKind::KeyHash, compressed.to_vec()));
        }
        if script_pubkey == p2pkh_script(&hash160(&self.public_key.bytes)).as_slice() {
            return Ok((InputKind::KeyHash, self.public_key.bytes.clone()));
        }
        Err(BuildError::SerializationFailed(format!(
            "unspent script {} is not owned by this wallet",
            hex::encode(script_pubkey)
        )))
    }

    fn build_unsigned(&self, transaction: &Transaction, unspents: &[Unspent]) -> BuildResult<UnsignedUtxoTransaction> {
        let amount = to_u64(amount_units(&transaction.amount)?, "amount")?;
        let fee = to_u64(fee_units(&transaction.fee)?, "fee")?;
        let (sequence, bip69) = match &transaction.params {
            Some(TransactionParams::Bitcoin { sequence, bip69 }) => {
                (sequence.unwrap_or(self.network().default_sequence), *bip69)
            }
            _ => (self.network().default_sequence, false),
        };

        let required = amount
            .checked_add(fee)
            .ok_or_else(|| BuildError::SerializationFailed("amount plus fee overflows".into()))?;
        let mut selected = Vec::new();
        let mut total: u64 = 0;
        for unspent in unspents {
            if total >= required {
                break;
            }
            total = total.saturating_add(unspent.amount);
            selected.push(unspent);
        }
        if total < required {
            return Err(BuildError::InsufficientFunds {
                required: u128::from(required),
                available: u128::from(total),
            });
        }

        let mut inputs = Vec::with_capacity(selected.len());
        for unspent in selected {
            let mut txid: [u8; 32] = hex::decode(&unspent.txid)
                .ok()
                .and_then(|bytes| bytes.try_into().ok())
                .ok_or_else(|| BuildError::SerializationFailed(format!("bad txid {}", unspent.txid)))?;
            txid.reverse();
            let (kind, _) = self.classify(&unspent.script)?;
            inputs.push(UtxoInput {
                txid,
                vout: unspent.vout,
                amount: unspent.amount,
                script_pubkey: unspent.script.clone(),
                sequence,
                kind,
            });
        }

        let mut outputs = vec![UtxoOutput {
            value: amount,
            script_pubkey: self.addresses.script_pubkey(&transaction.destination_address)?,
        }];
        let change = total - required;
        if change > 0 {
            let change_address = if transaction.change_address.is_empty() {
                &transaction.source_address
            } else {
                &transaction.change_address
            };
            outputs.push(UtxoOutput {
                value: change,
                script_pubkey: self.addresses.script_pubkey(change_address)?,
            });
        }

        if bip69 {
            // Display-order txid, then vout.
            inputs.sort_by(|a, b| {
                a.txid
                    .iter()
                    .rev()
                    .cmp(b.txid.iter().rev())
                    .then(a.vout.cmp(&b.vout))
            });
            outputs.sort_by(|a, b| a.value.cmp(&b.value).then_with(|| a.script_pubkey.cmp(&b.script_pubkey)));
        }

        Ok(UnsignedUtxoTransaction {
            version: self.network().tx_version,
            inputs,
            outputs,
            lock_time: 0,
        })
    }

    fn sighash(&self, tx: &UnsignedUtxoTransaction, index: usize) -> BuildResult<[u8; 32]> {
        let input = &tx.inputs[index];
        match input.kind {
            InputKind::WitnessKeyHash => {
                let key_hash = &input.script_pubkey[2..];
                Ok(segwit_sighash(tx, index, &p2pkh_script(key_hash)))
            }
            InputKind::KeyHash => Ok(legacy_sighash(tx, index)),
        }
    }
}

impl TransactionBuilder for BitcoinTransactionBuilder {
    fn build_for_sign(&self, transaction: &Transaction, chain_data: &ChainData) -> BuildResult<SignPayload> {
        let ChainData::Utxo(unspents) = chain_data else {
            return Err(BuildError::MissingRequiredParam("unspent outputs"));
        };
        let unsigned = self.build_unsigned(transaction, unspents)?;
        let hashes = (0..unsigned.inputs.len())
            .map(|index| self.sighash(&unsigned, index).map(|hash| hash.to_vec()))
            .collect::<BuildResult<Vec<_>>>()?;

        log_debug!(
            "tx::bitcoin",
            "built unsigned transaction",
            inputs = unsigned.inputs.len(),
            outputs = unsigned.outputs.len()
        );
        Ok(SignPayload::Hashes {
            hashes,
            unsigned: UnsignedTransaction::Bitcoin(unsigned),
        })
    }

    fn build_for_send(&self, payload: &SignPayload, signatures: &[Vec<u8>]) -> BuildResult<SignedResult> {
        let UnsignedTransaction::Bitcoin(tx) = payload.unsigned() else {
            return Err(foreign_payload());
        };
        check_signature_count(payload, signatures)?;

        let has_witness = tx.inputs.iter().any(|input| input.kind == InputKind::WitnessKeyHash);
        let mut raw = Vec::new();
        raw.extend_from_slice(&tx.version.to_le_bytes());
        if has_witness {
            raw.push(0x00); // marker
            raw.push(0x01); // flag
        }

        let mut witnesses = Vec::new();
        write_var_int(tx.inputs.len() as u64, &mut raw);
        for (input, signature) in tx.inputs.iter().zip(signatures) {
            let mut sig = ecdsa::der_encode(signature)?;
            sig.push(SIGHASH_ALL);
            let (_, key) = self.classify(&input.script_pubkey)?;

            raw.extend_from_slice(&input.txid);
            raw.extend_from_slice(&input.vout.to_le_bytes());
            match input.kind {
                InputKind::WitnessKeyHash => {
                    raw.push(0x00);
                    witnesses.push(vec![sig, key]);
                }
                InputKind::KeyHash => {
                    let mut script_sig = Vec::new();
                    push_data(&sig, &mut script_sig);
                    push_data(&key, &mut script_sig);
                    write_var_int(script_sig.len() as u64, &mut raw);
                    raw.extend_from_slice(&script_sig);
                    witnesses.push(Vec::new());
                }
            }
            raw.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_outputs(&tx.outputs, &mut raw);

        if has_witness {
            for items in &witnesses {
                write_var_int(items.len() as u64, &mut raw);
                for item in items {
                    write_var_int(item.len() as u64, &mut raw);
                    raw.extend_from_slice(item);
                }
            }
        }
        raw.extend_from_slice(&tx.lock_time.to_le_bytes());
        Ok(SignedResult::Raw(raw))
    }
}

/// BIP143 digest for input `index` with the given script code.
fn segwit_sighash(tx: &UnsignedUtxoTransaction, index: usize, script_code: &[u8]) -> [u8; 32] {
    let mut prevouts = Vec::new();
    let mut sequences = Vec::new();
    for input in &tx.inputs {
        prevouts.extend_from_slice(&input.txid);
        prevouts.extend_from_slice(&input.vout.to_le_bytes());
        sequences.extend_from_slice(&input.sequence.to_le_bytes());
    }
    let mut outputs = Vec::new();
    write_outputs_body(&tx.outputs, &mut outputs);

    let input = &tx.inputs[index];
    let mut preimage = Vec::new();
    preimage.extend_from_slice(&tx.version.to_le_bytes());
    preimage.extend_from_slice(&double_sha256(&prevouts));
    preimage.extend_from_slice(&double_sha256(&sequences));
    preimage.extend_from_slice(&input.txid);
    preimage.extend_from_slice(&input.vout.to_le_bytes());
    write_var_int(script_code.len() as u64, &mut preimage);
    preimage.extend_from_slice(script_code);
    preimage.extend_from_slice(&input.amount.to_le_bytes());
    preimage.extend_from_slice(&input.sequence.to_le_bytes());
    preimage.extend_from_slice(&double_sha256(&outputs));
    preimage.extend_from_slice(&tx.lock_time.to_le_bytes());
    preimage.extend_from_slice(&u32::from(SIGHASH_ALL).to_le_bytes());
    double_sha256(&preimage)
}

/// Pre-segwit digest: the signed input carries its previous output script,
/// every other input an empty script.
fn legacy_sighash(tx: &UnsignedUtxoTransaction, index: usize) -> [u8; 32] {
    let mut preimage = Vec::new();
    preimage.extend_from_slice(&tx.version.to_le_bytes());
    write_var_int(tx.inputs.len() as u64, &mut preimage);
    for (i, input) in tx.inputs.iter().enumerate() {
        preimage.extend_from_slice(&input.txid);
        preimage.extend_from_slice(&input.vout.to_le_bytes());
        if i == index {
            write_var_int(input.script_pubkey.len() as u64, &mut preimage);
            preimage.extend_from_slice(&input.script_pubkey);
        } else {
            preimage.push(0x00);
        }
        preimage.extend_from_slice(&input.sequence.to_le_bytes());
    }
    write_outputs(&tx.outputs, &mut preimage);
    preimage.extend_from_slice(&tx.lock_time.to_le_bytes());
    preimage.extend_from_slice(&u32::from(SIGHASH_ALL).to_le_bytes());
    double_sha256(&preimage)
}

fn write_outputs(outputs: &[UtxoOutput], buf: &mut Vec<u8>) {
    write_var_int(outputs.len() as u64, buf);
    write_outputs_body(outputs, buf);
}

fn write_outputs_body(outputs: &[UtxoOutput], buf: &mut Vec<u8>) {
    for output in outputs {
        buf.extend_from_slice(&output.value.to_le_bytes());
        write_var_int(output.script_pubkey.len() as u64, buf);
        buf.extend_from_slice(&output.script_pubkey);
    }
}

fn push_data(data: &[u8], script: &mut Vec<u8>) {
    // Signatures and keys are always below OP_PUSHDATA1.
    script.push(data.len() as u8);
    script.extend_from_slice(data);
}

fn write_var_int(value: u64, buf: &mut Vec<u8>) {
    if value < 0xfd {
        buf.push(value as u8);
    } else if value <= 0xffff {
        buf.push(0xfd);
        buf.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        buf.push(0xfe);
        buf.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        buf.push(0xff);
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::Fee;
    use crate::types::{Amount, Blockchain};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const WALLET_KEY: &str = "046DB397495FA03FE263EE4021B77C49496E5C7DB8266E6E33A03D5B3A370C3D6D744A863B14DE2457D82BEE322416523E336530760C4533AEE980F4A4CDB9A98D";
    const SOURCE: &str = "bc1qxzdqcmh6pknevm2ugtw94y50dwhsu3l0p5tg63";
    const DESTINATION: &str = "bc1q67dmfccnax59247kshfkxcq6qr53wmwqfa4s28cupktj2amf5jus2j6qvt";

    fn builder() -> BitcoinTransactionBuilder {
        BitcoinTransactionBuilder::new(UtxoNetwork::bitcoin(), PublicKey::secp256k1(hex::decode(WALLET_KEY).unwrap()))
    }

    fn unspent(txid: &str, vout: u32, amount: u64) -> Unspent {
        Unspent {
            txid: txid.into(),
            vout,
            amount,
            script: hex::decode("0014309a0c6efa0da7966d5c42dc5a928f6baf0e47ef").unwrap(),
        }
    }

    fn transaction(amount: &str, fee: &str) -> Transaction {
        Transaction::new(
            Amount::coin(Blockchain::Bitcoin, Decimal::from_str(amount).unwrap()),
            Fee::new(Amount::coin(Blockchain::Bitcoin, Decimal::from_str(fee).unwrap())),
            SOURCE,
            DESTINATION,
        )
    }

    #[test]
    fn test_insufficient_funds_is_rejected() {
        let data = ChainData::Utxo(vec![unspent(
            "cffea3f46c73d61c6ed1296494b3c85e9f498629a32d67367a0d9e1bafdd05df",
            1,
            1_000,
        )]);
        let err = builder().build_for_sign(&transaction("0.0001", "0.00000001"), &data).unwrap_err();
        assert_eq!(err, BuildError::InsufficientFunds { required: 10_001, available: 1_000 });
    }

    #[test]
    fn test_exact_spend_has_no_change_output() {
        let data = ChainData::Utxo(vec![unspent(
            "cffea3f46c73d61c6ed1296494b3c85e9f498629a32d67367a0d9e1bafdd05df",
            1,
            10_500,
        )]);
        let payload = builder().build_for_sign(&transaction("0.0001", "0.000005"), &data).unwrap();
        let UnsignedTransaction::Bitcoin(tx) = payload.unsigned() else {
            panic!("wrong payload");
        };
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.inputs[0].sequence, 0xFFFF_FFFE);
    }

    #[test]
    fn test_foreign_script_rejected() {
        let mut foreign = unspent("cffea3f46c73d61c6ed1296494b3c85e9f498629a32d67367a0d9e1bafdd05df", 1, 50_000);
        foreign.script = hex::decode("0014000000000000000000000000000000000000dead").unwrap();
        let err = builder()
            .build_for_sign(&transaction("0.0001", "0.00000001"), &ChainData::Utxo(vec![foreign]))
            .unwrap_err();
        assert!(matches!(err, BuildError::SerializationFailed(_)));
    }

    #[test]
    fn test_signature_count_checked() {
        let data = ChainData::Utxo(vec![unspent(
            "cffea3f46c73d61c6ed1296494b3c85e9f498629a32d67367a0d9e1bafdd05df",
            1,
            50_000,
        )]);
        let builder = builder();
        let payload = builder.build_for_sign(&transaction("0.0001", "0.00000001"), &data).unwrap();
        assert_eq!(
            builder.build_for_send(&payload, &[]).unwrap_err(),
            BuildError::SignatureCountMismatch { expected: 1, actual: 0 }
        );
    }

    #[test]
    fn test_var_int_encoding() {
        let mut buf = Vec::new();
        write_var_int(0xfc, &mut buf);
        write_var_int(0xfd, &mut buf);
        assert_eq!(buf, vec![0xfc, 0xfd, 0xfd, 0x00]);
    }
}
