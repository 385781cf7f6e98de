//! Tron transaction builder
//!
//! `Transaction.raw` is a protobuf message carrying either a
//! `TransferContract` (TRX) or a `TriggerSmartContract` with TRC-20
//! `transfer` data (tokens). The digest is SHA-256 of the serialized raw
//! message; the signed form appends `r || s || v`.

use serde::{Deserialize, Serialize};

use super::ethereum::erc20_transfer_data;
use super::{
    amount_units, check_signature_count, foreign_payload, to_i64, ChainData, TransactionBuilder,
    UnsignedTransaction,
};
use crate::address::TronAddressProvider;
use crate::codec::protobuf::ProtoWriter;
use crate::error::{BuildError, BuildResult};
use crate::signing::{ecdsa, SignPayload, SignedResult};
use crate::types::{PublicKey, Transaction};
use crate::utils::chain_config::TronConfig;
use crate::utils::crypto::sha256;

const TRANSFER_CONTRACT: u64 = 1;
const TRIGGER_SMART_CONTRACT: u64 = 31;
const TRANSFER_CONTRACT_URL: &str = "type.googleapis.com/protocol.TransferContract";
const TRIGGER_SMART_CONTRACT_URL: &str = "type.googleapis.com/protocol.TriggerSmartContract";

/// Header of the block used as the transaction's reference block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TronBlockHeader {
    pub number: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    #[serde(with = "crate::types::hex_bytes")]
    pub tx_trie_root: Vec<u8>,
    #[serde(with = "crate::types::hex_bytes")]
    pub parent_hash: Vec<u8>,
    #[serde(with = "crate::types::hex_bytes")]
    pub witness_address: Vec<u8>,
    pub version: u32,
}

impl TronBlockHeader {
    /// Serialized `BlockHeader.raw`.
    fn raw(&self) -> Vec<u8> {
        ProtoWriter::new()
            .uint64(1, self.timestamp)
            .bytes(2, &self.tx_trie_root)
            .bytes(3, &self.parent_hash)
            .uint64(7, self.number)
            .bytes(9, &self.witness_address)
            .uint64(10, u64::from(self.version))
            .finish()
    }

    /// Bytes 8..16 of the block id.
    fn ref_block_hash(&self) -> Vec<u8> {
        sha256(&self.raw())[8..16].to_vec()
    }

    fn ref_block_bytes(&self) -> Vec<u8> {
        self.number.to_be_bytes()[6..8].to_vec()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTronTransaction {
    /// Serialized `Transaction.raw`.
    pub raw: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct TronTransactionBuilder {
    config: TronConfig,
    public_key: PublicKey,
}

impl TronTransactionBuilder {
    pub fn new(config: TronConfig, public_key: PublicKey) -> Self {
        Self { config, public_key }
    }

    /// Contract type, Any type URL, serialized parameter, fee limit.
    fn contract(&self, transaction: &Transaction) -> BuildResult<(u64, &'static str, Vec<u8>, u64)> {
        let owner = TronAddressProvider::decode(&transaction.source_address)?;
        let destination = TronAddressProvider::decode(&transaction.destination_address)?;
        let units = amount_units(&transaction.amount)?;

        match transaction.amount.token_info() {
            None => {
                let parameter = ProtoWriter::new()
                    .bytes(1, &owner)
                    .bytes(2, &destination)
                    .int64(3, to_i64(units, "amount")?)
                    .finish();
                Ok((TRANSFER_CONTRACT, TRANSFER_CONTRACT_URL, parameter, 0))
            }
            Some(token) => {
                let contract = TronAddressProvider::decode(&token.contract_address)?;
                let mut recipient = [0u8; 20];
                recipient.copy_from_slice(&destination[1..]);
                let parameter = ProtoWriter::new()
                    .bytes(1, &owner)
                    .bytes(2, &contract)
                    .bytes(4, &erc20_transfer_data(&recipient, units))
                    .finish();
                Ok((
                    TRIGGER_SMART_CONTRACT,
                    TRIGGER_SMART_CONTRACT_URL,
                    parameter,
                    self.config.contract_fee_limit,
                ))
            }
        }
    }

    fn build_raw(&self, transaction: &Transaction, block: &TronBlockHeader) -> BuildResult<Vec<u8>> {
        let (contract_type, type_url, parameter, fee_limit) = self.contract(transaction)?;
        let any = ProtoWriter::new()
            .string(1, type_url)
            .bytes(2, &parameter)
            .finish();
        let contract = ProtoWriter::new()
            .uint64(1, contract_type)
            .message(2, &any)
            .finish();
        let expiration = block.timestamp.saturating_add(self.config.expiration_millis);

        Ok(ProtoWriter::new()
            .bytes(1, &block.ref_block_bytes())
            .bytes(4, &block.ref_block_hash())
            .uint64(8, expiration)
            .message(11, &contract)
            .uint64(14, block.timestamp)
            .uint64(18, fee_limit)
            .finish())
    }
}

impl TransactionBuilder for TronTransactionBuilder {
    fn build_for_sign(&self, transaction: &Transaction, chain_data: &ChainData) -> BuildResult<SignPayload> {
        let ChainData::Tron(block) = chain_data else {
            return Err(BuildError::MissingRequiredParam("reference block header"));
        };
        let raw = self.build_raw(transaction, block)?;
        Ok(SignPayload::Envelope {
            digest: sha256(&raw).to_vec(),
            bytes: raw.clone(),
            unsigned: UnsignedTransaction::Tron(UnsignedTronTransaction { raw }),
        })
    }

    fn build_for_send(&self, payload: &SignPayload, signatures: &[Vec<u8>]) -> BuildResult<SignedResult> {
        let UnsignedTransaction::Tron(tx) = payload.unsigned() else {
            return Err(foreign_payload());
        };
        check_signature_count(payload, signatures)?;
        let (compact, recovery_id) =
            ecdsa::recoverable(&signatures[0], &sha256(&tx.raw), &self.public_key.bytes)?;

        let mut signature = compact.to_vec();
        signature.push(recovery_id + 27);
        Ok(SignedResult::Raw(
            ProtoWriter::new()
                .message(1, &tx.raw)
                .bytes(2, &signature)
                .finish(),
        ))
    }
}
