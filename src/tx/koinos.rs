//! Koinos transaction builder
//!
//! A KOIN transfer is a single `call_contract` operation. The header binds
//! the chain id, mana limit, nonce and operation merkle root; its SHA-256
//! is both the signing digest and (multihash-prefixed) the transaction id.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;

use super::{
    amount_units, check_signature_count, fee_units, foreign_payload, to_u64, ChainData, TransactionBuilder,
    UnsignedTransaction,
};
use crate::address::KoinosAddressProvider;
use crate::codec::protobuf::ProtoWriter;
use crate::error::{BuildError, BuildResult};
use crate::signing::{ecdsa, SignPayload, SignedResult};
use crate::types::{PublicKey, Transaction};
use crate::utils::chain_config::KoinosConfig;
use crate::utils::crypto::sha256;

/// Multihash prefix for a 32-byte SHA-256 digest.
const SHA256_MULTIHASH: [u8; 2] = [0x12, 0x20];
const RECOVERY_ID_OFFSET: u8 = 31;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedKoinosTransaction {
    pub header: Vec<u8>,
    pub operation: Vec<u8>,
}

impl UnsignedKoinosTransaction {
    pub fn digest(&self) -> [u8; 32] {
        sha256(&self.header)
    }

    pub fn id(&self) -> Vec<u8> {
        multihash(&self.digest())
    }
}

fn multihash(digest: &[u8; 32]) -> Vec<u8> {
    let mut out = SHA256_MULTIHASH.to_vec();
    out.extend_from_slice(digest);
    out
}

#[derive(Debug, Clone)]
pub struct KoinosTransactionBuilder {
    config: KoinosConfig,
    testnet: bool,
    public_key: PublicKey,
}

impl KoinosTransactionBuilder {
    pub fn new(config: KoinosConfig, testnet: bool, public_key: PublicKey) -> Self {
        Self {
            config,
            testnet,
            public_key,
        }
    }

    fn koin_contract(&self) -> &str {
        if self.testnet {
            &self.config.testnet_koin_contract
        } else {
            &self.config.mainnet_koin_contract
        }
    }

    fn chain_id(&self) -> BuildResult<Vec<u8>> {
        let encoded = if self.testnet {
            &self.config.testnet_chain_id
        } else {
            &self.config.mainnet_chain_id
        };
        URL_SAFE
            .decode(encoded)
            .map_err(|e| BuildError::SerializationFailed(format!("chain id: {e}")))
    }

    fn build_unsigned(&self, transaction: &Transaction, nonce: u64) -> BuildResult<UnsignedKoinosTransaction> {
        let from = KoinosAddressProvider::decode(&transaction.source_address)?;
        let to = KoinosAddressProvider::decode(&transaction.destination_address)?;
        let contract = KoinosAddressProvider::decode(self.koin_contract())?;
        let value = to_u64(amount_units(&transaction.amount)?, "amount")?;
        let rc_limit = to_u64(fee_units(&transaction.fee)?, "mana limit")?;

        let transfer_args = ProtoWriter::new()
            .bytes(1, &from)
            .bytes(2, &to)
            .uint64(3, value)
            .finish();
        let call_contract = ProtoWriter::new()
            .bytes(1, &contract)
            .uint64(2, u64::from(self.config.transfer_entry_point))
            .bytes(3, &transfer_args)
            .finish();
        let operation = ProtoWriter::new().message(2, &call_contract).finish();

        // value_type { uint64_value = 5 }
        let nonce = ProtoWriter::new().uint64(5, nonce).finish();
        // One operation: the merkle root is that operation's hash.
        let merkle_root = multihash(&sha256(&operation));

        let header = ProtoWriter::new()
            .bytes(1, &self.chain_id()?)
            .uint64(2, rc_limit)
            .bytes(3, &nonce)
            .bytes(4, &merkle_root)
            .bytes(5, &from)
            .finish();

        Ok(UnsignedKoinosTransaction { header, operation })
    }
}

impl TransactionBuilder for KoinosTransactionBuilder {
    fn build_for_sign(&self, transaction: &Transaction, chain_data: &ChainData) -> BuildResult<SignPayload> {
        let ChainData::Account { nonce } = chain_data else {
            return Err(BuildError::MissingRequiredParam("nonce"));
        };
        let unsigned = self.build_unsigned(transaction, *nonce)?;
        Ok(SignPayload::Envelope {
            bytes: unsigned.header.clone(),
            digest: unsigned.digest().to_vec(),
            unsigned: UnsignedTransaction::Koinos(unsigned),
        })
    }

    fn build_for_send(&self, payload: &SignPayload, signatures: &[Vec<u8>]) -> BuildResult<SignedResult> {
        let UnsignedTransaction::Koinos(tx) = payload.unsigned() else {
            return Err(foreign_payload());
        };
        check_signature_count(payload, signatures)?;
        let (compact, recovery_id) = ecdsa::recoverable(&signatures[0], &tx.digest(), &self.public_key.bytes)?;

        let mut signature = vec![recovery_id + RECOVERY_ID_OFFSET];
        signature.extend_from_slice(&compact);
        Ok(SignedResult::Raw(
            ProtoWriter::new()
                .bytes(1, &tx.id())
                .message(2, &tx.header)
                .message(3, &tx.operation)
                .bytes(4, &signature)
                .finish(),
        ))
    }
}
