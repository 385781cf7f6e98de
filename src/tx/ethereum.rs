//! EVM transaction builder
//!
//! Legacy (EIP-155) or EIP-1559 transactions, chosen by the fee parameters.
//! Token amounts become an ERC-20 `transfer` call on the token contract.

use super::{
    amount_units, check_signature_count, foreign_payload, ChainData, TransactionBuilder, UnsignedTransaction,
};
use crate::address::EthereumAddressProvider;
use crate::codec::rlp;
use crate::error::{BuildError, BuildResult};
use crate::fees::FeeParameters;
use crate::signing::{ecdsa, SignPayload, SignedResult};
use crate::types::{PublicKey, Transaction, TransactionParams};
use crate::utils::crypto::keccak256;

/// `transfer(address,uint256)`
const ERC20_TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
const EIP1559_TX_TYPE: u8 = 0x02;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvmFee {
    Legacy { gas_price: u128 },
    Eip1559 { max_fee: u128, priority_fee: u128 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedEvmTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_limit: u128,
    pub fee: EvmFee,
    pub to: [u8; 20],
    pub value: u128,
    pub data: Vec<u8>,
}

impl UnsignedEvmTransaction {
    fn fields(&self) -> Vec<Vec<u8>> {
        match self.fee {
            EvmFee::Legacy { gas_price } => vec![
                rlp::encode_u64(self.nonce),
                rlp::encode_u128(gas_price),
                rlp::encode_u128(self.gas_limit),
                rlp::encode_bytes(&self.to),
                rlp::encode_u128(self.value),
                rlp::encode_bytes(&self.data),
            ],
            EvmFee::Eip1559 { max_fee, priority_fee } => vec![
                rlp::encode_u64(self.chain_id),
                rlp::encode_u64(self.nonce),
                rlp::encode_u128(priority_fee),
                rlp::encode_u128(max_fee),
                rlp::encode_u128(self.gas_limit),
                rlp::encode_bytes(&self.to),
                rlp::encode_u128(self.value),
                rlp::encode_bytes(&self.data),
                // empty access list
                rlp::encode_list(&[]),
            ],
        }
    }

    /// Keccak256 of the signing pre-image.
    pub fn signing_hash(&self) -> [u8; 32] {
        let mut fields = self.fields();
        match self.fee {
            EvmFee::Legacy { .. } => {
                // EIP-155: chain id, 0, 0
                fields.push(rlp::encode_u64(self.chain_id));
                fields.push(rlp::encode_u64(0));
                fields.push(rlp::encode_u64(0));
                keccak256(&rlp::encode_list(&fields))
            }
            EvmFee::Eip1559 { .. } => {
                let mut preimage = vec![EIP1559_TX_TYPE];
                preimage.extend(rlp::encode_list(&fields));
                keccak256(&preimage)
            }
        }
    }

    /// Signed encoding for an `r || s` signature and its recovery id.
    pub fn encode_signed(&self, signature: &[u8; 64], recovery_id: u8) -> Vec<u8> {
        let mut fields = self.fields();
        let v = match self.fee {
            EvmFee::Legacy { .. } => self.chain_id * 2 + 35 + u64::from(recovery_id),
            EvmFee::Eip1559 { .. } => u64::from(recovery_id),
        };
        fields.push(rlp::encode_u64(v));
        fields.push(rlp::encode_uint_bytes(&signature[..32]));
        fields.push(rlp::encode_uint_bytes(&signature[32..]));

        match self.fee {
            EvmFee::Legacy { .. } => rlp::encode_list(&fields),
            EvmFee::Eip1559 { .. } => {
                let mut raw = vec![EIP1559_TX_TYPE];
                raw.extend(rlp::encode_list(&fields));
                raw
            }
        }
    }
}

/// ABI-encoded `transfer(to, amount)` call data.
pub fn erc20_transfer_data(to: &[u8; 20], amount: u128) -> Vec<u8> {
    let mut data = ERC20_TRANSFER_SELECTOR.to_vec();
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(to);
    data.extend_from_slice(&[0u8; 16]);
    data.extend_from_slice(&amount.to_be_bytes());
    data
}

#[derive(Debug, Clone)]
pub struct EthereumTransactionBuilder {
    chain_id: u64,
    public_key: PublicKey,
}

impl EthereumTransactionBuilder {
    pub fn new(chain_id: u64, public_key: PublicKey) -> Self {
        Self { chain_id, public_key }
    }

    fn build_unsigned(&self, transaction: &Transaction, nonce: u64) -> BuildResult<UnsignedEvmTransaction> {
        let parameters = transaction
            .fee
            .parameters
            .as_ref()
            .ok_or(BuildError::MissingRequiredParam("gas parameters"))?;
        let (gas_limit, fee) = match parameters {
            FeeParameters::Legacy { limit, price } => (*limit, EvmFee::Legacy { gas_price: *price }),
            FeeParameters::PriorityBased {
                limit,
                max_fee,
                priority_fee,
            } => (
                *limit,
                EvmFee::Eip1559 {
                    max_fee: *max_fee,
                    priority_fee: *priority_fee,
                },
            ),
            FeeParameters::ResourceBased { .. } => {
                return Err(BuildError::MissingRequiredParam("gas parameters"));
            }
        };

        let units = amount_units(&transaction.amount)?;
        let destination = EthereumAddressProvider::parse(&transaction.destination_address)?;
        let (to, value, data) = match transaction.amount.token_info() {
            Some(token) => (
                EthereumAddressProvider::parse(&token.contract_address)?,
                0,
                erc20_transfer_data(&destination, units),
            ),
            None => {
                let data = match &transaction.params {
                    Some(TransactionParams::Ethereum { data }) => data.clone(),
                    _ => Vec::new(),
                };
                (destination, units, data)
            }
        };

        Ok(UnsignedEvmTransaction {
            chain_id: self.chain_id,
            nonce,
            gas_limit,
            fee,
            to,
            value,
            data,
        })
    }
}

impl TransactionBuilder for EthereumTransactionBuilder {
    fn build_for_sign(&self, transaction: &Transaction, chain_data: &ChainData) -> BuildResult<SignPayload> {
        let ChainData::Account { nonce } = chain_data else {
            return Err(BuildError::MissingRequiredParam("nonce"));
        };
        let unsigned = self.build_unsigned(transaction, *nonce)?;
        Ok(SignPayload::Hash {
            hash: unsigned.signing_hash().to_vec(),
            unsigned: UnsignedTransaction::Ethereum(unsigned),
        })
    }

    fn build_for_send(&self, payload: &SignPayload, signatures: &[Vec<u8>]) -> BuildResult<SignedResult> {
        let UnsignedTransaction::Ethereum(tx) = payload.unsigned() else {
            return Err(foreign_payload());
        };
        check_signature_count(payload, signatures)?;
        let (signature, recovery_id) =
            ecdsa::recoverable(&signatures[0], &tx.signing_hash(), &self.public_key.bytes)?;
        Ok(SignedResult::Raw(tx.encode_signed(&signature, recovery_id)))
    }
}
