//! Chia transaction builder
//!
//! Every unspent coin of the wallet is spent. The first coin's solution
//! creates the destination and change coins; the others carry a remark so
//! that each spend still has a signed message. Each spend is signed with
//! the BLS augmented scheme (AGG_SIG_ME) and the signatures are aggregated
//! into one spend bundle.

use serde::{Deserialize, Serialize};

use super::{
    amount_units, check_signature_count, fee_units, foreign_payload, ChainData, TransactionBuilder,
    UnsignedTransaction,
};
use crate::address::chia::{standard_puzzle, BLS_PUBLIC_KEY_LEN};
use crate::address::ChiaAddressProvider;
use crate::codec::clvm::{encode_int, Program};
use crate::error::{AddressError, BuildError, BuildResult};
use crate::signing::{SignPayload, SignedResult};
use crate::types::{PublicKey, Transaction};
use crate::utils::chain_config::ChiaConfig;
use crate::utils::crypto::sha256;

const CREATE_COIN: u128 = 51;
const REMARK: u128 = 1;
const BLS_SIGNATURE_LEN: usize = 96;

/// An unspent coin as reported by a full node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChiaCoin {
    pub amount: u64,
    /// `0x`-prefixed hex.
    pub parent_coin_info: String,
    /// `0x`-prefixed hex.
    pub puzzle_hash: String,
}

impl ChiaCoin {
    /// `sha256(parent || puzzle_hash || amount)` with the amount as a CLVM integer.
    pub fn id(&self) -> BuildResult<[u8; 32]> {
        let mut preimage = decode_hash(&self.parent_coin_info)?.to_vec();
        preimage.extend_from_slice(&decode_hash(&self.puzzle_hash)?);
        preimage.extend(encode_int(u128::from(self.amount)));
        Ok(sha256(&preimage))
    }
}

fn decode_hash(value: &str) -> BuildResult<[u8; 32]> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(stripped)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| BuildError::SerializationFailed(format!("bad coin hash {value}")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinSpend {
    pub coin: ChiaCoin,
    /// Serialized puzzle, hex.
    pub puzzle_reveal: String,
    /// Serialized solution, hex.
    pub solution: String,
}

/// Broadcast form accepted by `push_tx`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendBundle {
    pub aggregated_signature: String,
    pub coin_spends: Vec<CoinSpend>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedSpendBundle {
    pub coin_spends: Vec<CoinSpend>,
}

#[derive(Debug, Clone)]
pub struct ChiaTransactionBuilder {
    addresses: ChiaAddressProvider,
    genesis_challenge: String,
    public_key: PublicKey,
}

impl ChiaTransactionBuilder {
    pub fn new(config: &ChiaConfig, testnet: bool, public_key: PublicKey) -> Self {
        let genesis_challenge = if testnet {
            config.testnet_genesis_challenge.clone()
        } else {
            config.mainnet_genesis_challenge.clone()
        };
        Self {
            addresses: ChiaAddressProvider::new(testnet),
            genesis_challenge,
            public_key,
        }
    }

    fn create_coin(puzzle_hash: &[u8; 32], amount: u128) -> Program {
        Program::list([
            Program::int(CREATE_COIN),
            Program::atom(puzzle_hash.to_vec()),
            Program::int(amount),
        ])
    }

    fn build_spends(&self, transaction: &Transaction, coins: &[ChiaCoin]) -> BuildResult<Vec<(CoinSpend, Program)>> {
        let amount = amount_units(&transaction.amount)?;
        let fee = fee_units(&transaction.fee)?;
        let required = amount.saturating_add(fee);
        let available = coins
            .iter()
            .fold(0u128, |acc, coin| acc.saturating_add(u128::from(coin.amount)));
        if coins.is_empty() || available < required {
            return Err(BuildError::InsufficientFunds { required, available });
        }
        let change = available - required;

        let destination = self.addresses.decode_puzzle_hash(&transaction.destination_address)?;
        let mut primary = vec![Self::create_coin(&destination, amount)];
        if change > 0 {
            let change_hash = self.addresses.decode_puzzle_hash(&transaction.change_address)?;
            primary.push(Self::create_coin(&change_hash, change));
        }

        let puzzle = hex::encode(standard_puzzle(&self.public_key.bytes)?);
        let mut spends = Vec::with_capacity(coins.len());
        for (index, coin) in coins.iter().enumerate() {
            let conditions = if index == 0 {
                Program::list(primary.clone())
            } else {
                Program::list([Program::list([Program::int(REMARK)])])
            };
            let solution = Program::list([conditions.clone()]);
            let serialized = solution
                .serialize()
                .map_err(|e| BuildError::SerializationFailed(e.to_string()))?;
            spends.push((
                CoinSpend {
                    coin: coin.clone(),
                    puzzle_reveal: puzzle.clone(),
                    solution: hex::encode(serialized),
                },
                conditions,
            ));
        }
        Ok(spends)
    }

    /// Augmented-scheme G2 hash of `tree_hash(conditions) || coin_id || genesis`.
    fn signing_hash(&self, coin: &ChiaCoin, conditions: &Program) -> BuildResult<Vec<u8>> {
        let mut message = self.public_key.bytes.clone();
        message.extend_from_slice(&conditions.tree_hash());
        message.extend_from_slice(&coin.id()?);
        message.extend_from_slice(&decode_hash(&self.genesis_challenge)?);
        Ok(chia_bls::hash_to_g2(&message).to_bytes().to_vec())
    }
}

impl TransactionBuilder for ChiaTransactionBuilder {
    fn build_for_sign(&self, transaction: &Transaction, chain_data: &ChainData) -> BuildResult<SignPayload> {
        let ChainData::Chia(coins) = chain_data else {
            return Err(BuildError::MissingRequiredParam("unspent coins"));
        };
        if self.public_key.bytes.len() != BLS_PUBLIC_KEY_LEN {
            return Err(AddressError::InvalidKey("expected a 48-byte BLS key".into()).into());
        }

        let spends = self.build_spends(transaction, coins)?;
        let hashes = spends
            .iter()
            .map(|(spend, conditions)| self.signing_hash(&spend.coin, conditions))
            .collect::<BuildResult<Vec<_>>>()?;
        Ok(SignPayload::Hashes {
            hashes,
            unsigned: UnsignedTransaction::Chia(UnsignedSpendBundle {
                coin_spends: spends.into_iter().map(|(spend, _)| spend).collect(),
            }),
        })
    }

    fn build_for_send(&self, payload: &SignPayload, signatures: &[Vec<u8>]) -> BuildResult<SignedResult> {
        let UnsignedTransaction::Chia(bundle) = payload.unsigned() else {
            return Err(foreign_payload());
        };
        check_signature_count(payload, signatures)?;

        let mut parsed = Vec::with_capacity(signatures.len());
        for signature in signatures {
            let bytes: [u8; BLS_SIGNATURE_LEN] = signature.as_slice().try_into().map_err(|_| {
                BuildError::InvalidSignature(format!("expected 96 bytes, got {}", signature.len()))
            })?;
            parsed.push(
                chia_bls::Signature::from_bytes(&bytes).map_err(|e| BuildError::InvalidSignature(e.to_string()))?,
            );
        }
        let aggregate = chia_bls::aggregate(&parsed);

        Ok(SignedResult::ChiaSpendBundle(SpendBundle {
            aggregated_signature: hex::encode(aggregate.to_bytes()),
            coin_spends: bundle.coin_spends.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_id() {
        let coin = ChiaCoin {
            amount: 5_199_843_583,
            parent_coin_info: "0x34ddaf3f1500f45b2afe2d8783f8abbde57f82be02bf2f6661095c6b20cd12cb".into(),
            puzzle_hash: "0x9488ae2f6f0d2655aca94c6e658fdc31bd2217f74d676407112c0558d3d217d2".into(),
        };
        let mut preimage = hex::decode("34ddaf3f1500f45b2afe2d8783f8abbde57f82be02bf2f6661095c6b20cd12cb9488ae2f6f0d2655aca94c6e658fdc31bd2217f74d676407112c0558d3d217d2").unwrap();
        preimage.extend(hex::decode("0135ef50ff").unwrap());
        assert_eq!(coin.id().unwrap(), sha256(&preimage));
    }

    #[test]
    fn test_create_coin_condition_encoding() {
        let puzzle_hash = [0xabu8; 32];
        let solution = Program::list([Program::list([ChiaTransactionBuilder::create_coin(
            &puzzle_hash,
            235_834_596_465,
        )])]);
        let expected = format!("ffffff33ffa0{}ff8536e8d65c71808080", "ab".repeat(32));
        assert_eq!(hex::encode(solution.serialize().unwrap()), expected);
    }
}
