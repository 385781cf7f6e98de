//! Transaction Module
//!
//! Two-phase, I/O-free transaction building. `build_for_sign` turns a
//! `Transaction` plus injected chain data into the digests a signer must
//! sign; `build_for_send` attaches the returned signatures and produces a
//! broadcast-ready result.

pub mod bitcoin;
pub mod chia;
pub mod ethereum;
pub mod internet_computer;
pub mod koinos;
pub mod tron;

pub use self::bitcoin::{BitcoinTransactionBuilder, Unspent};
pub use self::chia::{ChiaCoin, ChiaTransactionBuilder};
pub use self::ethereum::EthereumTransactionBuilder;
pub use self::internet_computer::InternetComputerTransactionBuilder;
pub use self::koinos::KoinosTransactionBuilder;
pub use self::tron::{TronBlockHeader, TronTransactionBuilder};

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, BuildResult};
use crate::fees::Fee;
use crate::signing::{SignPayload, SignedResult};
use crate::types::{Amount, Transaction};

/// Chain-specific builder. Implementations hold only immutable
/// configuration and the wallet key, so one instance may build many
/// transactions concurrently.
pub trait TransactionBuilder: Send + Sync {
    fn build_for_sign(&self, transaction: &Transaction, chain_data: &ChainData) -> BuildResult<SignPayload>;

    /// `signatures` must match `payload.hashes()` in count and order.
    fn build_for_send(&self, payload: &SignPayload, signatures: &[Vec<u8>]) -> BuildResult<SignedResult>;
}

/// State fetched by the network provider that a build depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainData {
    #[default]
    None,
    /// Spendable outputs of the wallet.
    Utxo(Vec<Unspent>),
    /// The nonce the next transaction must carry.
    Account { nonce: u64 },
    /// Latest block header, used as the reference block.
    Tron(TronBlockHeader),
    Chia(Vec<ChiaCoin>),
}

/// Unsigned form kept between the two build phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsignedTransaction {
    Bitcoin(self::bitcoin::UnsignedUtxoTransaction),
    Ethereum(ethereum::UnsignedEvmTransaction),
    Tron(tron::UnsignedTronTransaction),
    Koinos(koinos::UnsignedKoinosTransaction),
    Chia(chia::UnsignedSpendBundle),
    InternetComputer(internet_computer::UnsignedRequests),
}

/// Reject signature lists that do not line up with the payload's digests.
pub(crate) fn check_signature_count(payload: &SignPayload, signatures: &[Vec<u8>]) -> BuildResult<()> {
    let expected = payload.hashes().len();
    if signatures.len() != expected {
        return Err(BuildError::SignatureCountMismatch {
            expected,
            actual: signatures.len(),
        });
    }
    Ok(())
}

pub(crate) fn foreign_payload() -> BuildError {
    BuildError::SerializationFailed("payload was built for another chain".into())
}

/// Amount in smallest units.
pub(crate) fn amount_units(amount: &Amount) -> BuildResult<u128> {
    amount
        .smallest_unit()
        .ok_or(BuildError::MissingRequiredParam("amount in smallest units"))
}

/// Fee in smallest units: the parameters' total when present, otherwise
/// the displayed amount.
pub(crate) fn fee_units(fee: &Fee) -> BuildResult<u128> {
    match &fee.parameters {
        Some(parameters) => Ok(parameters.total_units()),
        None => fee
            .amount
            .smallest_unit()
            .ok_or(BuildError::MissingRequiredParam("fee in smallest units")),
    }
}

pub(crate) fn to_u64(value: u128, what: &'static str) -> BuildResult<u64> {
    u64::try_from(value).map_err(|_| BuildError::SerializationFailed(format!("{what} exceeds 64 bits")))
}

/// For protobuf `int64` fields, which a node reads as signed.
pub(crate) fn to_i64(value: u128, what: &'static str) -> BuildResult<i64> {
    i64::try_from(value).map_err(|_| BuildError::SerializationFailed(format!("{what} exceeds int64")))
}
