//! Network boundary
//!
//! Balance, chain data, fee quotes and broadcast all come from an injected
//! `NetworkProvider`. Transport, retries and node fallback live behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;
use crate::fees::model::FeeQuote;
use crate::signing::SignedResult;
use crate::tx::ChainData;
use crate::types::{Address, Amount};

pub type NetworkResult<T> = Result<T, NetworkError>;

/// What one refresh learns about the wallet's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub balance: Amount,
    /// Unspents, nonce or reference block, whatever the chain's builder needs.
    #[serde(default)]
    pub chain_data: ChainData,
}

#[async_trait]
pub trait NetworkProvider: Send + Sync {
    /// Fetch balance and builder inputs for the wallet's addresses.
    ///
    /// An account the network has never seen is reported as
    /// `NetworkError::NoAccount`.
    async fn update(&self, addresses: &[Address]) -> NetworkResult<AccountSnapshot>;

    async fn fee_quote(&self, amount: &Amount, destination: &str) -> NetworkResult<FeeQuote>;

    /// Broadcast and return the transaction hash.
    async fn submit(&self, signed: &SignedResult) -> NetworkResult<String>;
}
