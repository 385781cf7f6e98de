//! Strategy selection
//!
//! The chain is looked at exactly once, here. Everything downstream talks
//! to `AddressProvider`, `TransactionBuilder` and `FeeModel` trait objects.

use std::sync::Arc;

use crate::address::{
    AddressProvider, BitcoinAddressProvider, ChiaAddressProvider, EthereumAddressProvider,
    InternetComputerAddressProvider, KoinosAddressProvider, TronAddressProvider,
};
use crate::error::WalletResult;
use crate::fees::model::{EvmFeeModel, FeeModel, FlatFeeModel, KoinosFeeModel, TronFeeModel, UtxoFeeModel};
use crate::tx::{
    BitcoinTransactionBuilder, ChiaTransactionBuilder, EthereumTransactionBuilder,
    InternetComputerTransactionBuilder, KoinosTransactionBuilder, TransactionBuilder, TronTransactionBuilder,
};
use crate::types::{Blockchain, PublicKey};
use crate::utils::chain_config::ChainConfig;

use super::manager::WalletManager;
use super::provider::NetworkProvider;

#[derive(Debug, Clone, Default)]
pub struct WalletFactory {
    config: ChainConfig,
}

impl WalletFactory {
    pub fn new(config: ChainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn address_provider(&self, blockchain: Blockchain) -> Box<dyn AddressProvider> {
        match blockchain {
            Blockchain::Bitcoin => Box::new(BitcoinAddressProvider::new(self.config.utxo.bitcoin.clone())),
            Blockchain::BitcoinTestnet => {
                Box::new(BitcoinAddressProvider::new(self.config.utxo.bitcoin_testnet.clone()))
            }
            Blockchain::Litecoin => Box::new(BitcoinAddressProvider::new(self.config.utxo.litecoin.clone())),
            Blockchain::Ethereum | Blockchain::EthereumSepolia | Blockchain::Polygon => {
                Box::new(EthereumAddressProvider)
            }
            Blockchain::Tron | Blockchain::TronNile => Box::new(TronAddressProvider),
            Blockchain::Koinos | Blockchain::KoinosHarbinger => Box::new(KoinosAddressProvider),
            Blockchain::Chia | Blockchain::ChiaTestnet => Box::new(ChiaAddressProvider::new(blockchain.is_testnet())),
            Blockchain::InternetComputer => Box::new(InternetComputerAddressProvider),
        }
    }

    pub fn transaction_builder(&self, blockchain: Blockchain, public_key: PublicKey) -> Box<dyn TransactionBuilder> {
        let testnet = blockchain.is_testnet();
        match blockchain {
            Blockchain::Bitcoin => Box::new(BitcoinTransactionBuilder::new(
                self.config.utxo.bitcoin.clone(),
                public_key,
            )),
            Blockchain::BitcoinTestnet => Box::new(BitcoinTransactionBuilder::new(
                self.config.utxo.bitcoin_testnet.clone(),
                public_key,
            )),
            Blockchain::Litecoin => Box::new(BitcoinTransactionBuilder::new(
                self.config.utxo.litecoin.clone(),
                public_key,
            )),
            Blockchain::Ethereum | Blockchain::EthereumSepolia | Blockchain::Polygon => Box::new(
                EthereumTransactionBuilder::new(blockchain.chain_id().unwrap_or_default(), public_key),
            ),
            Blockchain::Tron | Blockchain::TronNile => {
                Box::new(TronTransactionBuilder::new(self.config.tron.clone(), public_key))
            }
            Blockchain::Koinos | Blockchain::KoinosHarbinger => Box::new(KoinosTransactionBuilder::new(
                self.config.koinos.clone(),
                testnet,
                public_key,
            )),
            Blockchain::Chia | Blockchain::ChiaTestnet => {
                Box::new(ChiaTransactionBuilder::new(&self.config.chia, testnet, public_key))
            }
            Blockchain::InternetComputer => Box::new(InternetComputerTransactionBuilder::new(
                self.config.internet_computer.clone(),
                public_key,
            )),
        }
    }

    pub fn fee_model(&self, blockchain: Blockchain) -> Box<dyn FeeModel> {
        match blockchain {
            Blockchain::Bitcoin | Blockchain::BitcoinTestnet | Blockchain::Litecoin => {
                Box::new(UtxoFeeModel { blockchain })
            }
            Blockchain::Ethereum | Blockchain::EthereumSepolia | Blockchain::Polygon => {
                Box::new(EvmFeeModel { blockchain })
            }
            Blockchain::Tron | Blockchain::TronNile => Box::new(TronFeeModel { blockchain }),
            Blockchain::Koinos | Blockchain::KoinosHarbinger => Box::new(KoinosFeeModel {
                blockchain,
                config: self.config.koinos.clone(),
            }),
            Blockchain::Chia | Blockchain::ChiaTestnet | Blockchain::InternetComputer => {
                Box::new(FlatFeeModel { blockchain })
            }
        }
    }

    /// Derive every address for the key and wire up a manager.
    pub fn make_wallet(
        &self,
        blockchain: Blockchain,
        public_key: PublicKey,
        provider: Arc<dyn NetworkProvider>,
    ) -> WalletResult<WalletManager> {
        let addresses = self.address_provider(blockchain).make_addresses(&public_key)?;
        Ok(WalletManager::new(
            blockchain,
            public_key.clone(),
            addresses,
            self.transaction_builder(blockchain, public_key),
            self.fee_model(blockchain),
            provider,
        ))
    }
}
