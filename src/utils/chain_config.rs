//! Chain Constants
//!
//! Every network constant the builders and address providers depend on.
//! Builders receive a copy at construction; nothing here is global.

use serde::{Deserialize, Serialize};

/// Bitcoin-family encoding parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoNetwork {
    pub p2pkh_version: u8,
    pub p2sh_version: u8,
    pub bech32_hrp: String,
    /// Input sequence used when the transaction does not specify one.
    pub default_sequence: u32,
    pub tx_version: u32,
}

impl UtxoNetwork {
    pub fn bitcoin() -> Self {
        Self {
            p2pkh_version: 0x00,
            p2sh_version: 0x05,
            bech32_hrp: "bc".into(),
            default_sequence: 0xFFFF_FFFE,
            tx_version: 1,
        }
    }

    pub fn bitcoin_testnet() -> Self {
        Self {
            p2pkh_version: 0x6f,
            p2sh_version: 0xc4,
            bech32_hrp: "tb".into(),
            ..Self::bitcoin()
        }
    }

    pub fn litecoin() -> Self {
        Self {
            p2pkh_version: 0x30,
            p2sh_version: 0x32,
            bech32_hrp: "ltc".into(),
            ..Self::bitcoin()
        }
    }
}

/// One entry per Bitcoin-family network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtxoConfig {
    pub bitcoin: UtxoNetwork,
    pub bitcoin_testnet: UtxoNetwork,
    pub litecoin: UtxoNetwork,
}

impl Default for UtxoConfig {
    fn default() -> Self {
        Self {
            bitcoin: UtxoNetwork::bitcoin(),
            bitcoin_testnet: UtxoNetwork::bitcoin_testnet(),
            litecoin: UtxoNetwork::litecoin(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChiaConfig {
    pub mainnet_genesis_challenge: String,
    pub testnet_genesis_challenge: String,
}

impl Default for ChiaConfig {
    fn default() -> Self {
        Self {
            mainnet_genesis_challenge:
                "ccd5bb71183532bff220ba46c268991a3ff07eb358e8255a65c30a2dce0e5fbb".into(),
            testnet_genesis_challenge:
                "ae83525ba8d1dd3f09b277de18ca3e43fc0af20d20c4b3e92ef2a48bd291ccb2".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KoinosConfig {
    pub mainnet_koin_contract: String,
    pub testnet_koin_contract: String,
    /// base64url chain ids, as reported by the chain's `get_chain_id` RPC.
    pub mainnet_chain_id: String,
    pub testnet_chain_id: String,
    pub transfer_entry_point: u32,
    pub max_disk_storage_per_transfer: u64,
    pub max_network_bandwidth_per_transfer: u64,
    pub max_compute_bandwidth_per_transfer: u64,
}

impl Default for KoinosConfig {
    fn default() -> Self {
        Self {
            mainnet_koin_contract: "15DJN4a8SgrbGhhGksSBASiSYjGnMU8dGL".into(),
            testnet_koin_contract: "1FaSvLjQJsCJKq5ybmGsMMQs8RQYyVv8ju".into(),
            mainnet_chain_id: "EiBZK_GGVP0H_fXVAM3j6EAuz3-B-l3ejxRSewi7qIBfSA==".into(),
            testnet_chain_id: "EiBncD4pKRIQWco_WRqo5Q-xnXR7JuO3PtZv983mKdKHSQ==".into(),
            transfer_entry_point: 0x27f5_76ca,
            max_disk_storage_per_transfer: 118,
            max_network_bandwidth_per_transfer: 408,
            max_compute_bandwidth_per_transfer: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TronConfig {
    /// Fee limit attached to smart-contract calls, in sun.
    pub contract_fee_limit: u64,
    pub expiration_millis: u64,
}

impl Default for TronConfig {
    fn default() -> Self {
        Self {
            contract_fee_limit: 100_000_000,
            expiration_millis: 10 * 60 * 60 * 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternetComputerConfig {
    /// Hex-encoded ledger canister principal bytes.
    pub ledger_canister_id: String,
    pub transfer_method: String,
    pub ingress_expiry_nanos: u64,
}

impl Default for InternetComputerConfig {
    fn default() -> Self {
        Self {
            ledger_canister_id: "00000000000000020101".into(),
            transfer_method: "send_pb".into(),
            ingress_expiry_nanos: 5 * 60 * 1_000_000_000,
        }
    }
}

/// All chain constants in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub utxo: UtxoConfig,
    pub chia: ChiaConfig,
    pub koinos: KoinosConfig,
    pub tron: TronConfig,
    pub internet_computer: InternetComputerConfig,
}

impl ChainConfig {
    /// Load overrides from JSON; omitted sections keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
