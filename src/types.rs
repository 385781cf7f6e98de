//! Shared types for Hawala transaction core
//!
//! All data structures that cross module boundaries are defined here
//! for consistent serialization.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::fees::Fee;

// =============================================================================
// Chain Types
// =============================================================================

/// Supported blockchain networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Blockchain {
    Bitcoin,
    BitcoinTestnet,
    Litecoin,
    Ethereum,
    EthereumSepolia,
    Polygon,
    Tron,
    TronNile,
    Koinos,
    KoinosHarbinger,
    Chia,
    ChiaTestnet,
    InternetComputer,
}

/// Chain families share an address scheme, fee model and wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainFamily {
    Utxo,
    Evm,
    Tron,
    Koinos,
    Chia,
    InternetComputer,
}

impl Blockchain {
    pub fn family(&self) -> ChainFamily {
        match self {
            Blockchain::Bitcoin | Blockchain::BitcoinTestnet | Blockchain::Litecoin => {
                ChainFamily::Utxo
            }
            Blockchain::Ethereum | Blockchain::EthereumSepolia | Blockchain::Polygon => {
                ChainFamily::Evm
            }
            Blockchain::Tron | Blockchain::TronNile => ChainFamily::Tron,
            Blockchain::Koinos | Blockchain::KoinosHarbinger => ChainFamily::Koinos,
            Blockchain::Chia | Blockchain::ChiaTestnet => ChainFamily::Chia,
            Blockchain::InternetComputer => ChainFamily::InternetComputer,
        }
    }

    pub fn is_testnet(&self) -> bool {
        matches!(
            self,
            Blockchain::BitcoinTestnet
                | Blockchain::EthereumSepolia
                | Blockchain::TronNile
                | Blockchain::KoinosHarbinger
                | Blockchain::ChiaTestnet
        )
    }

    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Blockchain::Ethereum => Some(1),
            Blockchain::EthereumSepolia => Some(11155111),
            Blockchain::Polygon => Some(137),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Blockchain::Bitcoin | Blockchain::BitcoinTestnet => "BTC",
            Blockchain::Litecoin => "LTC",
            Blockchain::Ethereum | Blockchain::EthereumSepolia => "ETH",
            Blockchain::Polygon => "MATIC",
            Blockchain::Tron | Blockchain::TronNile => "TRX",
            Blockchain::Koinos | Blockchain::KoinosHarbinger => "KOIN",
            Blockchain::Chia | Blockchain::ChiaTestnet => "XCH",
            Blockchain::InternetComputer => "ICP",
        }
    }

    pub fn decimals(&self) -> u32 {
        match self {
            Blockchain::Bitcoin | Blockchain::BitcoinTestnet | Blockchain::Litecoin => 8,
            Blockchain::Ethereum | Blockchain::EthereumSepolia | Blockchain::Polygon => 18,
            Blockchain::Tron | Blockchain::TronNile => 6,
            Blockchain::Koinos | Blockchain::KoinosHarbinger => 8,
            Blockchain::Chia | Blockchain::ChiaTestnet => 12,
            Blockchain::InternetComputer => 8,
        }
    }

    /// Curve the chain signs with.
    pub fn curve(&self) -> Curve {
        match self.family() {
            ChainFamily::Chia => Curve::Bls,
            _ => Curve::Secp256k1,
        }
    }

    /// Default coin amount of this chain.
    pub fn coin(&self, value: Decimal) -> Amount {
        Amount::coin(*self, value)
    }
}

impl std::fmt::Display for Blockchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Blockchain::Bitcoin => "bitcoin",
            Blockchain::BitcoinTestnet => "bitcoin-testnet",
            Blockchain::Litecoin => "litecoin",
            Blockchain::Ethereum => "ethereum",
            Blockchain::EthereumSepolia => "ethereum-sepolia",
            Blockchain::Polygon => "polygon",
            Blockchain::Tron => "tron",
            Blockchain::TronNile => "tron-nile",
            Blockchain::Koinos => "koinos",
            Blockchain::KoinosHarbinger => "koinos-harbinger",
            Blockchain::Chia => "chia",
            Blockchain::ChiaTestnet => "chia-testnet",
            Blockchain::InternetComputer => "internet-computer",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Blockchain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "bitcoin" | "btc" => Ok(Blockchain::Bitcoin),
            "bitcoin_testnet" | "btc_testnet" => Ok(Blockchain::BitcoinTestnet),
            "litecoin" | "ltc" => Ok(Blockchain::Litecoin),
            "ethereum" | "eth" => Ok(Blockchain::Ethereum),
            "ethereum_sepolia" | "sepolia" => Ok(Blockchain::EthereumSepolia),
            "polygon" | "matic" => Ok(Blockchain::Polygon),
            "tron" | "trx" => Ok(Blockchain::Tron),
            "tron_nile" | "nile" => Ok(Blockchain::TronNile),
            "koinos" | "koin" => Ok(Blockchain::Koinos),
            "koinos_harbinger" | "harbinger" => Ok(Blockchain::KoinosHarbinger),
            "chia" | "xch" => Ok(Blockchain::Chia),
            "chia_testnet" | "txch" => Ok(Blockchain::ChiaTestnet),
            "internet_computer" | "icp" => Ok(Blockchain::InternetComputer),
            _ => Err(format!("Unknown chain: {}", s)),
        }
    }
}

// =============================================================================
// Keys and Addresses
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    Ed25519,
    Secp256k1,
    Secp256r1,
    Bls,
}

/// Raw public key as produced by the signing device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    #[serde(with = "hex_bytes")]
    pub bytes: Vec<u8>,
    pub chain_code: Option<Vec<u8>>,
    pub curve: Curve,
}

impl PublicKey {
    pub fn new(bytes: impl Into<Vec<u8>>, curve: Curve) -> Self {
        Self {
            bytes: bytes.into(),
            chain_code: None,
            curve,
        }
    }

    pub fn secp256k1(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(bytes, Curve::Secp256k1)
    }

    pub fn bls(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(bytes, Curve::Bls)
    }

    pub fn with_chain_code(mut self, chain_code: Vec<u8>) -> Self {
        self.chain_code = Some(chain_code);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    Default,
    Legacy,
    Script,
}

/// A derived address. Never mutated after derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub value: String,
    pub public_key: PublicKey,
    pub address_type: AddressType,
    pub locking_script: Option<Vec<u8>>,
}

impl Address {
    pub fn new(value: impl Into<String>, public_key: PublicKey, address_type: AddressType) -> Self {
        Self {
            value: value.into(),
            public_key,
            address_type,
            locking_script: None,
        }
    }

    pub fn with_locking_script(mut self, script: Vec<u8>) -> Self {
        self.locking_script = Some(script);
        self
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

// =============================================================================
// Amounts
// =============================================================================

/// What an amount is denominated in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Currency {
    Coin { blockchain: Blockchain },
    Token(Token),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub contract_address: String,
    pub decimals: u32,
}

impl Token {
    pub fn new(symbol: impl Into<String>, contract_address: impl Into<String>, decimals: u32) -> Self {
        Self {
            symbol: symbol.into(),
            contract_address: contract_address.into(),
            decimals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub currency: Currency,
    pub value: Decimal,
}

impl Amount {
    pub fn coin(blockchain: Blockchain, value: Decimal) -> Self {
        Self {
            currency: Currency::Coin { blockchain },
            value,
        }
    }

    pub fn token(token: Token, value: Decimal) -> Self {
        Self {
            currency: Currency::Token(token),
            value,
        }
    }

    /// Build an amount from its smallest-unit integer. Values that do not fit
    /// a `Decimal` saturate to `Decimal::MAX`.
    pub fn from_smallest_unit(currency: Currency, units: u128) -> Self {
        let decimals = match &currency {
            Currency::Coin { blockchain } => blockchain.decimals(),
            Currency::Token(token) => token.decimals,
        };
        Self {
            currency,
            value: units_to_decimal(units, decimals),
        }
    }

    pub fn decimals(&self) -> u32 {
        match &self.currency {
            Currency::Coin { blockchain } => blockchain.decimals(),
            Currency::Token(token) => token.decimals,
        }
    }

    pub fn token_info(&self) -> Option<&Token> {
        match &self.currency {
            Currency::Token(token) => Some(token),
            Currency::Coin { .. } => None,
        }
    }

    /// Value in the smallest indivisible unit. `None` for negative values or
    /// values whose scaled form overflows.
    pub fn smallest_unit(&self) -> Option<u128> {
        decimal_to_units(self.value, self.decimals())
    }
}

/// Largest mantissa a `Decimal` can hold (96 bits).
const DECIMAL_MAX_MANTISSA: u128 = (1u128 << 96) - 1;
/// Largest scale a `Decimal` can hold.
const DECIMAL_MAX_SCALE: u32 = 28;

/// `units / 10^decimals` as a Decimal. Exact when representable; otherwise
/// low-order digits are dropped, and values beyond range saturate.
pub fn units_to_decimal(units: u128, decimals: u32) -> Decimal {
    let mut mantissa = units;
    let mut scale = decimals;
    while (mantissa > DECIMAL_MAX_MANTISSA || scale > DECIMAL_MAX_SCALE) && scale > 0 {
        mantissa /= 10;
        scale -= 1;
    }
    if mantissa > DECIMAL_MAX_MANTISSA {
        return Decimal::MAX;
    }
    Decimal::try_from_i128_with_scale(mantissa as i128, scale).unwrap_or(Decimal::MAX)
}

pub fn decimal_to_units(value: Decimal, decimals: u32) -> Option<u128> {
    if value.is_sign_negative() && !value.is_zero() {
        return None;
    }
    let mut scaled = value;
    for _ in 0..decimals {
        scaled = scaled.checked_mul(Decimal::TEN)?;
    }
    let integral = scaled.trunc().normalize();
    if integral.scale() != 0 {
        return None;
    }
    u128::try_from(integral.mantissa()).ok()
}

// =============================================================================
// Transactions
// =============================================================================

/// Chain-specific extras carried by a transaction intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionParams {
    /// Raw EVM call data appended to a coin transfer.
    Ethereum { data: Vec<u8> },
    /// Bitcoin-family input sequence and optional BIP69 ordering.
    Bitcoin { sequence: Option<u32>, bip69: bool },
    InternetComputer(InternetComputerParams),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternetComputerParams {
    pub memo: u64,
    /// Ledger `created_at_time`, nanoseconds since the Unix epoch.
    pub created_at_nanos: u64,
    pub nonce: Option<Vec<u8>>,
}

impl InternetComputerParams {
    pub fn now(memo: u64) -> Self {
        let nanos = chrono::Utc::now()
            .timestamp_nanos_opt()
            .map(|n| n.max(0) as u64)
            .unwrap_or_default();
        Self {
            memo,
            created_at_nanos: nanos,
            nonce: None,
        }
    }
}

/// The user's intent for a single send. Immutable input to a builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub amount: Amount,
    pub fee: Fee,
    pub source_address: String,
    pub destination_address: String,
    pub change_address: String,
    pub params: Option<TransactionParams>,
}

impl Transaction {
    pub fn new(
        amount: Amount,
        fee: Fee,
        source_address: impl Into<String>,
        destination_address: impl Into<String>,
    ) -> Self {
        let source_address = source_address.into();
        Self {
            amount,
            fee,
            change_address: source_address.clone(),
            source_address,
            destination_address: destination_address.into(),
            params: None,
        }
    }

    pub fn with_change_address(mut self, change: impl Into<String>) -> Self {
        self.change_address = change.into();
        self
    }

    pub fn with_params(mut self, params: TransactionParams) -> Self {
        self.params = Some(params);
        self
    }
}

pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}
