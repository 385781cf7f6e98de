//! Hawala Transaction Core
//!
//! Multi-chain address derivation and transaction construction for a
//! hardware-backed wallet. The crate never sees private keys: it turns a
//! public key and a send intent into chain-native digests, and turns the
//! signatures an external device returns into broadcast-ready transactions.
//!
//! # Architecture
//!
//! - **address**: one `AddressProvider` per chain family
//! - **tx**: two-phase `TransactionBuilder` per chain
//! - **fees**: `FeeParameters` and per-family `FeeModel`
//! - **signing**: `Signer` seam, sign payloads and ECDSA helpers
//! - **wallet**: strategy selection, network seam and `WalletManager`
//! - **codec**: wire encoders (protobuf, CBOR, CLVM, RLP, Base58Check)
//!
//! Chains are selected once, in `wallet::WalletFactory`. Nothing below it
//! switches on the chain.
//!
//! # Example
//!
//! ```rust,ignore
//! use hawala_txcore::types::{AddressType, Blockchain, PublicKey};
//! use hawala_txcore::wallet::WalletFactory;
//!
//! let factory = WalletFactory::default();
//! let address = factory
//!     .address_provider(Blockchain::Bitcoin)
//!     .make_address(&PublicKey::secp256k1(key_bytes), AddressType::Default)?;
//! println!("{address}");
//! ```

pub mod address;
pub mod codec;
pub mod error;
pub mod fees;
pub mod signing;
pub mod tx;
pub mod types;
pub mod utils;
pub mod wallet;

pub use error::{AddressError, BuildError, ErrorCode, NetworkError, SignerError, WalletError, WalletResult};
