//! Unified error types for Hawala transaction core
//!
//! Every failure is a typed variant. Callers match on variants, never on
//! message text. `ErrorCode` gives a stable snake_case tag for host-side
//! reporting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AddressType, Curve};

/// Address derivation and validation failures. Synchronous and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid public key: {0}")]
    InvalidKey(String),

    #[error("curve {curve:?} is not supported by {chain}")]
    UnsupportedCurve { curve: Curve, chain: String },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("{chain} has no {address_type:?} address")]
    UnsupportedAddressType { address_type: AddressType, chain: String },
}

/// Transaction build failures. The caller must correct the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u128, available: u128 },

    #[error("missing required parameter: {0}")]
    MissingRequiredParam(&'static str),

    #[error("expected {expected} signatures, got {actual}")]
    SignatureCountMismatch { expected: usize, actual: usize },

    #[error("signature {index} does not match the digest at that position")]
    SignatureOrderMismatch { index: usize },

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("serialization failed: {0}")]
    SerializationFailed(String),

    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Failures reported by the external signing device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("signing was cancelled")]
    Cancelled,

    #[error("signing was declined on the device")]
    Declined,

    #[error("signing device error: {0}")]
    Device(String),
}

/// Failures reported by the injected network provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("account not found: {0}")]
    NoAccount(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected by network: {0}")]
    Rejected(String),
}

/// Top-level error returned by wallet operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("another send is already awaiting a signature")]
    SendInProgress,
}

impl WalletError {
    pub fn code(&self) -> ErrorCode {
        match self {
            WalletError::Address(e) => match e {
                AddressError::InvalidKey(_) => ErrorCode::InvalidKey,
                AddressError::UnsupportedCurve { .. } => ErrorCode::UnsupportedCurve,
                AddressError::InvalidAddress(_) => ErrorCode::InvalidAddress,
                AddressError::UnsupportedAddressType { .. } => ErrorCode::UnsupportedAddressType,
            },
            WalletError::Build(e) => match e {
                BuildError::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
                BuildError::MissingRequiredParam(_) => ErrorCode::MissingRequiredParam,
                BuildError::SignatureCountMismatch { .. } => ErrorCode::SignatureCountMismatch,
                BuildError::SignatureOrderMismatch { .. } => ErrorCode::SignatureOrderMismatch,
                BuildError::InvalidSignature(_) => ErrorCode::InvalidSignature,
                BuildError::SerializationFailed(_) => ErrorCode::SerializationFailed,
                BuildError::Address(_) => ErrorCode::InvalidAddress,
            },
            WalletError::Signer(e) => match e {
                SignerError::Cancelled => ErrorCode::SigningCancelled,
                SignerError::Declined => ErrorCode::SigningDeclined,
                SignerError::Device(_) => ErrorCode::DeviceError,
            },
            WalletError::Network(e) => match e {
                NetworkError::NoAccount(_) => ErrorCode::NoAccount,
                NetworkError::Transport(_) => ErrorCode::NetworkError,
                NetworkError::Rejected(_) => ErrorCode::BroadcastFailed,
            },
            WalletError::SendInProgress => ErrorCode::SendInProgress,
        }
    }

    /// True when the user backed out of signing. Not a failure of the wallet.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, WalletError::Signer(SignerError::Cancelled))
    }
}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Derivation
    InvalidKey,
    UnsupportedCurve,
    InvalidAddress,
    UnsupportedAddressType,

    // Build
    InsufficientFunds,
    MissingRequiredParam,
    SignatureCountMismatch,
    SignatureOrderMismatch,
    InvalidSignature,
    SerializationFailed,

    // Signing
    SigningCancelled,
    SigningDeclined,
    DeviceError,
    SendInProgress,

    // Network
    NoAccount,
    NetworkError,
    BroadcastFailed,
}

pub type AddressResult<T> = Result<T, AddressError>;
pub type BuildResult<T> = Result<T, BuildError>;
pub type WalletResult<T> = Result<T, WalletError>;
