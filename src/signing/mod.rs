//! External Signing
//!
//! The wallet never holds private keys. Digests produced by a transaction
//! builder go to an injected `Signer` (typically a hardware card); the raw
//! signatures it returns are compiled back into a transaction by the same
//! builder.

pub mod ecdsa;

use async_trait::async_trait;

use crate::error::SignerError;
use crate::tx::chia::SpendBundle;
use crate::tx::internet_computer::SignedRequests;
use crate::tx::UnsignedTransaction;
use crate::types::PublicKey;

/// Opaque signing capability.
///
/// Implementations must return exactly one signature per hash, in the
/// order the hashes were given. Dropping the returned future cancels the
/// request.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, hashes: &[Vec<u8>], public_key: &PublicKey) -> Result<Vec<Vec<u8>>, SignerError>;
}

/// What `build_for_sign` hands to the signer, plus the unsigned
/// transaction `build_for_send` needs to finish the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignPayload {
    /// A single digest.
    Hash {
        hash: Vec<u8>,
        unsigned: UnsignedTransaction,
    },
    /// One digest per input, coin or request, in signing order.
    Hashes {
        hashes: Vec<Vec<u8>>,
        unsigned: UnsignedTransaction,
    },
    /// A serialized unsigned transaction and the digest over it.
    Envelope {
        bytes: Vec<u8>,
        digest: Vec<u8>,
        unsigned: UnsignedTransaction,
    },
}

impl SignPayload {
    /// Digests to pass to the signer, in order.
    pub fn hashes(&self) -> Vec<Vec<u8>> {
        match self {
            SignPayload::Hash { hash, .. } => vec![hash.clone()],
            SignPayload::Hashes { hashes, .. } => hashes.clone(),
            SignPayload::Envelope { digest, .. } => vec![digest.clone()],
        }
    }

    pub fn unsigned(&self) -> &UnsignedTransaction {
        match self {
            SignPayload::Hash { unsigned, .. }
            | SignPayload::Hashes { unsigned, .. }
            | SignPayload::Envelope { unsigned, .. } => unsigned,
        }
    }
}

/// Broadcast-ready output of `build_for_send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedResult {
    /// Raw transaction bytes.
    Raw(Vec<u8>),
    ChiaSpendBundle(SpendBundle),
    /// Signed call and read_state envelopes.
    InternetComputer(SignedRequests),
}

impl SignedResult {
    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            SignedResult::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }
}
