//! secp256k1 signature helpers for externally produced `r || s` signatures.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId, Signature};
use secp256k1::{Message, Secp256k1};

use crate::error::{BuildError, BuildResult};
use crate::utils::crypto::parse_secp256k1;

/// Parse a 64-byte compact signature and normalize it to low-S.
pub fn parse_compact(signature: &[u8]) -> BuildResult<Signature> {
    if signature.len() != 64 {
        return Err(BuildError::InvalidSignature(format!(
            "expected 64 bytes, got {}",
            signature.len()
        )));
    }
    let mut sig = Signature::from_compact(signature).map_err(|e| BuildError::InvalidSignature(e.to_string()))?;
    sig.normalize_s();
    Ok(sig)
}

/// Low-S DER encoding (without sighash byte).
pub fn der_encode(signature: &[u8]) -> BuildResult<Vec<u8>> {
    Ok(parse_compact(signature)?.serialize_der().to_vec())
}

/// Low-S `r || s` plus the recovery id that yields `public_key` for `digest`.
pub fn recoverable(signature: &[u8], digest: &[u8], public_key: &[u8]) -> BuildResult<([u8; 64], u8)> {
    let compact = parse_compact(signature)?.serialize_compact();
    let expected = parse_secp256k1(public_key)?;
    let message = Message::from_digest_slice(digest).map_err(|e| BuildError::InvalidSignature(e.to_string()))?;
    let secp = Secp256k1::verification_only();

    for id in 0..4 {
        let Ok(recovery_id) = RecoveryId::from_i32(id) else {
            continue;
        };
        let Ok(recoverable) = RecoverableSignature::from_compact(&compact, recovery_id) else {
            continue;
        };
        if secp.recover_ecdsa(&message, &recoverable).ok() == Some(expected) {
            return Ok((compact, id as u8));
        }
    }
    Err(BuildError::InvalidSignature(
        "signature does not recover to the wallet key".into(),
    ))
}

/// True if `signature` is a valid signature of `digest` by `public_key`.
pub fn verify(signature: &[u8], digest: &[u8], public_key: &[u8]) -> bool {
    let (Ok(sig), Ok(key), Ok(message)) = (
        parse_compact(signature),
        parse_secp256k1(public_key),
        Message::from_digest_slice(digest),
    ) else {
        return false;
    };
    Secp256k1::verification_only().verify_ecdsa(&message, &sig, &key).is_ok()
}
