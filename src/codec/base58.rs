//! Base58Check with a double-SHA256 checksum.

use crate::utils::crypto::double_sha256;

pub fn encode_check(payload: &[u8]) -> String {
    let checksum = double_sha256(payload);
    let mut data = payload.to_vec();
    data.extend_from_slice(&checksum[..4]);
    bs58::encode(data).into_string()
}

/// Decode and verify the checksum; returns the payload without it.
pub fn decode_check(encoded: &str) -> Option<Vec<u8>> {
    let data = bs58::decode(encoded).into_vec().ok()?;
    if data.len() < 5 {
        return None;
    }
    let (payload, checksum) = data.split_at(data.len() - 4);
    if double_sha256(payload)[..4] != *checksum {
        return None;
    }
    Some(payload.to_vec())
}
