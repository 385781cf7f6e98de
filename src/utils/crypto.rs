//! Crypto Utilities
//!
//! Hash functions and secp256k1 point handling shared by address providers
//! and transaction builders.

use bitcoin::hashes::{sha256d, Hash};
use ripemd::Ripemd160;
use sha2::{Digest, Sha224, Sha256};
use tiny_keccak::{Hasher, Keccak};

use crate::error::AddressError;

/// Keccak256 hash (used for Ethereum and Tron addresses)
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256d::Hash::hash(data).to_byte_array()
}

pub fn sha224(data: &[u8]) -> [u8; 28] {
    Sha224::digest(data).into()
}

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(Sha256::digest(data)).into()
}

/// Convert raw address bytes to checksummed Ethereum address
pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut result = String::from("0x");
    for (i, ch) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

        if ch.is_ascii_digit() || nibble < 8 {
            result.push(ch);
        } else {
            result.push(ch.to_ascii_uppercase());
        }
    }

    result
}

/// Parse a compressed or uncompressed secp256k1 point.
pub fn parse_secp256k1(bytes: &[u8]) -> Result<secp256k1::PublicKey, AddressError> {
    if bytes.is_empty() {
        return Err(AddressError::InvalidKey("empty public key".into()));
    }
    secp256k1::PublicKey::from_slice(bytes).map_err(|e| AddressError::InvalidKey(e.to_string()))
}

/// 33-byte SEC1 compressed form.
pub fn compress_secp256k1(bytes: &[u8]) -> Result<[u8; 33], AddressError> {
    Ok(parse_secp256k1(bytes)?.serialize())
}

/// 65-byte SEC1 uncompressed form (0x04 prefix included).
pub fn decompress_secp256k1(bytes: &[u8]) -> Result<[u8; 65], AddressError> {
    Ok(parse_secp256k1(bytes)?.serialize_uncompressed())
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNCOMPRESSED: &str = "0441DCD64B5F4A039FC339A16300A833A883B218909F2EBCAF3906651C76842C45E3D67E8D2947E6FEE8B62D3D3B6A4D5F212DA23E478DD69A2C6CCC851F300D80";

    #[test]
    fn test_keccak_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_point_compression_roundtrip() {
        let key = hex::decode(UNCOMPRESSED).unwrap();
        let compressed = compress_secp256k1(&key).unwrap();
        assert_eq!(compressed[0], 0x02);
        assert_eq!(decompress_secp256k1(&compressed).unwrap().to_vec(), key);
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(parse_secp256k1(&[]), Err(AddressError::InvalidKey(_))));
        assert!(parse_secp256k1(&[0x02; 10]).is_err());
    }

    #[test]
    fn test_checksum_address() {
        let bytes = hex::decode("6eca00c52afc728cdbf42e817d712e175bb23c7d").unwrap();
        assert_eq!(
            to_checksum_address(&bytes),
            "0x6ECa00c52AFC728CDbF42E817d712e175bb23C7d"
        );
    }
}
