//! EVM addresses: last 20 bytes of Keccak256 over the uncompressed point,
//! EIP-55 checksummed.

use super::{require_curve, require_type, AddressProvider};
use crate::error::{AddressError, AddressResult};
use crate::types::{Address, AddressType, Curve, PublicKey};
use crate::utils::crypto::{decompress_secp256k1, keccak256, to_checksum_address};

#[derive(Debug, Clone, Default)]
pub struct EthereumAddressProvider;

impl EthereumAddressProvider {
    /// Raw 20 address bytes, if `address` is a well-formed hex address.
    pub fn parse(address: &str) -> AddressResult<[u8; 20]> {
        let hex_part = address
            .strip_prefix("0x")
            .or_else(|| address.strip_prefix("0X"))
            .ok_or_else(|| AddressError::InvalidAddress(address.to_string()))?;
        let bytes = hex::decode(hex_part).map_err(|_| AddressError::InvalidAddress(address.to_string()))?;
        bytes
            .try_into()
            .map_err(|_| AddressError::InvalidAddress(address.to_string()))
    }
}

/// `keccak256(uncompressed point without its 0x04 prefix)[12..]`
pub(crate) fn keccak_address_bytes(public_key: &[u8]) -> AddressResult<[u8; 20]> {
    let uncompressed = decompress_secp256k1(public_key)?;
    let hash = keccak256(&uncompressed[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Ok(out)
}

impl AddressProvider for EthereumAddressProvider {
    fn make_address(&self, public_key: &PublicKey, address_type: AddressType) -> AddressResult<Address> {
        require_type(address_type, &[AddressType::Default], "ethereum")?;
        require_curve(public_key, Curve::Secp256k1, "ethereum")?;
        let bytes = keccak_address_bytes(&public_key.bytes)?;
        Ok(Address::new(
            to_checksum_address(&bytes),
            public_key.clone(),
            AddressType::Default,
        ))
    }

    fn validate(&self, address: &str) -> bool {
        let Ok(bytes) = Self::parse(address) else {
            return false;
        };
        let hex_part = &address[2..];
        let all_lower = hex_part.chars().all(|c| !c.is_ascii_uppercase());
        let all_upper = hex_part.chars().all(|c| !c.is_ascii_lowercase());
        all_lower || all_upper || to_checksum_address(&bytes)[2..] == *hex_part
    }
}
