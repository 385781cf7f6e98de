//! Tron addresses: Base58Check(0x41 || keccak256(uncompressed)[12..])

use super::ethereum::keccak_address_bytes;
use super::{require_curve, require_type, AddressProvider};
use crate::codec::base58;
use crate::error::{AddressError, AddressResult};
use crate::types::{Address, AddressType, Curve, PublicKey};

pub const TRON_ADDRESS_PREFIX: u8 = 0x41;

#[derive(Debug, Clone, Default)]
pub struct TronAddressProvider;

impl TronAddressProvider {
    /// 21-byte form (`0x41` prefix included) used inside transactions.
    pub fn decode(address: &str) -> AddressResult<Vec<u8>> {
        base58::decode_check(address)
            .filter(|payload| payload.len() == 21 && payload[0] == TRON_ADDRESS_PREFIX)
            .ok_or_else(|| AddressError::InvalidAddress(address.to_string()))
    }
}

impl AddressProvider for TronAddressProvider {
    fn make_address(&self, public_key: &PublicKey, address_type: AddressType) -> AddressResult<Address> {
        require_type(address_type, &[AddressType::Default], "tron")?;
        require_curve(public_key, Curve::Secp256k1, "tron")?;
        let mut payload = vec![TRON_ADDRESS_PREFIX];
        payload.extend_from_slice(&keccak_address_bytes(&public_key.bytes)?);
        Ok(Address::new(
            base58::encode_check(&payload),
            public_key.clone(),
            AddressType::Default,
        ))
    }

    fn validate(&self, address: &str) -> bool {
        Self::decode(address).is_ok()
    }
}
