//! Koinos addresses: Base58Check(0x00 || HASH160(compressed key))

use super::{require_curve, require_type, AddressProvider};
use crate::codec::base58;
use crate::error::{AddressError, AddressResult};
use crate::types::{Address, AddressType, Curve, PublicKey};
use crate::utils::crypto::{compress_secp256k1, hash160};

#[derive(Debug, Clone, Default)]
pub struct KoinosAddressProvider;

impl KoinosAddressProvider {
    /// Raw 25-byte form (version, hash, checksum) used inside operations.
    pub fn decode(address: &str) -> AddressResult<Vec<u8>> {
        let invalid = || AddressError::InvalidAddress(address.to_string());
        let raw = bs58::decode(address).into_vec().map_err(|_| invalid())?;
        if raw.len() != 25 || raw[0] != 0x00 || base58::decode_check(address).is_none() {
            return Err(invalid());
        }
        Ok(raw)
    }
}

impl AddressProvider for KoinosAddressProvider {
    fn make_address(&self, public_key: &PublicKey, address_type: AddressType) -> AddressResult<Address> {
        require_type(address_type, &[AddressType::Default], "koinos")?;
        require_curve(public_key, Curve::Secp256k1, "koinos")?;
        let mut payload = vec![0x00];
        payload.extend_from_slice(&hash160(&compress_secp256k1(&public_key.bytes)?));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_uses_compressed_key() {
        let pk = PublicKey::secp256k1(
            hex::decode("0441DCD64B5F4A039FC339A16300A833A883B218909F2EBCAF3906651C76842C45E3D67E8D2947E6FEE8B62D3D3B6A4D5F212DA23E478DD69A2C6CCC851F300D80").unwrap(),
        );
        let address = KoinosAddressProvider.make_address(&pk, AddressType::Default).unwrap();
        assert_eq!(address.value, "1JjXGY5KEcbT35uAo6P9A7DebBn4DXnjdQ");
    }

    #[test]
    fn test_contract_id_decodes() {
        let raw = KoinosAddressProvider::decode("15DJN4a8SgrbGhhGksSBASiSYjGnMU8dGL").unwrap();
        assert_eq!(hex::encode(raw), "002e33fd1aa907b224ce9ce6c94228901d283a02da956da791");
        assert!(!KoinosAddressProvider.validate("TL51KaL2EPoAnPLgnzdZndaTLEbd1P5UzV"));
    }
}
