//! Chia addresses
//!
//! The address is the bech32m encoding of the tree hash of the standard
//! transaction puzzle curried with the wallet's BLS public key.

use bech32::{FromBase32, ToBase32, Variant};

use super::{require_curve, require_type, AddressProvider};
use crate::codec::clvm::Program;
use crate::error::{AddressError, AddressResult};
use crate::types::{Address, AddressType, Curve, PublicKey};

/// Standard puzzle up to the curried key's atom header (`b0` = 48-byte atom).
const STANDARD_PUZZLE_PREFIX: &str = "ff02ffff01ff02ffff01ff04ffff04ff04ffff04ff05ffff04ffff02ff06ffff04ff02ffff04ff0bff80808080ff80808080ff0b80ffff04ffff01ff32ff02ffff03ffff07ff0580ffff01ff0bffff0102ffff02ff06ffff04ff02ffff04ff09ff80808080ffff02ff06ffff04ff02ffff04ff0dff8080808080ffff01ff0bffff0101ff058080ff0180ff018080ffff04ffff01b0";
const STANDARD_PUZZLE_SUFFIX: &str = "ff018080";

pub const BLS_PUBLIC_KEY_LEN: usize = 48;

#[derive(Debug, Clone)]
pub struct ChiaAddressProvider {
    hrp: &'static str,
}

impl ChiaAddressProvider {
    pub fn new(testnet: bool) -> Self {
        Self {
            hrp: if testnet { "txch" } else { "xch" },
        }
    }

    /// 32-byte puzzle hash behind `address`.
    pub fn decode_puzzle_hash(&self, address: &str) -> AddressResult<[u8; 32]> {
        let invalid = || AddressError::InvalidAddress(address.to_string());
        let (hrp, data, variant) = bech32::decode(address).map_err(|_| invalid())?;
        if hrp != self.hrp || variant != Variant::Bech32m {
            return Err(invalid());
        }
        let bytes = Vec::<u8>::from_base32(&data).map_err(|_| invalid())?;
        bytes.try_into().map_err(|_| invalid())
    }

    pub fn encode_puzzle_hash(&self, puzzle_hash: &[u8; 32]) -> AddressResult<String> {
        bech32::encode(self.hrp, puzzle_hash.to_base32(), Variant::Bech32m)
            .map_err(|e| AddressError::InvalidAddress(e.to_string()))
    }
}

/// Serialized standard puzzle for a 48-byte BLS key.
pub fn standard_puzzle(public_key: &[u8]) -> AddressResult<Vec<u8>> {
    let key: [u8; BLS_PUBLIC_KEY_LEN] = public_key
        .try_into()
        .map_err(|_| AddressError::InvalidKey(format!("expected 48 bytes, got {}", public_key.len())))?;
    chia_bls::PublicKey::from_bytes(&key).map_err(|e| AddressError::InvalidKey(e.to_string()))?;

    let mut puzzle = hex::decode(STANDARD_PUZZLE_PREFIX).map_err(|e| AddressError::InvalidKey(e.to_string()))?;
    puzzle.extend_from_slice(&key);
    puzzle.extend(hex::decode(STANDARD_PUZZLE_SUFFIX).map_err(|e| AddressError::InvalidKey(e.to_string()))?);
    Ok(puzzle)
}

pub fn standard_puzzle_hash(public_key: &[u8]) -> AddressResult<[u8; 32]> {
    let puzzle = standard_puzzle(public_key)?;
    let program = Program::deserialize(&puzzle).map_err(|e| AddressError::InvalidKey(e.to_string()))?;
    Ok(program.tree_hash())
}

impl AddressProvider for ChiaAddressProvider {
    fn make_address(&self, public_key: &PublicKey, address_type: AddressType) -> AddressResult<Address> {
        require_type(address_type, &[AddressType::Default], "chia")?;
        require_curve(public_key, Curve::Bls, "chia")?;
        let puzzle_hash = standard_puzzle_hash(&public_key.bytes)?;
        Ok(Address::new(
            self.encode_puzzle_hash(&puzzle_hash)?,
            public_key.clone(),
            AddressType::Default,
        ))
    }

    fn validate(&self, address: &str) -> bool {
        self.decode_puzzle_hash(address).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testnet_address() {
        let pk = PublicKey::bls(
            hex::decode("b8f7dd239557ff8c49d338f89ac1a258a863fa52cd0a502e3aaae4b6738ba39ac8d982215aa3fa16bc5f8cb7e44b954d").unwrap(),
        );
        let provider = ChiaAddressProvider::new(true);
        let address = provider.make_address(&pk, AddressType::Default).unwrap();
        assert_eq!(address.value, "txch14gxuvfmw2xdxqnws5agt3ma483wktd2lrzwvpj3f6jvdgkmf5gtq8g3aw3");
        assert!(provider.validate(&address.value));
        assert!(!ChiaAddressProvider::new(false).validate(&address.value));
    }

    #[test]
    fn test_puzzle_hash_matches_coin() {
        let pk = hex::decode("8FAC07255C7F3FE670E21E49CC5E70328F4181440A535CC18CF369FD280BA18FA26E28B52035717DB29BFF67105894B2").unwrap();
        assert_eq!(
            hex::encode(standard_puzzle_hash(&pk).unwrap()),
            "9488ae2f6f0d2655aca94c6e658fdc31bd2217f74d676407112c0558d3d217d2"
        );
    }

    #[test]
    fn test_decode_destination() {
        let provider = ChiaAddressProvider::new(false);
        let hash = provider
            .decode_puzzle_hash("xch1g36l3auawuejw3nvq08p29lw4wst4qrq9hddvtn9vv9nz822avgsrwte2v")
            .unwrap();
        assert_eq!(hex::encode(hash), "4475f8f79d773327466c03ce1517eeaba0ba80602ddad62e65630b311d4aeb11");
    }

    #[test]
    fn test_rejects_secp_key() {
        let pk = PublicKey::secp256k1(vec![2; 33]);
        assert!(matches!(
            ChiaAddressProvider::new(false).make_address(&pk, AddressType::Default),
            Err(AddressError::UnsupportedCurve { .. })
        ));
    }
}
