//! Internet Computer addresses
//!
//! The self-authenticating principal is SHA-224 over the DER-encoded key
//! plus a 0x02 type byte; its text form is CRC32-prefixed, lowercase base32,
//! dash-grouped by five. The ledger account identifier hashes the principal
//! with the default subaccount and is shown as hex.

use super::{require_curve, AddressProvider};
use crate::error::{AddressError, AddressResult};
use crate::types::{Address, AddressType, Curve, PublicKey};
use crate::utils::crypto::{decompress_secp256k1, sha224};

/// DER SubjectPublicKeyInfo header for an uncompressed secp256k1 point.
const SECP256K1_DER_PREFIX: [u8; 23] = [
    0x30, 0x56, 0x30, 0x10, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x05, 0x2b,
    0x81, 0x04, 0x00, 0x0a, 0x03, 0x42, 0x00,
];

const SELF_AUTHENTICATING_TAG: u8 = 0x02;
const ACCOUNT_DOMAIN_SEPARATOR: &[u8] = b"\x0Aaccount-id";

#[derive(Debug, Clone, Default)]
pub struct InternetComputerAddressProvider;

pub fn der_encode_public_key(public_key: &[u8]) -> AddressResult<Vec<u8>> {
    let mut der = SECP256K1_DER_PREFIX.to_vec();
    der.extend_from_slice(&decompress_secp256k1(public_key)?);
    Ok(der)
}

pub fn principal_from_public_key(public_key: &[u8]) -> AddressResult<Vec<u8>> {
    let mut principal = sha224(&der_encode_public_key(public_key)?).to_vec();
    principal.push(SELF_AUTHENTICATING_TAG);
    Ok(principal)
}

pub fn principal_to_text(principal: &[u8]) -> String {
    let mut data = crc32fast::hash(principal).to_be_bytes().to_vec();
    data.extend_from_slice(principal);
    let encoded = data_encoding::BASE32_NOPAD.encode(&data).to_lowercase();
    encoded
        .as_bytes()
        .chunks(5)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("-")
}

pub fn principal_from_text(text: &str) -> AddressResult<Vec<u8>> {
    let invalid = || AddressError::InvalidAddress(text.to_string());
    let compact = text.replace('-', "").to_uppercase();
    let decoded = data_encoding::BASE32_NOPAD
        .decode(compact.as_bytes())
        .map_err(|_| invalid())?;
    if decoded.len() < 5 {
        return Err(invalid());
    }
    let (checksum, principal) = decoded.split_at(4);
    if crc32fast::hash(principal).to_be_bytes() != checksum || principal_to_text(principal) != text {
        return Err(invalid());
    }
    Ok(principal.to_vec())
}

/// 32-byte ledger account identifier for the default subaccount.
pub fn account_identifier(principal: &[u8]) -> [u8; 32] {
    let mut preimage = ACCOUNT_DOMAIN_SEPARATOR.to_vec();
    preimage.extend_from_slice(principal);
    preimage.extend_from_slice(&[0u8; 32]);
    let hash = sha224(&preimage);

    let mut account = [0u8; 32];
    account[..4].copy_from_slice(&crc32fast::hash(&hash).to_be_bytes());
    account[4..].copy_from_slice(&hash);
    account
}

pub fn decode_account_identifier(address: &str) -> AddressResult<[u8; 32]> {
    let invalid = || AddressError::InvalidAddress(address.to_string());
    let bytes = hex::decode(address).map_err(|_| invalid())?;
    let account: [u8; 32] = bytes.try_into().map_err(|_| invalid())?;
    if crc32fast::hash(&account[4..]).to_be_bytes() != account[..4] {
        return Err(invalid());
    }
    Ok(account)
}

impl AddressProvider for InternetComputerAddressProvider {
    /// `Default` is the ledger account identifier; `Legacy` is the principal text.
    fn make_address(&self, public_key: &PublicKey, address_type: AddressType) -> AddressResult<Address> {
        require_curve(public_key, Curve::Secp256k1, "internet-computer")?;
        if address_type == AddressType::Script {
            return Err(AddressError::UnsupportedAddressType {
                address_type,
                chain: "internet-computer".into(),
            });
        }
        let principal = principal_from_public_key(&public_key.bytes)?;
        let value = match address_type {
            AddressType::Legacy => principal_to_text(&principal),
            _ => hex::encode(account_identifier(&principal)),
        };
        Ok(Address::new(value, public_key.clone(), address_type))
    }

    fn validate(&self, address: &str) -> bool {
        decode_account_identifier(address).is_ok() || principal_from_text(address).is_ok()
    }

    fn make_addresses(&self, public_key: &PublicKey) -> AddressResult<Vec<Address>> {
        Ok(vec![
            self.make_address(public_key, AddressType::Default)?,
            self.make_address(public_key, AddressType::Legacy)?,
        ])
    }
}
