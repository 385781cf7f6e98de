//! Bitcoin-family addresses
//!
//! - Legacy: Base58Check(version || HASH160(key as given))
//! - Default: bech32 v0 witness program over HASH160(compressed key)
//! - Script: M-of-N multisig, encoded as both P2SH and P2WSH

use bech32::{u5, FromBase32, ToBase32, Variant};

use super::{require_curve, AddressProvider};
use crate::codec::base58;
use crate::error::{AddressError, AddressResult};
use crate::types::{Address, AddressType, Curve, PublicKey};
use crate::utils::chain_config::UtxoNetwork;
use crate::utils::crypto::{compress_secp256k1, hash160, parse_secp256k1, sha256};

const OP_0: u8 = 0x00;
const OP_1: u8 = 0x51;
const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;
const OP_CHECKMULTISIG: u8 = 0xae;

#[derive(Debug, Clone)]
pub struct BitcoinAddressProvider {
    network: UtxoNetwork,
}

impl BitcoinAddressProvider {
    pub fn new(network: UtxoNetwork) -> Self {
        Self { network }
    }

    pub fn network(&self) -> &UtxoNetwork {
        &self.network
    }

    fn legacy(&self, public_key: &PublicKey) -> AddressResult<Address> {
        parse_secp256k1(&public_key.bytes)?;
        let key_hash = hash160(&public_key.bytes);
        let mut payload = vec![self.network.p2pkh_version];
        payload.extend_from_slice(&key_hash);
        Ok(Address::new(base58::encode_check(&payload), public_key.clone(), AddressType::Legacy)
            .with_locking_script(p2pkh_script(&key_hash)))
    }

    fn segwit(&self, public_key: &PublicKey) -> AddressResult<Address> {
        let key_hash = hash160(&compress_secp256k1(&public_key.bytes)?);
        let value = self.encode_witness(0, &key_hash)?;
        Ok(Address::new(value, public_key.clone(), AddressType::Default)
            .with_locking_script(witness_script(0, &key_hash)))
    }

    fn encode_witness(&self, version: u8, program: &[u8]) -> AddressResult<String> {
        let mut data = vec![u5::try_from_u8(version).map_err(|e| AddressError::InvalidAddress(e.to_string()))?];
        data.extend(program.to_base32());
        let variant = if version == 0 { Variant::Bech32 } else { Variant::Bech32m };
        bech32::encode(&self.network.bech32_hrp, data, variant)
            .map_err(|e| AddressError::InvalidAddress(e.to_string()))
    }

    /// Multisig addresses for `required`-of-`keys.len()` signers.
    ///
    /// Keys are compressed and sorted first, so the input order does not
    /// matter. Returns `[legacy P2SH, segwit P2WSH]`, both carrying the
    /// redeem script as their locking script.
    pub fn make_multisig_addresses(&self, keys: &[PublicKey], required: usize) -> AddressResult<Vec<Address>> {
        let first = keys
            .first()
            .ok_or_else(|| AddressError::InvalidKey("no keys for multisig".into()))?;
        if required == 0 || required > keys.len() || keys.len() > 16 {
            return Err(AddressError::InvalidKey(format!(
                "unsupported multisig {}-of-{}",
                required,
                keys.len()
            )));
        }

        let mut compressed = Vec::with_capacity(keys.len());
        for key in keys {
            require_curve(key, Curve::Secp256k1, "bitcoin")?;
            compressed.push(compress_secp256k1(&key.bytes)?);
        }
        compressed.sort();

        let mut redeem_script = vec![OP_1 + (required as u8 - 1)];
        for key in &compressed {
            redeem_script.push(key.len() as u8);
            redeem_script.extend_from_slice(key);
        }
        redeem_script.push(OP_1 + (compressed.len() as u8 - 1));
        redeem_script.push(OP_CHECKMULTISIG);

        let mut payload = vec![self.network.p2sh_version];
        payload.extend_from_slice(&hash160(&redeem_script));
        let legacy = Address::new(base58::encode_check(&payload), first.clone(), AddressType::Legacy)
            .with_locking_script(redeem_script.clone());

        let script_hash = sha256(&redeem_script);
        let segwit = Address::new(self.encode_witness(0, &script_hash)?, first.clone(), AddressType::Script)
            .with_locking_script(redeem_script);

        Ok(vec![legacy, segwit])
    }

    /// Output script paying to `address`.
    pub fn script_pubkey(&self, address: &str) -> AddressResult<Vec<u8>> {
        if let Some((version, program)) = self.decode_witness(address) {
            return Ok(witness_script(version, &program));
        }
        let payload = base58::decode_check(address)
            .filter(|p| p.len() == 21)
            .ok_or_else(|| AddressError::InvalidAddress(address.to_string()))?;
        let hash = &payload[1..];
        if payload[0] == self.network.p2pkh_version {
            Ok(p2pkh_script(hash))
        } else if payload[0] == self.network.p2sh_version {
            let mut script = vec![OP_HASH160, 0x14];
            script.extend_from_slice(hash);
            script.push(OP_EQUAL);
            Ok(script)
        } else {
            Err(AddressError::InvalidAddress(address.to_string()))
        }
    }

    fn decode_witness(&self, address: &str) -> Option<(u8, Vec<u8>)> {
        let (hrp, data, variant) = bech32::decode(address).ok()?;
        if hrp != self.network.bech32_hrp {
            return None;
        }
        let (version, program) = data.split_first()?;
        let version = version.to_u8();
        let program = Vec::<u8>::from_base32(program).ok()?;
        let expected = if version == 0 { Variant::Bech32 } else { Variant::Bech32m };
        let length_ok = match version {
            0 => program.len() == 20 || program.len() == 32,
            1..=16 => (2..=40).contains(&program.len()),
            _ => false,
        };
        (variant == expected && length_ok).then_some((version, program))
    }
}

impl AddressProvider for BitcoinAddressProvider {
    /// `Script` for a single key is its 1-of-1 P2WSH address. The P2SH
    /// form of the same script comes from `make_multisig_addresses`.
    fn make_address(&self, public_key: &PublicKey, address_type: AddressType) -> AddressResult<Address> {
        require_curve(public_key, Curve::Secp256k1, "bitcoin")?;
        match address_type {
            AddressType::Default => self.segwit(public_key),
            AddressType::Legacy => self.legacy(public_key),
            AddressType::Script => self
                .make_multisig_addresses(std::slice::from_ref(public_key), 1)?
                .into_iter()
                .find(|address| address.address_type == AddressType::Script)
                .ok_or_else(|| AddressError::InvalidKey("multisig derivation failed".into())),
        }
    }

    fn validate(&self, address: &str) -> bool {
        self.script_pubkey(address).is_ok()
    }

    fn make_addresses(&self, public_key: &PublicKey) -> AddressResult<Vec<Address>> {
        Ok(vec![
            self.make_address(public_key, AddressType::Default)?,
            self.make_address(public_key, AddressType::Legacy)?,
        ])
    }
}

pub(crate) fn p2pkh_script(key_hash: &[u8]) -> Vec<u8> {
    let mut script = vec![OP_DUP, OP_HASH160, 0x14];
    script.extend_from_slice(key_hash);
    script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    script
}

fn witness_script(version: u8, program: &[u8]) -> Vec<u8> {
    let op = if version == 0 { OP_0 } else { OP_1 + version - 1 };
    let mut script = vec![op, program.len() as u8];
    script.extend_from_slice(program);
    script
}
