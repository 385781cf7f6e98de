//! Address Derivation and Validation
//!
//! One `AddressProvider` per chain family. Derivation is pure: the same
//! public key and network parameters always give the same string, and that
//! string always passes the same provider's `validate`.

pub mod bitcoin;
pub mod chia;
pub mod ethereum;
pub mod internet_computer;
pub mod koinos;
pub mod tron;

pub use self::bitcoin::BitcoinAddressProvider;
pub use self::chia::ChiaAddressProvider;
pub use self::ethereum::EthereumAddressProvider;
pub use self::internet_computer::InternetComputerAddressProvider;
pub use self::koinos::KoinosAddressProvider;
pub use self::tron::TronAddressProvider;

use crate::error::{AddressError, AddressResult};
use crate::types::{Address, AddressType, Curve, PublicKey};

pub trait AddressProvider: Send + Sync {
    fn make_address(&self, public_key: &PublicKey, address_type: AddressType) -> AddressResult<Address>;

    fn validate(&self, address: &str) -> bool;

    /// Every address type the chain shows for a single key.
    fn make_addresses(&self, public_key: &PublicKey) -> AddressResult<Vec<Address>> {
        Ok(vec![self.make_address(public_key, AddressType::Default)?])
    }
}

/// Reject address types the chain does not have.
pub(crate) fn require_type(address_type: AddressType, supported: &[AddressType], chain: &str) -> AddressResult<()> {
    if supported.contains(&address_type) {
        return Ok(());
    }
    Err(AddressError::UnsupportedAddressType {
        address_type,
        chain: chain.to_string(),
    })
}

/// Reject keys on a curve the chain does not sign with.
pub(crate) fn require_curve(public_key: &PublicKey, curve: Curve, chain: &str) -> AddressResult<()> {
    if public_key.curve != curve {
        return Err(AddressError::UnsupportedCurve {
            curve: public_key.curve,
            chain: chain.to_string(),
        });
    }
    if public_key.bytes.is_empty() {
        return Err(AddressError::InvalidKey("empty public key".into()));
    }
    Ok(())
}
