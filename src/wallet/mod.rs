//! Wallet Module
//!
//! Strategy selection per chain, the network boundary, and the per-wallet
//! manager that drives refresh and send.

pub mod factory;
pub mod manager;
pub mod provider;

pub use factory::WalletFactory;
pub use manager::{PendingTransaction, WalletManager, WalletState};
pub use provider::{AccountSnapshot, NetworkProvider, NetworkResult};
