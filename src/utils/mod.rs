//! Utilities Module
//!
//! Hashing and curve helpers, chain configuration, and redacting logging.

pub mod chain_config;
pub mod crypto;
pub mod logging;
