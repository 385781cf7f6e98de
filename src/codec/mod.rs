//! Wire Codecs
//!
//! Hand-written encoders for the serialization formats the supported chains
//! sign over. Each is only as complete as the transactions built here need.

pub mod base58;
pub mod cbor;
pub mod clvm;
pub mod protobuf;
pub mod rlp;
