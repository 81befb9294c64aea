//! CKB network parameters and constants
//!
//! This crate provides network-specific system cells, consensus constants
//! and fee-rate bounds used by the transaction assembly engine.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod consensus;
pub mod network;

pub use consensus::{
    DEFAULT_FEE_RATE, MAX_FEE_RATE, MIN_FEE_RATE, SECP256K1_BLAKE160_CODE_HASH,
    SECP256K1_SIGNATURE_SIZE, SHANNONS_PER_CKB, TYPE_ID_CODE_HASH,
};
pub use network::{Network, NetworkType, SystemCell};

/// Error types for parameter operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid network specified
    #[error("Invalid network: {0}")]
    InvalidNetwork(String),
}

/// Result type for parameter operations
pub type Result<T> = std::result::Result<T, Error>;
