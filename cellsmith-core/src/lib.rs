//! Cellsmith core
//!
//! This crate implements the CKB transaction assembly engine: capacity and
//! fee rules, incremental input selection, change policy, Type-Id
//! assignment and script grouping for external signers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capacity;
pub mod config;
pub mod error;
pub mod fees;
pub mod handler;
pub mod hash;
pub mod input;
mod json;
pub mod script_group;
mod selection;
pub mod signer;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
pub mod transaction;
mod tx_data;
pub mod type_id;

pub use capacity::{ckb_to_shannons, occupied_capacity, validate_output};
pub use config::{ConfigurationBuilder, TransactionBuilderConfiguration};
pub use error::{Error, ErrorCategory, Result};
pub use fees::{estimate_fee, FeeCalculator};
pub use handler::{dep_group, secp256k1_blake160_lock, LockAuthority, ScriptHandler};
pub use input::{CandidateInput, FallibleInputs, InputSource};
pub use script_group::{ScriptGroup, ScriptGroupRegistry, ScriptGroupType};
pub use signer::{ScriptGroupSigner, TransactionSubmitter};
pub use transaction::{
    build, ChangeOutput, ChangePolicy, OutputRequest, TransactionRequest,
    TransactionWithScriptGroups,
};

// Ledger types used throughout the public API
pub use ckb_types;
