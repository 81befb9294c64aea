//! Script handlers
//!
//! The set of special script semantics is fixed by protocol rules, so
//! handlers are a closed enum dispatched at two points of a build:
//! - when a lock group is first created (cell deps, witness placeholder)
//! - once inputs are final (Type-Id)

use cellsmith_params::{
    Network, SystemCell, SECP256K1_BLAKE160_CODE_HASH, SECP256K1_SIGNATURE_SIZE,
};
use ckb_types::{
    bytes::Bytes,
    core::{DepType, ScriptHashType},
    packed::{self, Byte32, CellDep, OutPoint, Script, WitnessArgs},
    prelude::*,
    H256,
};

use crate::script_group::{ScriptGroup, ScriptGroupType};
use crate::tx_data::TxData;
use crate::type_id;
use crate::Result;

/// secp256k1-blake160-sighash-all lock for the given pubkey hash
pub fn secp256k1_blake160_lock(pubkey_hash: [u8; 20]) -> Script {
    Script::new_builder()
        .code_hash(H256(SECP256K1_BLAKE160_CODE_HASH).pack())
        .hash_type(ScriptHashType::Type.into())
        .args(Bytes::from(pubkey_hash.to_vec()).pack())
        .build()
}

/// Dep on a genesis dep group
pub fn dep_group(cell: SystemCell) -> CellDep {
    CellDep::new_builder()
        .out_point(OutPoint::new(H256(cell.tx_hash).pack(), cell.index))
        .dep_type(DepType::DepGroup.into())
        .build()
}

/// An unlocking authority the builder knows how to prepare for signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockAuthority {
    /// Code hash of the lock
    pub code_hash: Byte32,
    /// Hash type of the lock
    pub hash_type: ScriptHashType,
    /// Deps the lock needs at verification time
    pub cell_deps: Vec<CellDep>,
    /// Length of the signature placed in `WitnessArgs.lock`
    pub witness_lock_len: usize,
}

impl LockAuthority {
    /// secp256k1-blake160-sighash-all, the default single-signature lock
    pub fn secp256k1_blake160_sighash_all(network: &Network) -> Self {
        Self {
            code_hash: H256(SECP256K1_BLAKE160_CODE_HASH).pack(),
            hash_type: ScriptHashType::Type,
            cell_deps: vec![dep_group(network.secp256k1_dep_group)],
            witness_lock_len: SECP256K1_SIGNATURE_SIZE,
        }
    }

    /// Whether `script` is governed by this authority
    pub fn matches(&self, script: &Script) -> bool {
        let hash_type: packed::Byte = self.hash_type.into();
        script.code_hash() == self.code_hash && script.hash_type() == hash_type
    }

    /// Placeholder witness sized to this authority's signature
    pub fn placeholder_witness(&self) -> packed::Bytes {
        WitnessArgs::new_builder()
            .lock(Some(Bytes::from(vec![0u8; self.witness_lock_len])).pack())
            .build()
            .as_bytes()
            .pack()
    }
}

/// Handler variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptHandler {
    /// Prepares lock groups of one authority
    Lock(LockAuthority),
    /// Assigns Type-Id args after input selection
    TypeId,
}

impl ScriptHandler {
    /// Default handlers for `network`
    pub fn defaults(network: &Network) -> Vec<ScriptHandler> {
        vec![
            ScriptHandler::Lock(LockAuthority::secp256k1_blake160_sighash_all(network)),
            ScriptHandler::TypeId,
        ]
    }

    /// Prepare a newly created lock group; returns whether this handler claimed it
    pub(crate) fn on_lock_group(&self, tx: &mut TxData, group: &ScriptGroup) -> bool {
        let ScriptHandler::Lock(authority) = self else {
            return false;
        };
        if group.group_type != ScriptGroupType::Lock || !authority.matches(&group.script) {
            return false;
        }

        for dep in &authority.cell_deps {
            tx.add_cell_dep(dep);
        }
        if let Some(witness) = group
            .first_input_index()
            .and_then(|i| tx.witnesses.get_mut(i))
        {
            *witness = authority.placeholder_witness();
        }
        true
    }

    /// Apply post-selection rewrites
    pub(crate) fn after_selection(&self, tx: &mut TxData) -> Result<()> {
        match self {
            ScriptHandler::Lock(_) => Ok(()),
            ScriptHandler::TypeId => type_id::assign_type_ids(tx).map(|_| ()),
        }
    }
}
