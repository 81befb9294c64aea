//! Signing and submission seams
//!
//! Key handling and broadcasting live outside the engine. A signer is
//! handed each script group of a build result and returns the signature
//! for the group's witness; a submitter accepts the finished transaction.

use ckb_types::{
    bytes::Bytes,
    core::TransactionView,
    packed::{self, WitnessArgs},
    prelude::*,
    H256,
};

use crate::script_group::{ScriptGroup, ScriptGroupType};
use crate::transaction::TransactionWithScriptGroups;
use crate::{Error, Result};

/// Produces signatures for the lock groups it controls
pub trait ScriptGroupSigner {
    /// Whether this signer can sign `group`
    fn matches(&self, group: &ScriptGroup) -> bool;

    /// Signature for `group`, placed in the lock field of its witness
    fn sign(&self, tx: &TransactionView, group: &ScriptGroup) -> Result<Bytes>;
}

/// Accepts a finished transaction
pub trait TransactionSubmitter {
    /// Send `tx`, returning its hash
    fn send_transaction(&self, tx: &TransactionView) -> Result<H256>;
}

impl TransactionWithScriptGroups {
    /// Sign every lock group `signer` matches; returns the signed group indices
    pub fn sign_with<S>(&mut self, signer: &S) -> Result<Vec<usize>>
    where
        S: ScriptGroupSigner + ?Sized,
    {
        let mut witnesses: Vec<packed::Bytes> = self.tx_view.witnesses().into_iter().collect();
        let mut signed = Vec::new();
        for (index, group) in self.script_groups.iter().enumerate() {
            if group.group_type != ScriptGroupType::Lock || !signer.matches(group) {
                continue;
            }
            let witness_index = group.first_input_index().ok_or_else(|| {
                Error::Signing(format!("Lock group {} covers no inputs", index))
            })?;

            let signature = signer.sign(&self.tx_view, group)?;
            let witness = witnesses
                .get_mut(witness_index)
                .ok_or_else(|| Error::Signing(format!("Missing witness {}", witness_index)))?;
            *witness = WitnessArgs::new_builder()
                .lock(Some(signature).pack())
                .build()
                .as_bytes()
                .pack();

            tracing::debug!("Signed lock group {} at witness {}", index, witness_index);
            signed.push(index);
        }

        if !signed.is_empty() {
            self.tx_view = self
                .tx_view
                .as_advanced_builder()
                .set_witnesses(witnesses)
                .build();
        }
        Ok(signed)
    }

    /// Hand the transaction to `submitter`
    pub fn submit<T>(&self, submitter: &T) -> Result<H256>
    where
        T: TransactionSubmitter + ?Sized,
    {
        submitter.send_transaction(&self.tx_view)
    }
}
