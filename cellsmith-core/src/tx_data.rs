//! Mutable transaction under assembly
//!
//! Packed transactions are immutable, so the builder edits plain vectors
//! and packs a [`TransactionView`] whenever it needs a size or a result.

use ckb_types::{
    bytes::Bytes,
    core::{TransactionBuilder, TransactionView},
    packed::{self, Byte32, CellDep, CellInput, CellOutput},
    prelude::*,
};

#[derive(Debug, Clone, Default)]
pub(crate) struct TxData {
    pub(crate) cell_deps: Vec<CellDep>,
    pub(crate) header_deps: Vec<Byte32>,
    pub(crate) inputs: Vec<CellInput>,
    pub(crate) outputs: Vec<CellOutput>,
    pub(crate) outputs_data: Vec<packed::Bytes>,
    pub(crate) witnesses: Vec<packed::Bytes>,
}

impl TxData {
    pub(crate) fn add_cell_dep(&mut self, dep: &CellDep) {
        if !self.cell_deps.contains(dep) {
            self.cell_deps.push(dep.clone());
        }
    }

    /// Spend `input` with an empty witness slot
    pub(crate) fn push_input(&mut self, input: CellInput) -> usize {
        self.inputs.push(input);
        self.witnesses.push(Bytes::new().pack());
        self.inputs.len() - 1
    }

    pub(crate) fn push_output(&mut self, output: CellOutput, data: &Bytes) -> usize {
        self.outputs.push(output);
        self.outputs_data.push(data.pack());
        self.outputs.len() - 1
    }

    pub(crate) fn pop_output(&mut self) {
        self.outputs.pop();
        self.outputs_data.pop();
    }

    pub(crate) fn output_capacity(&self, index: usize) -> Option<u64> {
        let output = self.outputs.get(index)?;
        Some(output.capacity().unpack())
    }

    /// Sum of output capacities, `None` on overflow
    pub(crate) fn outputs_capacity(&self) -> Option<u64> {
        self.outputs.iter().try_fold(0u64, |acc, o| {
            let capacity: u64 = o.capacity().unpack();
            acc.checked_add(capacity)
        })
    }

    pub(crate) fn build_tx_view(&self) -> TransactionView {
        TransactionBuilder::default()
            .cell_deps(self.cell_deps.clone())
            .header_deps(self.header_deps.clone())
            .inputs(self.inputs.clone())
            .outputs(self.outputs.clone())
            .outputs_data(self.outputs_data.clone())
            .witnesses(self.witnesses.clone())
            .build()
    }
}
