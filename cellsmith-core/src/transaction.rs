//! Transaction assembly
//!
//! [`TransactionRequest`] collects validated outputs and the change policy;
//! [`build`] pulls candidates until the transaction balances, applies the
//! post-selection handlers and returns the transaction together with the
//! script groups a signer needs.

use ckb_types::{
    bytes::Bytes,
    core::TransactionView,
    packed::{Byte32, CellDep, CellOutput, Script},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::capacity::{occupied_capacity, validate_output};
use crate::config::TransactionBuilderConfiguration;
use crate::fees::FeeCalculator;
use crate::input::{CandidateInput, ChainedSource, InputSource};
use crate::script_group::{GroupMember, ScriptGroup, ScriptGroupRegistry, ScriptGroupType};
use crate::selection::{self, Balance, BalanceState, ChangeQuote, Targets};
use crate::tx_data::TxData;
use crate::type_id;
use crate::{Error, Result};

/// An output the caller wants created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRequest {
    /// Capacity in shannons; `None` means the minimum legal capacity
    #[serde(default, with = "crate::json::capacity_opt")]
    pub capacity: Option<u64>,
    /// Lock script
    #[serde(with = "crate::json::script")]
    pub lock: Script,
    /// Optional type script
    #[serde(rename = "type", default, with = "crate::json::script_opt")]
    pub type_: Option<Script>,
    /// Cell data
    #[serde(default, with = "crate::json::bytes")]
    pub data: Bytes,
}

impl OutputRequest {
    /// Output of `capacity` shannons locked by `lock`
    pub fn new(lock: Script, capacity: u64) -> Self {
        Self {
            capacity: Some(capacity),
            lock,
            type_: None,
            data: Bytes::new(),
        }
    }

    /// Output holding exactly its occupied capacity
    pub fn minimum(lock: Script) -> Self {
        Self {
            capacity: None,
            lock,
            type_: None,
            data: Bytes::new(),
        }
    }

    /// Attach a type script
    pub fn with_type(mut self, type_script: Script) -> Self {
        self.type_ = Some(type_script);
        self
    }

    /// Attach cell data
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    fn into_cell(self) -> Result<(CellOutput, Bytes)> {
        let output = provisional_cell(self.lock, self.type_);
        let capacity = match self.capacity {
            Some(capacity) => capacity,
            None => occupied_capacity(&output, self.data.len())?,
        };
        let output = output.as_builder().capacity(capacity.pack()).build();
        validate_output(&output, &self.data)?;
        Ok((output, self.data))
    }
}

/// Zero-capacity cell with any Type-Id request padded to full length
fn provisional_cell(lock: Script, type_: Option<Script>) -> CellOutput {
    CellOutput::new_builder()
        .lock(lock)
        .type_(type_.map(type_id::normalize_request).pack())
        .build()
}

/// Where surplus capacity goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangePolicy {
    /// Return surplus in a change output of this shape
    Output(ChangeOutput),
    /// Emit no change output; all surplus is fee
    SurplusAsFee,
}

/// Shape of the change output; its capacity is decided by the build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOutput {
    /// Lock script
    #[serde(with = "crate::json::script")]
    pub lock: Script,
    /// Optional type script
    #[serde(rename = "type", default, with = "crate::json::script_opt")]
    pub type_: Option<Script>,
    /// Cell data
    #[serde(default, with = "crate::json::bytes")]
    pub data: Bytes,
}

impl ChangeOutput {
    /// Plain change output locked by `lock`
    pub fn new(lock: Script) -> Self {
        Self {
            lock,
            type_: None,
            data: Bytes::new(),
        }
    }
}

/// Outputs, pinned inputs and change policy for one build
#[derive(Debug, Clone, Default)]
pub struct TransactionRequest {
    outputs: Vec<CellOutput>,
    outputs_data: Vec<Bytes>,
    pinned_inputs: Vec<CandidateInput>,
    cell_deps: Vec<CellDep>,
    header_deps: Vec<Byte32>,
    change: Option<ChangePolicy>,
}

impl TransactionRequest {
    /// Create an empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requested outputs
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Add an output, rejecting capacities below the cell's minimum
    pub fn add_output(&mut self, request: OutputRequest) -> Result<&mut Self> {
        let (output, data) = request.into_cell()?;
        self.outputs.push(output);
        self.outputs_data.push(data);
        Ok(self)
    }

    /// Add a fully formed output cell
    pub fn add_output_cell(
        &mut self,
        output: CellOutput,
        data: impl Into<Bytes>,
    ) -> Result<&mut Self> {
        let capacity: u64 = output.capacity().unpack();
        self.add_output(OutputRequest {
            capacity: Some(capacity),
            lock: output.lock(),
            type_: output.type_().to_opt(),
            data: data.into(),
        })
    }

    /// Spend `input` before anything from the candidate source
    ///
    /// Pinned inputs are consumed in the order added, so the first one
    /// fixes every Type-Id in the transaction.
    pub fn add_input(&mut self, input: CandidateInput) -> &mut Self {
        self.pinned_inputs.push(input);
        self
    }

    /// Add a cell dep not contributed by any handler
    pub fn add_cell_dep(&mut self, dep: CellDep) -> &mut Self {
        if !self.cell_deps.contains(&dep) {
            self.cell_deps.push(dep);
        }
        self
    }

    /// Add a header dep
    pub fn add_header_dep(&mut self, block_hash: Byte32) -> &mut Self {
        self.header_deps.push(block_hash);
        self
    }

    /// Send surplus to a plain output locked by `lock`
    pub fn set_change_output(&mut self, lock: Script) -> &mut Self {
        self.set_change(ChangePolicy::Output(ChangeOutput::new(lock)))
    }

    /// Choose the change policy
    pub fn set_change(&mut self, policy: ChangePolicy) -> &mut Self {
        self.change = Some(policy);
        self
    }

    /// Opt out of change: all surplus becomes fee
    pub fn accept_surplus_as_fee(&mut self) -> &mut Self {
        self.set_change(ChangePolicy::SurplusAsFee)
    }

    /// Build with `config`, pulling from `source`
    pub fn build<S>(
        &self,
        config: &TransactionBuilderConfiguration,
        source: &mut S,
    ) -> Result<TransactionWithScriptGroups>
    where
        S: InputSource + ?Sized,
    {
        build(config, self, source)
    }
}

/// Transaction ready for signing, with its script groups
#[derive(Debug, Clone, Serialize)]
pub struct TransactionWithScriptGroups {
    /// Assembled transaction; witnesses hold placeholders
    #[serde(with = "crate::json::tx_view")]
    pub tx_view: TransactionView,
    /// Script groups in discovery order
    pub script_groups: Vec<ScriptGroup>,
    /// Fee paid, in shannons
    pub fee: u64,
    /// Index of the change output, if one was added
    pub change_output_index: Option<usize>,
}

impl TransactionWithScriptGroups {
    /// Lock groups only
    pub fn lock_groups(&self) -> impl Iterator<Item = &ScriptGroup> {
        self.script_groups
            .iter()
            .filter(|g| g.group_type == ScriptGroupType::Lock)
    }
}

/// In-progress transaction and its running totals
struct Assembly<'a> {
    config: &'a TransactionBuilderConfiguration,
    calculator: FeeCalculator,
    tx: TxData,
    registry: ScriptGroupRegistry,
    inputs_capacity: u64,
}

impl<'a> Assembly<'a> {
    fn new(config: &'a TransactionBuilderConfiguration, request: &TransactionRequest) -> Self {
        Self {
            config,
            calculator: config.fee_calculator(),
            tx: TxData {
                cell_deps: request.cell_deps.clone(),
                header_deps: request.header_deps.clone(),
                outputs: request.outputs.clone(),
                outputs_data: request.outputs_data.iter().map(|d| d.pack()).collect(),
                ..TxData::default()
            },
            registry: ScriptGroupRegistry::new(),
            inputs_capacity: 0,
        }
    }

    fn add_input(&mut self, candidate: CandidateInput) -> Result<()> {
        let capacity = candidate.capacity();
        let input_index = self.tx.push_input(candidate.input);
        self.inputs_capacity = self
            .inputs_capacity
            .checked_add(capacity)
            .ok_or_else(|| Error::AmountOverflow("Input capacity overflow".to_string()))?;

        let registration = self.registry.register(
            &candidate.output.lock(),
            ScriptGroupType::Lock,
            GroupMember::Input(input_index),
        );
        if registration.created {
            self.prepare_lock_group(registration.group_index);
        }
        if let Some(type_script) = candidate.output.type_().to_opt() {
            self.registry
                .register(&type_script, ScriptGroupType::Type, GroupMember::Input(input_index));
        }

        tracing::debug!(
            "Pulled input {} ({} shannons), total input {}",
            input_index,
            capacity,
            self.inputs_capacity
        );
        Ok(())
    }

    fn prepare_lock_group(&mut self, group_index: usize) {
        let Some(group) = self.registry.get(group_index) else {
            return;
        };
        let claimed = self
            .config
            .handlers()
            .iter()
            .any(|handler| handler.on_lock_group(&mut self.tx, group));
        if !claimed {
            tracing::debug!(
                "No handler for lock {}; input {:?} keeps an empty witness",
                group.script.code_hash(),
                group.first_input_index()
            );
        }
    }

    /// Fee for the transaction as it stands
    fn fee(&self) -> Result<u64> {
        self.calculator.calculate_fee(&self.tx.build_tx_view().data())
    }

    /// Fee with `cell` temporarily appended as an output
    fn fee_with(&mut self, cell: &CellOutput, data: &Bytes) -> Result<u64> {
        self.tx.push_output(cell.clone(), data);
        let fee = self.fee();
        self.tx.pop_output();
        fee
    }
}

/// Assemble a balanced transaction for `request`
///
/// Candidates are pulled one at a time, pinned inputs first, and pulling
/// stops as soon as the outputs, the fee and the change policy are
/// satisfied. Nothing is returned on failure.
pub fn build<S>(
    config: &TransactionBuilderConfiguration,
    request: &TransactionRequest,
    source: &mut S,
) -> Result<TransactionWithScriptGroups>
where
    S: InputSource + ?Sized,
{
    let policy = request.change.as_ref().ok_or_else(|| {
        Error::InvalidRequest(
            "Change output is not set; set one or accept surplus as fee".to_string(),
        )
    })?;

    let mut change_cell = match policy {
        ChangePolicy::Output(change) => {
            let cell = provisional_cell(change.lock.clone(), change.type_.clone());
            let min_capacity = occupied_capacity(&cell, change.data.len())?;
            Some((cell, change.data.clone(), min_capacity))
        }
        ChangePolicy::SurplusAsFee => None,
    };

    let outputs_capacity = request
        .outputs
        .iter()
        .try_fold(0u64, |acc, o| {
            let capacity: u64 = o.capacity().unpack();
            acc.checked_add(capacity)
        })
        .ok_or_else(|| Error::AmountOverflow("Output capacity overflow".to_string()))?;

    let mut assembly = Assembly::new(config, request);
    let mut inputs = ChainedSource::new(&request.pinned_inputs, source);
    let mut state = BalanceState::Collecting;

    while let Some(candidate) = inputs.next_input()? {
        assembly.add_input(candidate)?;

        let change = match &change_cell {
            Some((cell, data, min_capacity)) => Some(ChangeQuote {
                fee_with_change: assembly.fee_with(cell, data)?,
                min_capacity: *min_capacity,
            }),
            None => None,
        };
        state = selection::evaluate(&Targets {
            inputs_capacity: assembly.inputs_capacity,
            outputs_capacity,
            fee_without_change: assembly.fee()?,
            change,
            fold_threshold: config.force_small_change_as_fee(),
        })?;

        if matches!(state, BalanceState::Balanced(_)) {
            break;
        }
    }

    let balance = match state {
        BalanceState::Balanced(balance) => balance,
        BalanceState::Collecting => {
            tracing::warn!("Build failed: candidate source is empty");
            return Err(Error::InsufficientCapacity(format!(
                "No candidate inputs available for {} shannons of outputs",
                outputs_capacity
            )));
        }
        BalanceState::Deficit(shortfall) => {
            tracing::warn!(
                "Build failed: short {} shannons after {} inputs",
                shortfall,
                assembly.tx.inputs.len()
            );
            return Err(Error::InsufficientCapacity(format!(
                "Required {} more shannons after {} inputs totalling {}",
                shortfall,
                assembly.tx.inputs.len(),
                assembly.inputs_capacity
            )));
        }
        BalanceState::DeadZone(leftover) => {
            let min_change = change_cell.as_ref().map_or(0, |(_, _, min)| *min);
            tracing::warn!(
                "Build failed: leftover {} shannons cannot be returned or burned",
                leftover
            );
            return Err(Error::UnresolvableChange(format!(
                "Leftover {} shannons is below the minimum change capacity {} and above the fee threshold {}",
                leftover,
                min_change,
                config.force_small_change_as_fee().unwrap_or(0)
            )));
        }
    };

    let mut change_output_index = None;
    if let (Balance::WithChange { change, fee }, Some((cell, data, _))) =
        (balance, change_cell.take())
    {
        let cell = cell.as_builder().capacity(change.pack()).build();
        change_output_index = Some(assembly.tx.push_output(cell, &data));

        let recomputed = assembly.fee()?;
        if recomputed != fee {
            return Err(Error::FeeMismatch(format!(
                "Fee changed from {} to {} after adding change output",
                fee, recomputed
            )));
        }
    }

    for handler in config.handlers() {
        handler.after_selection(&mut assembly.tx)?;
    }

    let Assembly {
        calculator,
        tx,
        mut registry,
        inputs_capacity,
        ..
    } = assembly;

    for (index, output) in tx.outputs.iter().enumerate() {
        if let Some(type_script) = output.type_().to_opt() {
            registry.register(&type_script, ScriptGroupType::Type, GroupMember::Output(index));
        }
    }

    let tx_view = tx.build_tx_view();
    let fee = balance.fee();
    let paid = tx
        .outputs_capacity()
        .and_then(|out| inputs_capacity.checked_sub(out));
    let required = calculator.calculate_fee(&tx_view.data())?;
    if paid != Some(fee) || fee < required {
        return Err(Error::FeeMismatch(format!(
            "Transaction pays {:?} shannons, expected {} with {} required",
            paid, fee, required
        )));
    }

    tracing::info!(
        "Balanced transaction: {} inputs, {} outputs, fee={}, change={:?}",
        tx.inputs.len(),
        tx.outputs.len(),
        fee,
        change_output_index.and_then(|i| tx.output_capacity(i))
    );

    Ok(TransactionWithScriptGroups {
        tx_view,
        script_groups: registry.finalize(),
        fee,
        change_output_index,
    })
}
