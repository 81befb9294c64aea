//! Balance evaluation for incremental input selection
//!
//! After every pulled input the builder quotes the fee of the current shape
//! (with and without the provisional change output) and asks [`evaluate`]
//! whether it can stop. The decision is a pure function of those numbers.

use crate::{Error, Result};

/// Where a build stands after the latest pull
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BalanceState {
    /// No input pulled yet
    Collecting,
    /// Inputs do not cover outputs plus fee; carries the shortfall
    Deficit(u64),
    /// Fee covered, but the leftover can neither form a change cell nor be
    /// folded into the fee; carries the leftover
    DeadZone(u64),
    /// Feasible
    Balanced(Balance),
}

/// How a feasible build disposes of its surplus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Balance {
    /// Append a change output of `change` shannons
    WithChange {
        /// Change capacity
        change: u64,
        /// Fee of the shape including the change output
        fee: u64,
    },
    /// No change output; everything not sent is fee
    NoChange {
        /// Fee paid
        fee: u64,
    },
}

impl Balance {
    pub(crate) fn fee(&self) -> u64 {
        match *self {
            Balance::WithChange { fee, .. } | Balance::NoChange { fee } => fee,
        }
    }
}

/// Fee quote for the shape with the provisional change output appended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChangeQuote {
    /// Fee of the shape including the change output
    pub fee_with_change: u64,
    /// Occupied capacity of the change output
    pub min_capacity: u64,
}

/// Numbers the stop decision depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Targets {
    /// Capacity of all inputs pulled so far
    pub inputs_capacity: u64,
    /// Capacity of the requested outputs
    pub outputs_capacity: u64,
    /// Fee of the shape without a change output
    pub fee_without_change: u64,
    /// `None` when surplus goes to the fee
    pub change: Option<ChangeQuote>,
    /// Largest leftover that may be folded into the fee
    pub fold_threshold: Option<u64>,
}

fn checked_total(outputs: u64, fee: u64) -> Result<u64> {
    outputs.checked_add(fee).ok_or_else(|| {
        Error::AmountOverflow(format!("Outputs {} + fee {} overflow", outputs, fee))
    })
}

/// Decide whether the inputs pulled so far balance the transaction
pub(crate) fn evaluate(targets: &Targets) -> Result<BalanceState> {
    if let Some(quote) = targets.change {
        let needed = checked_total(targets.outputs_capacity, quote.fee_with_change)?;
        if let Some(change) = targets.inputs_capacity.checked_sub(needed) {
            if change >= quote.min_capacity {
                return Ok(BalanceState::Balanced(Balance::WithChange {
                    change,
                    fee: quote.fee_with_change,
                }));
            }
        }
    }

    let needed = checked_total(targets.outputs_capacity, targets.fee_without_change)?;
    let Some(left) = targets.inputs_capacity.checked_sub(needed) else {
        return Ok(BalanceState::Deficit(needed - targets.inputs_capacity));
    };

    let fold = match targets.change {
        None => true,
        Some(_) => left == 0 || targets.fold_threshold.is_some_and(|t| left <= t),
    };
    if fold {
        Ok(BalanceState::Balanced(Balance::NoChange {
            fee: targets.fee_without_change + left,
        }))
    } else {
        Ok(BalanceState::DeadZone(left))
    }
}
