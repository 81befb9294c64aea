//! Cell capacity rules
//!
//! A cell must hold at least as many CKBytes as it occupies on chain: one
//! CKB per byte of capacity field, scripts and data.

use cellsmith_params::SHANNONS_PER_CKB;
use ckb_types::{
    core::{Capacity, CapacityError},
    packed::CellOutput,
    prelude::*,
};

use crate::{Error, Result};

/// Minimum capacity (in shannons) for `output` carrying `data_len` bytes of data
pub fn occupied_capacity(output: &CellOutput, data_len: usize) -> Result<u64> {
    let overflow = |e: CapacityError| {
        Error::AmountOverflow(format!(
            "Occupied capacity with {} data bytes overflows: {:?}",
            data_len, e
        ))
    };
    let data_capacity = Capacity::bytes(data_len).map_err(overflow)?;
    let occupied = output.occupied_capacity(data_capacity).map_err(overflow)?;
    Ok(occupied.as_u64())
}

/// Check that `output` holds at least its occupied capacity
pub fn validate_output(output: &CellOutput, data: &[u8]) -> Result<()> {
    let required = occupied_capacity(output, data.len())?;
    let capacity: u64 = output.capacity().unpack();
    if capacity < required {
        return Err(Error::InvalidOutputRequest(format!(
            "Capacity {} shannons is below the minimum {} shannons for this cell",
            capacity, required
        )));
    }
    Ok(())
}

/// Convert whole CKB into shannons
pub fn ckb_to_shannons(ckb: u64) -> Result<u64> {
    ckb.checked_mul(SHANNONS_PER_CKB)
        .ok_or_else(|| Error::AmountOverflow(format!("{} CKB overflows u64 shannons", ckb)))
}
