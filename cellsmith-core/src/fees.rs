//! Transaction fee calculation
//!
//! CKB charges by block space: `fee = ceil(size * fee_rate / 1000)` where
//! `size` is the encoded transaction plus its offset slot in the block.

use cellsmith_params::{DEFAULT_FEE_RATE, MAX_FEE_RATE, MIN_FEE_RATE};
use ckb_types::{packed::Transaction, prelude::*};

use crate::{Error, Result};

/// Fee calculator for a given fee rate (shannons per 1000 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeCalculator {
    fee_rate: u64,
}

impl FeeCalculator {
    /// Create a fee calculator
    pub fn new(fee_rate: u64) -> Self {
        Self { fee_rate }
    }

    /// Fee rate in shannons per 1000 bytes
    pub fn fee_rate(&self) -> u64 {
        self.fee_rate
    }

    /// Size a transaction is charged for
    pub fn transaction_size(tx: &Transaction) -> usize {
        tx.as_reader().serialized_size_in_block()
    }

    /// Fee for `size` bytes, rounded up
    pub fn fee_for_size(&self, size: usize) -> Result<u64> {
        let weighted = (size as u64).checked_mul(self.fee_rate).ok_or_else(|| {
            Error::AmountOverflow(format!(
                "Fee for {} bytes at rate {} overflows",
                size, self.fee_rate
            ))
        })?;
        Ok(weighted.div_ceil(1000))
    }

    /// Fee for the current shape of `tx`
    ///
    /// Witnesses are counted as they stand, so placeholders must already be
    /// in place for lock groups that will be signed.
    pub fn calculate_fee(&self, tx: &Transaction) -> Result<u64> {
        let size = Self::transaction_size(tx);
        let fee = self.fee_for_size(size)?;

        tracing::debug!("Estimated fee: {} bytes -> {} shannons", size, fee);

        Ok(fee)
    }

    /// Validate fee rate is within acceptable range
    pub fn validate_fee_rate(fee_rate: u64) -> Result<()> {
        if fee_rate < MIN_FEE_RATE {
            return Err(Error::InvalidConfiguration(format!(
                "Fee rate {} is below minimum {}",
                fee_rate, MIN_FEE_RATE
            )));
        }

        if fee_rate > MAX_FEE_RATE {
            return Err(Error::InvalidConfiguration(format!(
                "Fee rate {} exceeds maximum {}",
                fee_rate, MAX_FEE_RATE
            )));
        }

        Ok(())
    }
}

impl Default for FeeCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_FEE_RATE)
    }
}

/// Fee for `tx` at `fee_rate`
pub fn estimate_fee(tx: &Transaction, fee_rate: u64) -> Result<u64> {
    FeeCalculator::new(fee_rate).calculate_fee(tx)
}
