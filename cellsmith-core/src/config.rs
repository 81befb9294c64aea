//! Builder configuration
//!
//! Constructed once through [`ConfigurationBuilder`] and read-only
//! afterwards. `build` borrows it immutably, so it cannot change while a
//! build is running.

use cellsmith_params::{Network, NetworkType, DEFAULT_FEE_RATE};

use crate::fees::FeeCalculator;
use crate::handler::ScriptHandler;
use crate::Result;

/// Policy for a transaction build
#[derive(Debug, Clone)]
pub struct TransactionBuilderConfiguration {
    network: Network,
    fee_rate: u64,
    force_small_change_as_fee: Option<u64>,
    handlers: Vec<ScriptHandler>,
}

impl TransactionBuilderConfiguration {
    /// Default configuration for `network_type`
    pub fn new(network_type: NetworkType) -> Self {
        let network = Network::from_type(network_type);
        Self {
            handlers: ScriptHandler::defaults(&network),
            network,
            fee_rate: DEFAULT_FEE_RATE,
            force_small_change_as_fee: None,
        }
    }

    /// Start a configuration for `network_type`
    pub fn builder(network_type: NetworkType) -> ConfigurationBuilder {
        ConfigurationBuilder {
            config: Self::new(network_type),
        }
    }

    /// Network parameters
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Fee rate (shannons per 1000 bytes)
    pub fn fee_rate(&self) -> u64 {
        self.fee_rate
    }

    /// Largest leftover (in shannons) folded into the fee instead of failing
    pub fn force_small_change_as_fee(&self) -> Option<u64> {
        self.force_small_change_as_fee
    }

    /// Script handlers, in dispatch order
    pub fn handlers(&self) -> &[ScriptHandler] {
        &self.handlers
    }

    /// Fee calculator for the configured rate
    pub fn fee_calculator(&self) -> FeeCalculator {
        FeeCalculator::new(self.fee_rate)
    }
}

/// Builder for [`TransactionBuilderConfiguration`]
#[derive(Debug, Clone)]
pub struct ConfigurationBuilder {
    config: TransactionBuilderConfiguration,
}

impl ConfigurationBuilder {
    /// Set the fee rate (shannons per 1000 bytes)
    pub fn fee_rate(mut self, fee_rate: u64) -> Self {
        self.config.fee_rate = fee_rate;
        self
    }

    /// Fold leftovers up to `threshold` shannons into the fee
    pub fn force_small_change_as_fee(mut self, threshold: u64) -> Self {
        self.config.force_small_change_as_fee = Some(threshold);
        self
    }

    /// Append a handler after the defaults
    pub fn handler(mut self, handler: ScriptHandler) -> Self {
        self.config.handlers.push(handler);
        self
    }

    /// Replace the handler list
    pub fn handlers(mut self, handlers: Vec<ScriptHandler>) -> Self {
        self.config.handlers = handlers;
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> Result<TransactionBuilderConfiguration> {
        FeeCalculator::validate_fee_rate(self.config.fee_rate)?;
        Ok(self.config)
    }
}
