//! CLI harness for exercising the transaction assembly engine
//!
//! Loads a JSON scenario (candidates, outputs, change) and prints the
//! balanced transaction with its script groups. Flags override the
//! scenario's network and fee settings.

use anyhow::Context;
use cellsmith_core::{
    CandidateInput, ChangeOutput, ChangePolicy, OutputRequest, TransactionBuilderConfiguration,
    TransactionRequest,
};
use cellsmith_params::{NetworkType, DEFAULT_FEE_RATE};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "assemble-harness")]
#[command(about = "CKB transaction assembly harness", long_about = None)]
struct Cli {
    /// Scenario file (JSON)
    #[arg(short, long)]
    scenario: PathBuf,

    /// Network (mainnet, testnet)
    #[arg(short, long)]
    network: Option<NetworkType>,

    /// Fee rate in shannons per 1000 bytes
    #[arg(short, long)]
    fee_rate: Option<u64>,

    /// Fold leftovers up to this many shannons into the fee
    #[arg(long)]
    force_small_change: Option<u64>,
}

/// Build scenario as read from disk
#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    network: Option<NetworkType>,
    #[serde(default)]
    fee_rate: Option<u64>,
    #[serde(default)]
    force_small_change_as_fee: Option<u64>,
    /// Inputs spent before any candidate
    #[serde(default)]
    inputs: Vec<CandidateInput>,
    #[serde(default)]
    candidates: Vec<CandidateInput>,
    outputs: Vec<OutputRequest>,
    #[serde(default)]
    change: Option<ChangeOutput>,
    #[serde(default)]
    surplus_as_fee: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let raw = std::fs::read_to_string(&cli.scenario)
        .with_context(|| format!("Failed to read {}", cli.scenario.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid scenario {}", cli.scenario.display()))?;

    let config = configure(&cli, &scenario)?;
    info!(
        "Network: {}, fee rate: {}, candidates: {}",
        config.network().name,
        config.fee_rate(),
        scenario.candidates.len()
    );

    let request = to_request(
        scenario.outputs,
        scenario.inputs,
        scenario.change,
        scenario.surplus_as_fee,
    )?;

    let mut source = scenario.candidates.into_iter();
    let result = match request.build(&config, &mut source) {
        Ok(result) => result,
        Err(e) => {
            warn!("Build failed ({}): {}", e.category(), e);
            return Err(e.into());
        }
    };

    info!(
        "Built transaction: {} inputs, {} script groups, fee {} shannons",
        result.tx_view.inputs().len(),
        result.script_groups.len(),
        result.fee
    );
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

fn configure(cli: &Cli, scenario: &Scenario) -> anyhow::Result<TransactionBuilderConfiguration> {
    let network = cli.network.or(scenario.network).unwrap_or(NetworkType::Testnet);
    let fee_rate = cli
        .fee_rate
        .or(scenario.fee_rate)
        .unwrap_or(DEFAULT_FEE_RATE);

    let mut builder = TransactionBuilderConfiguration::builder(network).fee_rate(fee_rate);
    if let Some(threshold) = cli.force_small_change.or(scenario.force_small_change_as_fee) {
        builder = builder.force_small_change_as_fee(threshold);
    }
    builder.build().context("Invalid builder configuration")
}

fn to_request(
    outputs: Vec<OutputRequest>,
    inputs: Vec<CandidateInput>,
    change: Option<ChangeOutput>,
    surplus_as_fee: bool,
) -> anyhow::Result<TransactionRequest> {
    let mut request = TransactionRequest::new();
    for (index, output) in outputs.into_iter().enumerate() {
        request
            .add_output(output)
            .with_context(|| format!("Output {} rejected", index))?;
    }
    for input in inputs {
        request.add_input(input);
    }
    match (change, surplus_as_fee) {
        (Some(_), true) => {
            anyhow::bail!("Scenario sets both a change output and surplus_as_fee")
        }
        (Some(change), false) => {
            request.set_change(ChangePolicy::Output(change));
        }
        (None, true) => {
            request.accept_surplus_as_fee();
        }
        // Left unset; the build reports the missing change policy
        (None, false) => {}
    }
    Ok(request)
}
