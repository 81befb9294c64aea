//! Fuzz test for transaction assembly
//!
//! Arbitrary payment amounts and candidate capacities must either build a
//! balanced transaction or fail with an error, never panic

#![no_main]

use cellsmith_core::testing::{test_candidate, test_lock};
use cellsmith_core::{OutputRequest, TransactionBuilderConfiguration, TransactionRequest};
use cellsmith_params::NetworkType;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut words = data
        .chunks_exact(8)
        .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]));
    let Some(amount) = words.next() else {
        return;
    };

    let mut request = TransactionRequest::new();
    if request
        .add_output(OutputRequest::new(test_lock(1), amount))
        .is_err()
    {
        return;
    }
    request.set_change_output(test_lock(2));

    let mut source = words
        .enumerate()
        .map(|(i, capacity)| test_candidate(capacity, test_lock((i % 3) as u8 + 2), 1, i as u32));

    let config = TransactionBuilderConfiguration::new(NetworkType::Testnet);
    if let Ok(result) = request.build(&config, &mut source) {
        let outputs = result
            .tx_view
            .outputs_capacity()
            .map(|c| c.as_u64())
            .unwrap_or(u64::MAX);
        assert!(outputs.checked_add(result.fee).is_some());
    }
});
