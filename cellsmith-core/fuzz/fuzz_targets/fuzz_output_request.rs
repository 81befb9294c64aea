//! Fuzz test for output request parsing
//!
//! Ensures JSON output requests are parsed and validated without panicking

#![no_main]

use cellsmith_core::{OutputRequest, TransactionRequest};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(output) = serde_json::from_slice::<OutputRequest>(data) {
        let _ = TransactionRequest::new().add_output(output);
    }
});
