//! Fixtures for tests (enabled by the `test-helpers` feature)

use ckb_types::{
    core::TransactionView,
    packed::{CellInput, CellOutput, OutPoint, Script},
    prelude::*,
    H256,
};

use crate::handler::secp256k1_blake160_lock;
use crate::input::{CandidateInput, InputSource};
use crate::Result;

/// secp256k1-sighash-all lock whose pubkey hash is `tag` repeated
pub fn test_lock(tag: u8) -> Script {
    secp256k1_blake160_lock([tag; 20])
}

/// Candidate of `capacity` shannons locked by `lock`, at outpoint `(tx_tag.., index)`
pub fn test_candidate(capacity: u64, lock: Script, tx_tag: u8, index: u32) -> CandidateInput {
    test_typed_candidate(capacity, lock, None, tx_tag, index)
}

/// Like [`test_candidate`], with an optional type script on the spent cell
pub fn test_typed_candidate(
    capacity: u64,
    lock: Script,
    type_script: Option<Script>,
    tx_tag: u8,
    index: u32,
) -> CandidateInput {
    CandidateInput::new(
        CellInput::new(OutPoint::new(H256([tx_tag; 32]).pack(), index), 0),
        CellOutput::new_builder()
            .capacity(capacity.pack())
            .lock(lock)
            .type_(type_script.pack())
            .build(),
    )
}

/// Capacity of output `index`; panics if it does not exist
pub fn output_capacity(tx: &TransactionView, index: usize) -> u64 {
    let output = tx
        .output(index)
        .unwrap_or_else(|| panic!("no output {}", index));
    output.capacity().unpack()
}

/// Encoded length of witness `index`; panics if it does not exist
pub fn witness_len(tx: &TransactionView, index: usize) -> usize {
    tx.witnesses()
        .get(index)
        .map(|w| w.raw_data().len())
        .unwrap_or_else(|| panic!("no witness {}", index))
}

/// Source that records how many candidates were pulled
pub struct CountingSource<I> {
    inner: I,
    pulled: usize,
}

impl<I> CountingSource<I>
where
    I: Iterator<Item = CandidateInput>,
{
    /// Wrap `inner`
    pub fn new(inner: I) -> Self {
        Self { inner, pulled: 0 }
    }

    /// Candidates handed out so far
    pub fn pulled(&self) -> usize {
        self.pulled
    }
}

impl<I> InputSource for CountingSource<I>
where
    I: Iterator<Item = CandidateInput>,
{
    fn next_input(&mut self) -> Result<Option<CandidateInput>> {
        let next = self.inner.next();
        if next.is_some() {
            self.pulled += 1;
        }
        Ok(next)
    }
}
