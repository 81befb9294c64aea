//! Candidate inputs and the sources that supply them
//!
//! A source is pulled one candidate at a time and never rewound. Sources
//! backed by paged indexer queries may block inside `next_input`.

use ckb_types::{
    packed::{CellInput, CellOutput},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A spendable cell offered to the builder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateInput {
    /// Input referencing the cell
    #[serde(with = "crate::json::cell_input")]
    pub input: CellInput,
    /// The cell being spent
    #[serde(with = "crate::json::cell_output")]
    pub output: CellOutput,
}

impl CandidateInput {
    /// Create a candidate spending `output` through `input`
    pub fn new(input: CellInput, output: CellOutput) -> Self {
        Self { input, output }
    }

    /// Capacity the cell contributes
    pub fn capacity(&self) -> u64 {
        self.output.capacity().unpack()
    }
}

/// Single-pass supplier of candidate inputs
pub trait InputSource {
    /// Next candidate, or `None` once exhausted
    fn next_input(&mut self) -> Result<Option<CandidateInput>>;
}

impl<I> InputSource for I
where
    I: Iterator<Item = CandidateInput>,
{
    fn next_input(&mut self) -> Result<Option<CandidateInput>> {
        Ok(self.next())
    }
}

/// Adapts an iterator of fallible candidates, such as a paged indexer query
pub struct FallibleInputs<I>(pub I);

impl<I, E> InputSource for FallibleInputs<I>
where
    I: Iterator<Item = std::result::Result<CandidateInput, E>>,
    E: std::fmt::Display,
{
    fn next_input(&mut self) -> Result<Option<CandidateInput>> {
        self.0
            .next()
            .transpose()
            .map_err(|e| Error::InputSource(e.to_string()))
    }
}

/// Pinned inputs first, then the caller's source
pub(crate) struct ChainedSource<'a, S: ?Sized> {
    pinned: std::slice::Iter<'a, CandidateInput>,
    source: &'a mut S,
    exhausted: bool,
}

impl<'a, S: InputSource + ?Sized> ChainedSource<'a, S> {
    pub(crate) fn new(pinned: &'a [CandidateInput], source: &'a mut S) -> Self {
        Self {
            pinned: pinned.iter(),
            source,
            exhausted: false,
        }
    }
}

impl<S: InputSource + ?Sized> InputSource for ChainedSource<'_, S> {
    fn next_input(&mut self) -> Result<Option<CandidateInput>> {
        if let Some(pinned) = self.pinned.next() {
            return Ok(Some(pinned.clone()));
        }
        // Do not poll a finished source again
        if self.exhausted {
            return Ok(None);
        }
        let next = self.source.next_input()?;
        self.exhausted = next.is_none();
        Ok(next)
    }
}
