//! Reduce the samples of a listing to one representative sample per clock tick.
use std::collections::BTreeMap;

use crate::{convert::sized_hex, error::FormatError, parse::SignalTable};

/// A clock tick and the sample chosen to represent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub tick: u64,
    pub sample: usize,
}

/// Group samples by the decoded cycle counter and keep the middle sample of
/// each group. Delta-cycle glitches sit at either edge of a tick, so the
/// middle one is the most stable. Samples whose counter does not decode are
/// skipped.
///
/// The result is sorted by tick.
pub fn sample_ticks(table: &SignalTable, cycle_counter: &str) -> Result<Vec<Tick>, FormatError> {
    let mut samples_by_tick: BTreeMap<u64, Vec<usize>> = BTreeMap::new();

    for (sample, value) in table.require(cycle_counter)?.iter().enumerate() {
        match value.as_str().and_then(sized_hex) {
            Some(tick) => samples_by_tick.entry(tick).or_default().push(sample),
            None => tracing::trace!("sample {sample}: cycle counter {value:?} skipped"),
        }
    }

    Ok(samples_by_tick
        .into_iter()
        .map(|(tick, samples)| Tick {
            tick,
            sample: samples[samples.len() / 2],
        })
        .collect())
}
