//! Prepare phase: reset the store and fill it with every candidate label.

use crate::error::DomainSweepError;
use crate::generate::{enumerate, Alphabet};
use crate::store::CandidateStore;
use std::ops::RangeInclusive;
use tracing::info;

/// Rows inserted for one label length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreparedLength {
    pub length: usize,
    pub rows: usize,
}

/// Recreate the `domains` table and insert every label in `lengths` under `suffix`.
///
/// Lengths are processed shortest first, one transaction each, so ids follow
/// enumeration order. All prior detection results are destroyed.
pub fn prepare_candidates(
    store: &mut CandidateStore,
    alphabet: &Alphabet,
    lengths: RangeInclusive<usize>,
    suffix: &str,
) -> Result<Vec<PreparedLength>, DomainSweepError> {
    // Validate the whole range before dropping anything.
    let enumerations = lengths
        .clone()
        .map(|length| enumerate(alphabet, length).map(|names| (length, names)))
        .collect::<Result<Vec<_>, _>>()?;

    store.recreate()?;

    let mut prepared = Vec::with_capacity(enumerations.len());
    for (length, names) in enumerations {
        info!(length, expected = names.len(), "preparing candidates");
        let rows = store.insert_candidates(names, suffix)?;
        prepared.push(PreparedLength { length, rows });
    }

    info!(
        lengths = ?lengths,
        total = prepared.iter().map(|p| p.rows).sum::<usize>(),
        "prepare finished"
    );
    Ok(prepared)
}
