//! Per-day aggregation of a selected set into an index snapshot.

use crate::domain::IndexSnapshot;
use crate::EngineError;

use super::select::DaySelection;

/// Collapse one day's selection into an [`IndexSnapshot`].
///
/// The index value is the unweighted arithmetic mean of adjusted closes,
/// not a cap-weighted average. Membership keeps the selection's rank order.
///
/// # Errors
/// A day with zero selected observations is a [`EngineError::MissingData`]
/// error naming the day; coercing it to NaN or zero would corrupt every
/// downstream return.
pub fn snapshot(selection: &DaySelection) -> Result<IndexSnapshot, EngineError> {
    if selection.picks.is_empty() {
        return Err(EngineError::MissingData { day: selection.day });
    }

    let sum: f64 = selection
        .picks
        .iter()
        .map(|row| row.observation.adjusted_close)
        .sum();
    let index_value = sum / selection.picks.len() as f64;
    let members = selection
        .picks
        .iter()
        .map(|row| row.observation.ticker.clone())
        .collect();

    Ok(IndexSnapshot {
        day: selection.day,
        index_value,
        members,
    })
}
