//! Day-over-day membership change detection.

use std::collections::BTreeSet;

use crate::domain::{CompositionChange, IndexSeries, Ticker};

/// One-day lookback state for the membership fold. "No prior day" is a
/// distinct variant rather than an empty-set sentinel: the first day's delta
/// has different semantics (everything added, nothing intersected), not
/// merely a delta against nothing.
enum Membership {
    NoPriorDay,
    HasPriorDay(BTreeSet<Ticker>),
}

/// Walk the ordered series and emit one [`CompositionChange`] per day.
///
/// This is a first-order Markov comparison: only the previous day's set is
/// carried, never deeper history.
pub fn detect_changes(series: &IndexSeries) -> Vec<CompositionChange> {
    let mut state = Membership::NoPriorDay;
    let mut changes = Vec::with_capacity(series.len());

    for point in &series.points {
        let today = point.member_set();
        let change = match &state {
            Membership::NoPriorDay => CompositionChange {
                day: point.day,
                added: today.clone(),
                removed: BTreeSet::new(),
                intersection: BTreeSet::new(),
            },
            Membership::HasPriorDay(prior) => CompositionChange {
                day: point.day,
                added: today.difference(prior).cloned().collect(),
                removed: prior.difference(&today).cloned().collect(),
                intersection: prior.intersection(&today).cloned().collect(),
            },
        };

        changes.push(change);
        state = Membership::HasPriorDay(today);
    }

    changes
}
