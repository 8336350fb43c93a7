//! The index construction pipeline.
//!
//! Strict dataflow order, every stage a pure function over immutable input:
//! selection → aggregation → series assembly → composition deltas → summary.
//! A run recomputes everything from the observation snapshot it is handed;
//! identical input yields identical output.

pub mod aggregate;
pub mod analytics;
pub mod composition;
pub mod select;
pub mod series;

use std::num::NonZeroUsize;

use serde::Serialize;
use time::Date;

use crate::domain::{CompositionChange, IndexSeries, Observation, SummaryReport};
use crate::{EngineError, ValidationError};

pub use select::DaySelection;

/// A trading day that had fewer candidates than the configured index size.
/// A data-quality fact, not an error; it must never be silently absorbed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegradedDay {
    pub day: Date,
    pub candidates: usize,
    pub requested: usize,
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub series: IndexSeries,
    pub changes: Vec<CompositionChange>,
    pub summary: SummaryReport,
    pub degraded_days: Vec<DegradedDay>,
}

/// Run the full pipeline over a frozen observation snapshot.
///
/// `trading_days` is the window to build: every listed day must have at
/// least one observation or the run fails with
/// [`EngineError::MissingData`] naming the day.
pub fn run(
    observations: &[Observation],
    trading_days: &[Date],
    index_size: NonZeroUsize,
) -> Result<PipelineOutput, EngineError> {
    if observations.is_empty() || trading_days.is_empty() {
        return Err(ValidationError::EmptyUniverse.into());
    }

    let selections = select::select_top(observations, trading_days, index_size);

    let mut degraded_days = Vec::new();
    let mut snapshots = Vec::with_capacity(selections.len());
    for selection in &selections {
        if selection.candidates > 0 && selection.shortfall(index_size) > 0 {
            degraded_days.push(DegradedDay {
                day: selection.day,
                candidates: selection.candidates,
                requested: index_size.get(),
            });
        }
        snapshots.push(aggregate::snapshot(selection)?);
    }

    let series = series::build_series(snapshots)?;
    let changes = composition::detect_changes(&series);
    let summary = analytics::summarize(&series, &changes)?;

    Ok(PipelineOutput {
        series,
        changes,
        summary,
        degraded_days,
    })
}
