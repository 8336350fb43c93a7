//! Assembly of snapshots into the dated series with derived returns.

use time::Date;

use crate::domain::{IndexPoint, IndexSeries, IndexSnapshot};
use crate::EngineError;

/// Sort snapshots by day and derive daily / cumulative return percentages.
///
/// Conventions (the contract, not an implementation detail):
/// - `daily_return_pct` of the first element is 0; there is no prior day.
/// - `cumulative_return_pct[i] = (value[i] / value[0] - 1) * 100`, the
///   simple non-compounded definition. It is not reconstructed from the
///   daily series.
///
/// # Errors
/// - [`EngineError::DuplicateDate`] if the same day appears twice; ordering
///   across duplicate days is undefined input, not a stability question.
/// - [`EngineError::DataIntegrity`] if a non-positive value would feed a
///   division.
pub fn build_series(mut snapshots: Vec<IndexSnapshot>) -> Result<IndexSeries, EngineError> {
    snapshots.sort_by_key(|snapshot| snapshot.day);

    for pair in snapshots.windows(2) {
        if pair[0].day == pair[1].day {
            return Err(EngineError::DuplicateDate { day: pair[0].day });
        }
    }

    let Some(first) = snapshots.first() else {
        return Ok(IndexSeries::default());
    };
    let base = first.index_value;
    ensure_positive(first.day, base)?;

    let mut points = Vec::with_capacity(snapshots.len());
    let mut prior: Option<(Date, f64)> = None;
    for snapshot in snapshots {
        let daily_return_pct = match prior {
            None => 0.0,
            Some((prior_day, prior_value)) => {
                ensure_positive(prior_day, prior_value)?;
                (snapshot.index_value - prior_value) / prior_value * 100.0
            }
        };
        let cumulative_return_pct = (snapshot.index_value / base - 1.0) * 100.0;

        prior = Some((snapshot.day, snapshot.index_value));
        points.push(IndexPoint {
            day: snapshot.day,
            index_value: snapshot.index_value,
            members: snapshot.members,
            daily_return_pct,
            cumulative_return_pct,
        });
    }

    Ok(IndexSeries { points })
}

fn ensure_positive(day: Date, value: f64) -> Result<(), EngineError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::DataIntegrity { day, value })
    }
}
