//! Summary statistics over the completed series.

use crate::domain::{CompositionChange, DayReturn, IndexSeries, SummaryReport};
use crate::{EngineError, ValidationError};

/// Compute the aggregate report for a completed, non-empty series.
///
/// Best/worst day ties resolve to the earliest day in date order (strict
/// comparisons keep the first occurrence). The aggregate return is the final
/// row's cumulative return, inheriting its non-compounded definition.
pub fn summarize(
    series: &IndexSeries,
    changes: &[CompositionChange],
) -> Result<SummaryReport, EngineError> {
    let first = series
        .points
        .first()
        .ok_or(ValidationError::EmptyUniverse)?;
    let last = series
        .points
        .last()
        .ok_or(ValidationError::EmptyUniverse)?;

    let mut best_day = DayReturn {
        day: first.day,
        return_pct: first.daily_return_pct,
    };
    let mut worst_day = best_day;
    for point in &series.points {
        if point.daily_return_pct > best_day.return_pct {
            best_day = DayReturn {
                day: point.day,
                return_pct: point.daily_return_pct,
            };
        }
        if point.daily_return_pct < worst_day.return_pct {
            worst_day = DayReturn {
                day: point.day,
                return_pct: point.daily_return_pct,
            };
        }
    }

    let total_added = changes.iter().map(|change| change.added.len()).sum();
    let total_removed = changes.iter().map(|change| change.removed.len()).sum();

    Ok(SummaryReport {
        total_added,
        total_removed,
        best_day,
        worst_day,
        aggregate_return_pct: last.cumulative_return_pct,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use time::macros::date;
    use time::Date;

    use crate::domain::{IndexPoint, Ticker};

    use super::*;

    fn point(day: Date, daily: f64, cumulative: f64) -> IndexPoint {
        IndexPoint {
            day,
            index_value: 100.0,
            members: Vec::new(),
            daily_return_pct: daily,
            cumulative_return_pct: cumulative,
        }
    }

    fn change(day: Date, added: &[&str], removed: &[&str]) -> CompositionChange {
        let to_set = |names: &[&str]| -> BTreeSet<Ticker> {
            names
                .iter()
                .map(|t| Ticker::parse(t).expect("ticker"))
                .collect()
        };
        CompositionChange {
            day,
            added: to_set(added),
            removed: to_set(removed),
            intersection: BTreeSet::new(),
        }
    }

    #[test]
    fn finds_best_and_worst_days() {
        let series = IndexSeries {
            points: vec![
                point(date!(2026 - 01 - 05), 0.0, 0.0),
                point(date!(2026 - 01 - 06), 10.0, 10.0),
                point(date!(2026 - 01 - 07), -10.0, -1.0),
            ],
        };

        let report = summarize(&series, &[]).expect("report");
        assert_eq!(report.best_day.day, date!(2026 - 01 - 06));
        assert_eq!(report.worst_day.day, date!(2026 - 01 - 07));
        assert_eq!(report.aggregate_return_pct, -1.0);
    }

    #[test]
    fn return_ties_resolve_to_earliest_day() {
        let series = IndexSeries {
            points: vec![
                point(date!(2026 - 01 - 05), 0.0, 0.0),
                point(date!(2026 - 01 - 06), 5.0, 5.0),
                point(date!(2026 - 01 - 07), 5.0, 10.25),
            ],
        };

        let report = summarize(&series, &[]).expect("report");
        assert_eq!(report.best_day.day, date!(2026 - 01 - 06));
    }

    #[test]
    fn totals_sum_delta_cardinalities() {
        let series = IndexSeries {
            points: vec![point(date!(2026 - 01 - 05), 0.0, 0.0)],
        };
        let changes = vec![
            change(date!(2026 - 01 - 05), &["A", "B"], &[]),
            change(date!(2026 - 01 - 06), &["C"], &["A"]),
        ];

        let report = summarize(&series, &changes).expect("report");
        assert_eq!(report.total_added, 3);
        assert_eq!(report.total_removed, 1);
    }

    #[test]
    fn empty_series_is_rejected() {
        let err = summarize(&IndexSeries::default(), &[]).expect_err("must fail");
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::EmptyUniverse)
        ));
    }
}
