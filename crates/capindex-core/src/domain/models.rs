use std::collections::BTreeSet;

use serde::Serialize;
use time::Date;

use crate::{Ticker, ValidationError};

/// Delimiter for the canonical textual form of membership lists and delta
/// sets.
pub const MEMBER_DELIMITER: &str = "-";

/// One raw daily per-ticker row. Uniqueness key is `(day, ticker)`; the
/// engine treats the whole table as a frozen, read-only snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub day: Date,
    pub ticker: Ticker,
    pub adjusted_close: f64,
    pub market_cap: f64,
}

impl Observation {
    pub fn new(
        day: Date,
        ticker: Ticker,
        adjusted_close: f64,
        market_cap: f64,
    ) -> Result<Self, ValidationError> {
        validate_finite("adjusted_close", adjusted_close)?;
        validate_finite("market_cap", market_cap)?;
        if adjusted_close <= 0.0 {
            return Err(ValidationError::NonPositiveClose {
                value: adjusted_close,
            });
        }
        if market_cap < 0.0 {
            return Err(ValidationError::NegativeMarketCap { value: market_cap });
        }

        Ok(Self {
            day,
            ticker,
            adjusted_close,
            market_cap,
        })
    }
}

/// An observation with its position under the day's total ranking order
/// (market cap descending, ticker ascending). Rank 1 is the largest cap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedObservation {
    #[serde(flatten)]
    pub observation: Observation,
    pub rank: u32,
}

/// One day's index state: equal-weighted value plus the ordered membership.
/// `members` is sorted by descending market cap (ticker-ascending on ties);
/// downstream consumers read position as an importance proxy even though the
/// value itself is unweighted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSnapshot {
    pub day: Date,
    pub index_value: f64,
    pub members: Vec<Ticker>,
}

impl IndexSnapshot {
    /// Canonical `-`-joined membership string, in rank order.
    pub fn ticker_list(&self) -> String {
        join_tickers(self.members.iter())
    }

    pub fn member_set(&self) -> BTreeSet<Ticker> {
        self.members.iter().cloned().collect()
    }
}

/// One row of the completed index series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexPoint {
    pub day: Date,
    pub index_value: f64,
    pub members: Vec<Ticker>,
    /// Day-over-day percentage change; 0 for the first day by convention.
    pub daily_return_pct: f64,
    /// Return relative to the first day's value: `(value / value[0] - 1) * 100`.
    ///
    /// This is NOT compounded from `daily_return_pct` and diverges from the
    /// compounding product when moves are large. The simple definition is
    /// the contract; do not "fix" it.
    pub cumulative_return_pct: f64,
}

impl IndexPoint {
    pub fn ticker_list(&self) -> String {
        join_tickers(self.members.iter())
    }

    pub fn member_set(&self) -> BTreeSet<Ticker> {
        self.members.iter().cloned().collect()
    }
}

/// Day-ascending index series with derived returns.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct IndexSeries {
    pub points: Vec<IndexPoint>,
}

impl IndexSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Membership delta against the immediately preceding trading day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionChange {
    pub day: Date,
    pub added: BTreeSet<Ticker>,
    pub removed: BTreeSet<Ticker>,
    pub intersection: BTreeSet<Ticker>,
}

impl CompositionChange {
    pub fn added_list(&self) -> String {
        join_tickers(self.added.iter())
    }

    pub fn removed_list(&self) -> String {
        join_tickers(self.removed.iter())
    }

    pub fn intersection_list(&self) -> String {
        join_tickers(self.intersection.iter())
    }
}

/// A single day's return, used for best/worst reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayReturn {
    pub day: Date,
    pub return_pct: f64,
}

/// Aggregate scalars over the whole horizon. Values are kept unrounded;
/// two-decimal formatting happens only in [`SummaryReport::rows`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub total_added: usize,
    pub total_removed: usize,
    pub best_day: DayReturn,
    pub worst_day: DayReturn,
    pub aggregate_return_pct: f64,
}

impl SummaryReport {
    /// Key/value rows for human consumption.
    pub fn rows(&self) -> Vec<(String, String)> {
        vec![
            (
                String::from("Total Tickers Added"),
                self.total_added.to_string(),
            ),
            (
                String::from("Total Tickers Removed"),
                self.total_removed.to_string(),
            ),
            (
                String::from("Best Day"),
                format!("{} ({:.2}%)", self.best_day.day, self.best_day.return_pct),
            ),
            (
                String::from("Worst Day"),
                format!("{} ({:.2}%)", self.worst_day.day, self.worst_day.return_pct),
            ),
            (
                String::from("Aggregate Return (%)"),
                format!("{:.2}", self.aggregate_return_pct),
            ),
        ]
    }
}

/// Join tickers with the canonical delimiter; an empty set yields an empty
/// string.
pub fn join_tickers<'a>(tickers: impl Iterator<Item = &'a Ticker>) -> String {
    tickers
        .map(Ticker::as_str)
        .collect::<Vec<_>>()
        .join(MEMBER_DELIMITER)
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFiniteValue { field })
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn ticker(s: &str) -> Ticker {
        Ticker::parse(s).expect("ticker")
    }

    #[test]
    fn observation_rejects_non_positive_close() {
        let err = Observation::new(date!(2026 - 01 - 05), ticker("AAPL"), 0.0, 1.0)
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::NonPositiveClose { .. }));
    }

    #[test]
    fn observation_rejects_negative_market_cap() {
        let err = Observation::new(date!(2026 - 01 - 05), ticker("AAPL"), 10.0, -1.0)
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::NegativeMarketCap { .. }));
    }

    #[test]
    fn observation_rejects_non_finite_values() {
        let err = Observation::new(date!(2026 - 01 - 05), ticker("AAPL"), f64::NAN, 1.0)
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::NonFiniteValue { .. }));
    }

    #[test]
    fn empty_set_serializes_to_empty_string() {
        let change = CompositionChange {
            day: date!(2026 - 01 - 05),
            added: BTreeSet::new(),
            removed: BTreeSet::new(),
            intersection: BTreeSet::new(),
        };
        assert_eq!(change.added_list(), "");
    }

    #[test]
    fn delta_strings_are_alphabetically_sorted() {
        let added: BTreeSet<Ticker> = [ticker("MSFT"), ticker("AAPL"), ticker("GOOG")]
            .into_iter()
            .collect();
        let change = CompositionChange {
            day: date!(2026 - 01 - 05),
            added,
            removed: BTreeSet::new(),
            intersection: BTreeSet::new(),
        };
        assert_eq!(change.added_list(), "AAPL-GOOG-MSFT");
    }

    #[test]
    fn summary_rows_format_to_two_decimals() {
        let report = SummaryReport {
            total_added: 3,
            total_removed: 1,
            best_day: DayReturn {
                day: date!(2026 - 01 - 06),
                return_pct: 10.0,
            },
            worst_day: DayReturn {
                day: date!(2026 - 01 - 07),
                return_pct: -9.90991,
            },
            aggregate_return_pct: -1.0,
        };
        let rows = report.rows();
        assert_eq!(rows[2].1, "2026-01-06 (10.00%)");
        assert_eq!(rows[3].1, "2026-01-07 (-9.91%)");
        assert_eq!(rows[4].1, "-1.00");
    }
}
