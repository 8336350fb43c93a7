//! Per-day ranking and top-N selection.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use time::Date;

use crate::domain::{Observation, RankedObservation};

/// The selected subset for one trading day.
///
/// `candidates` is the number of observations available before the rank
/// filter, so a day with fewer than N candidates stays observable as a
/// data-quality fact rather than disappearing into a shorter list.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySelection {
    pub day: Date,
    pub picks: Vec<RankedObservation>,
    pub candidates: usize,
}

impl DaySelection {
    /// How many members this day is short of the requested index size.
    pub fn shortfall(&self, index_size: NonZeroUsize) -> usize {
        index_size.get().saturating_sub(self.candidates)
    }
}

/// Total ranking order within a day: market cap descending, ticker ascending
/// on ties. The tie-break is load-bearing: without it, ranking instability
/// would show up downstream as phantom turnover.
fn ranking_order(a: &Observation, b: &Observation) -> Ordering {
    b.market_cap
        .total_cmp(&a.market_cap)
        .then_with(|| a.ticker.cmp(&b.ticker))
}

/// Rank every observation within its day. Ranks are dense and start at 1.
pub fn rank_by_market_cap(
    observations: &[Observation],
) -> BTreeMap<Date, Vec<RankedObservation>> {
    let mut by_day: BTreeMap<Date, Vec<Observation>> = BTreeMap::new();
    for observation in observations {
        by_day
            .entry(observation.day)
            .or_default()
            .push(observation.clone());
    }

    by_day
        .into_iter()
        .map(|(day, mut rows)| {
            rows.sort_by(ranking_order);
            let ranked = rows
                .into_iter()
                .enumerate()
                .map(|(index, observation)| RankedObservation {
                    observation,
                    rank: index as u32 + 1,
                })
                .collect();
            (day, ranked)
        })
        .collect()
}

/// Select the top `index_size` observations for every day in `trading_days`.
///
/// A day with fewer than `index_size` candidates keeps them all; a day with
/// none yields an empty selection that the aggregator reports as missing
/// data. The output follows the order of `trading_days`.
pub fn select_top(
    observations: &[Observation],
    trading_days: &[Date],
    index_size: NonZeroUsize,
) -> Vec<DaySelection> {
    let ranked = rank_by_market_cap(observations);

    trading_days
        .iter()
        .map(|day| {
            let rows = ranked.get(day).cloned().unwrap_or_default();
            let candidates = rows.len();
            let picks = rows
                .into_iter()
                .filter(|row| (row.rank as usize) <= index_size.get())
                .collect();
            DaySelection {
                day: *day,
                picks,
                candidates,
            }
        })
        .collect()
}
