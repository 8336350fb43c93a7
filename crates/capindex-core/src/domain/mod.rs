//! Domain types for the index engine.

mod models;
mod ticker;

pub use models::{
    join_tickers, CompositionChange, DayReturn, IndexPoint, IndexSeries, IndexSnapshot,
    Observation, RankedObservation, SummaryReport, MEMBER_DELIMITER,
};
pub use ticker::Ticker;
