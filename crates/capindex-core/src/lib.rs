//! # capindex-core
//!
//! Construction and composition-tracking engine for a synthetic
//! market-cap-ranked equity index.
//!
//! Given daily per-ticker `(adjusted close, market cap)` observations, the
//! engine selects the top-N tickers by market cap for each trading day,
//! computes an equal-weighted index value, derives daily and cumulative
//! returns, detects day-over-day membership changes, and summarizes the run.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`domain`] | Observations, snapshots, series, deltas, summary report |
//! | [`engine`] | Selection, aggregation, series, composition, analytics |
//! | [`error`] | Validation and fatal-data error taxonomy |
//!
//! ## Conventions worth knowing
//!
//! - Ranking ties break by ticker ascending, so selection is deterministic
//!   and membership churn is never an ordering artifact.
//! - The first day's daily return is 0 by definition.
//! - Cumulative return is `(value / value[0] - 1) * 100`, the simple
//!   non-compounded definition. It intentionally diverges from compounding
//!   daily returns when moves are large.
//! - Days with fewer than N candidates are reported as degraded, not
//!   errored and not silently truncated.
//!
//! The engine performs no I/O and holds no state across runs; persistence
//! lives in `capindex-warehouse`.

pub mod domain;
pub mod engine;
pub mod error;

pub use domain::{
    join_tickers, CompositionChange, DayReturn, IndexPoint, IndexSeries, IndexSnapshot,
    Observation, RankedObservation, SummaryReport, Ticker, MEMBER_DELIMITER,
};
pub use engine::{DaySelection, DegradedDay, PipelineOutput};
pub use error::{EngineError, ValidationError};
