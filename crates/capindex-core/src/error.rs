use thiserror::Error;
use time::Date;

/// Field- and row-level input problems caught before the pipeline runs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker must start with an ASCII letter: '{ch}'")]
    TickerInvalidStart { ch: char },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("adjusted close must be positive, got {value}")]
    NonPositiveClose { value: f64 },
    #[error("market cap must be non-negative, got {value}")]
    NegativeMarketCap { value: f64 },

    #[error("observation window is empty, nothing to build an index from")]
    EmptyUniverse,
}

/// Fatal data errors surfaced by the pipeline.
///
/// None of these are retried or patched over with defaults: every variant
/// means the run's input is unusable and the caller must be told which
/// record broke it. Degraded-but-valid days (fewer than N candidates) are
/// deliberately NOT part of this taxonomy; they travel as warnings.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input is missing one or more required columns.
    #[error("input is missing required column(s): {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    /// A trading day ended up with zero candidates after selection.
    #[error("no observations available for {day} after selection")]
    MissingData { day: Date },

    /// The assembled series contains the same trading day twice.
    #[error("duplicate trading day {day} in assembled index series")]
    DuplicateDate { day: Date },

    /// A non-positive index value reached a return computation. Index values
    /// are structurally positive under valid input, so this means the input
    /// is corrupted rather than merely sparse.
    #[error("non-positive index value {value} on {day} feeding a return computation")]
    DataIntegrity { day: Date, value: f64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
