//! Analytical views over the observation table.

use duckdb::Connection;

/// Create views for ad-hoc inspection:
/// - `vw_rank_by_cap`: per-day market-cap rank (the engine's selection
///   order, expressed as a window function)
/// - `vw_universe_daily`: per-day candidate counts and total market cap
///
/// The rank view uses the same key and tie-break as the engine (market cap
/// descending, ticker ascending), so `cap_rank <= N` reproduces a day's
/// membership exactly.
///
/// # Errors
/// Returns an error if the view creation SQL fails to execute.
pub fn create_views(connection: &Connection) -> Result<(), duckdb::Error> {
    connection.execute_batch(
        r"
CREATE OR REPLACE VIEW vw_rank_by_cap AS
SELECT
    day,
    ticker,
    adjusted_close,
    market_cap,
    ROW_NUMBER() OVER (
        PARTITION BY day
        ORDER BY market_cap DESC, ticker ASC
    ) AS cap_rank
FROM observations;

CREATE OR REPLACE VIEW vw_universe_daily AS
SELECT
    day,
    COUNT(*) AS candidates,
    SUM(market_cap) AS total_market_cap
FROM observations
GROUP BY day;
",
    )?;

    Ok(())
}
