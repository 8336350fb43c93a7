//! # capindex-warehouse
//!
//! DuckDB-backed observation store and artifact persistence for the
//! capindex engine.
//!
//! The warehouse owns everything durable: the raw `observations` table fed
//! from CSV/Parquet files, the four artifact tables rewritten by each
//! `build` run (`index_performance`, `daily_composition`,
//! `composition_changes`, `summary_metrics`), an ingestion audit log, and a
//! pair of analytical views. The engine itself never touches the database;
//! it consumes the frozen `Vec<Observation>` snapshot this crate hands it
//! and the results come back here for storage.
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `observations` | Raw daily per-ticker rows, key `(day, ticker)` |
//! | `index_performance` | Index value plus daily/cumulative return per day |
//! | `daily_composition` | Membership string per day |
//! | `composition_changes` | Added/removed/intersection strings per day |
//! | `summary_metrics` | Key/value summary rows |
//! | `ingest_log` | One row per file ingestion |

mod migrations;
mod pool;
mod views;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use duckdb::types::Value as DuckValue;
use duckdb::{Connection, ToSql};
use log::{info, warn};
use serde::Serialize;
use serde_json::{Number, Value};
use thiserror::Error;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::Date;

use capindex_core::{EngineError, Observation, PipelineOutput, Ticker};

pub use pool::{AccessMode, ConnectionPool, PooledConnection};

/// Columns an input file must carry, matching the upstream fetcher's output.
pub const REQUIRED_COLUMNS: [&str; 4] = ["Date", "Ticker", "Adjusted_Close", "Market_Cap"];

const DAY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Data error detected at the store boundary (schema, validation).
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Query was rejected by guardrails.
    #[error("query rejected: {0}")]
    QueryRejected(String),

    /// Input file of a kind the loader cannot read.
    #[error("unsupported input file '{path}': expected .csv or .parquet")]
    UnsupportedInput { path: String },

    /// A stored day failed to parse back into a calendar date.
    #[error("stored day '{value}' is not a calendar date")]
    MalformedDay { value: String },
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for capindex data.
    pub home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept per access mode.
    pub max_pool_size: usize,
}

impl WarehouseConfig {
    /// Configuration rooted at an explicit data directory.
    #[must_use]
    pub fn at(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let db_path = home.join("capindex.duckdb");
        Self {
            home,
            db_path,
            max_pool_size: 4,
        }
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self::at(resolve_capindex_home())
    }
}

/// Report from one file ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Source file path as given.
    pub source: String,
    /// Rows inserted into `observations`.
    pub rows_loaded: usize,
    /// Rows excluded for violating value constraints.
    pub rows_rejected: usize,
    /// Distinct trading days among the loaded rows.
    pub days: usize,
}

/// Column metadata for query results.
#[derive(Debug, Clone, Serialize)]
pub struct SqlColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
}

/// Result of an ad-hoc SQL query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub columns: Vec<SqlColumn>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
    /// Whether results were cut off by the row cap.
    pub truncated: bool,
}

/// The warehouse facade.
#[derive(Clone)]
pub struct Warehouse {
    pool: ConnectionPool,
}

impl Warehouse {
    /// Open a warehouse with default configuration (`CAPINDEX_HOME` or
    /// `$HOME/.capindex`).
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse, creating the data directory and schema as needed.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let pool = ConnectionPool::new(config.db_path, config.max_pool_size);
        let warehouse = Self { pool };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Apply schema migrations and (re)create views.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        migrations::apply_migrations(&connection)?;
        views::create_views(&connection)?;
        Ok(())
    }

    /// Ingest an observation file (CSV or Parquet) into `observations`.
    ///
    /// The file is staged through DuckDB's own readers, checked for the
    /// required columns, and upserted row by row on the `(day, ticker)` key.
    /// Rows violating value constraints (non-positive close, negative cap,
    /// malformed ticker, unparseable day) are excluded and counted, never
    /// patched. The ticker filter matches [`Ticker::parse`], so every loaded
    /// row is fetchable.
    ///
    /// # Errors
    /// [`EngineError::Schema`] (wrapped) listing the missing columns if the
    /// file does not carry all of [`REQUIRED_COLUMNS`].
    pub fn load_observations(&self, path: &Path) -> Result<LoadReport, WarehouseError> {
        let reader = reader_clause(path)?;
        let connection = self.pool.acquire(AccessMode::ReadWrite)?;

        connection.execute_batch(&format!(
            "CREATE OR REPLACE TEMP TABLE staging AS SELECT * FROM {reader}"
        ))?;

        let present = staging_columns(&connection)?;
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| {
                !present
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(required))
            })
            .map(|required| (*required).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::Schema { missing }.into());
        }

        let staged: usize = count(&connection, "SELECT COUNT(*) FROM staging")?;

        // The ticker shape mirrors Ticker::parse exactly; anything the
        // loader accepts must survive the fetch-side re-parse.
        const VALID_ROW: &str = r#"
            TRY_CAST("Date" AS DATE) IS NOT NULL
            AND "Ticker" IS NOT NULL
            AND length(trim(CAST("Ticker" AS VARCHAR))) BETWEEN 1 AND 15
            AND regexp_full_match(upper(trim(CAST("Ticker" AS VARCHAR))), '[A-Z][A-Z0-9.-]*')
            AND TRY_CAST("Adjusted_Close" AS DOUBLE) > 0
            AND TRY_CAST("Market_Cap" AS DOUBLE) >= 0"#;

        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<LoadReport, WarehouseError> {
            let rows_loaded = connection.execute(
                &format!(
                    "INSERT OR REPLACE INTO observations (day, ticker, adjusted_close, market_cap) \
                     SELECT TRY_CAST(\"Date\" AS DATE), \
                            upper(trim(CAST(\"Ticker\" AS VARCHAR))), \
                            TRY_CAST(\"Adjusted_Close\" AS DOUBLE), \
                            TRY_CAST(\"Market_Cap\" AS DOUBLE) \
                     FROM staging WHERE {VALID_ROW}"
                ),
                [],
            )?;

            let days: usize = count(
                &connection,
                &format!(
                    "SELECT COUNT(DISTINCT TRY_CAST(\"Date\" AS DATE)) FROM staging WHERE {VALID_ROW}"
                ),
            )?;

            let report = LoadReport {
                source: path.display().to_string(),
                rows_loaded,
                rows_rejected: staged.saturating_sub(rows_loaded),
                days,
            };

            let params: [&dyn ToSql; 4] = [
                &report.source,
                &(report.rows_loaded as i64),
                &(report.rows_rejected as i64),
                &(report.days as i64),
            ];
            connection.execute(
                "INSERT INTO ingest_log (source_path, rows_loaded, rows_rejected, days, status) \
                 VALUES (?, ?, ?, ?, 'ok')",
                params.as_slice(),
            )?;

            Ok(report)
        })();
        let report = finalize_transaction(&connection, result)?;

        if report.rows_rejected > 0 {
            warn!(
                "excluded {} invalid row(s) while loading {}",
                report.rows_rejected, report.source
            );
        }
        info!(
            "loaded {} observation row(s) across {} day(s) from {}",
            report.rows_loaded, report.days, report.source
        );

        Ok(report)
    }

    /// The most recent `window` distinct trading days, ascending.
    pub fn trading_days(&self, window: usize) -> Result<Vec<Date>, WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let mut statement = connection.prepare(
            "SELECT CAST(day AS VARCHAR) FROM ( \
                 SELECT DISTINCT day FROM observations ORDER BY day DESC LIMIT ? \
             ) ORDER BY day ASC",
        )?;

        let limit = window as i64;
        let params: [&dyn ToSql; 1] = [&limit];
        let mut rows = statement.query(params.as_slice())?;

        let mut days = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            days.push(parse_day(&value)?);
        }
        Ok(days)
    }

    /// All observations falling inside the most recent `window` trading
    /// days, ordered by day then ticker. The engine treats the result as a
    /// frozen snapshot.
    pub fn fetch_observations(&self, window: usize) -> Result<Vec<Observation>, WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let mut statement = connection.prepare(
            "SELECT CAST(day AS VARCHAR), ticker, adjusted_close, market_cap \
             FROM observations \
             WHERE day IN ( \
                 SELECT DISTINCT day FROM observations ORDER BY day DESC LIMIT ? \
             ) \
             ORDER BY day, ticker",
        )?;

        let limit = window as i64;
        let params: [&dyn ToSql; 1] = [&limit];
        let mut rows = statement.query(params.as_slice())?;

        let mut observations = Vec::new();
        while let Some(row) = rows.next()? {
            let day: String = row.get(0)?;
            let ticker: String = row.get(1)?;
            let adjusted_close: f64 = row.get(2)?;
            let market_cap: f64 = row.get(3)?;

            let ticker = Ticker::parse(&ticker).map_err(EngineError::from)?;
            let observation = Observation::new(parse_day(&day)?, ticker, adjusted_close, market_cap)
                .map_err(EngineError::from)?;
            observations.push(observation);
        }
        Ok(observations)
    }

    /// Rewrite the four artifact tables from a pipeline run, atomically.
    pub fn store_artifacts(&self, output: &PipelineOutput) -> Result<(), WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), WarehouseError> {
            connection.execute_batch(
                "DELETE FROM index_performance; \
                 DELETE FROM daily_composition; \
                 DELETE FROM composition_changes; \
                 DELETE FROM summary_metrics;",
            )?;

            for point in &output.series.points {
                let day = point.day.to_string();
                let params: [&dyn ToSql; 4] = [
                    &day,
                    &point.index_value,
                    &point.daily_return_pct,
                    &point.cumulative_return_pct,
                ];
                connection.execute(
                    "INSERT INTO index_performance \
                     (day, index_value, daily_return_pct, cumulative_return_pct) \
                     VALUES (CAST(? AS DATE), ?, ?, ?)",
                    params.as_slice(),
                )?;

                let ticker_list = point.ticker_list();
                let params: [&dyn ToSql; 2] = [&day, &ticker_list];
                connection.execute(
                    "INSERT INTO daily_composition (day, ticker_list) \
                     VALUES (CAST(? AS DATE), ?)",
                    params.as_slice(),
                )?;
            }

            for change in &output.changes {
                let day = change.day.to_string();
                let added = change.added_list();
                let removed = change.removed_list();
                let intersection = change.intersection_list();
                let params: [&dyn ToSql; 4] = [&day, &added, &removed, &intersection];
                connection.execute(
                    "INSERT INTO composition_changes \
                     (day, tickers_added, tickers_removed, intersection) \
                     VALUES (CAST(? AS DATE), ?, ?, ?)",
                    params.as_slice(),
                )?;
            }

            for (metric, value) in output.summary.rows() {
                let params: [&dyn ToSql; 2] = [&metric, &value];
                connection.execute(
                    "INSERT INTO summary_metrics (metric, value) VALUES (?, ?)",
                    params.as_slice(),
                )?;
            }

            Ok(())
        })();
        finalize_transaction(&connection, result)?;

        info!(
            "stored artifacts: {} series row(s), {} change row(s)",
            output.series.len(),
            output.changes.len()
        );
        Ok(())
    }

    /// Execute an ad-hoc SQL query.
    ///
    /// Read-only unless `allow_write`; results are capped at `max_rows` and
    /// flagged as truncated when the cap bites.
    pub fn execute_query(
        &self,
        sql: &str,
        max_rows: usize,
        allow_write: bool,
    ) -> Result<QueryResult, WarehouseError> {
        if max_rows == 0 {
            return Err(WarehouseError::QueryRejected(String::from(
                "max rows must be greater than zero",
            )));
        }
        let sql = normalize_sql(sql)?;
        if !allow_write {
            enforce_read_only_query(sql)?;
        }

        let mode = if allow_write {
            AccessMode::ReadWrite
        } else {
            AccessMode::ReadOnly
        };
        let connection = self.pool.acquire(mode)?;

        if is_select_like(sql) {
            execute_select_query(&connection, sql, max_rows)
        } else if allow_write {
            connection.execute_batch(sql)?;
            Ok(QueryResult {
                columns: Vec::new(),
                rows: Vec::new(),
                row_count: 0,
                truncated: false,
            })
        } else {
            Err(WarehouseError::QueryRejected(String::from(
                "only SELECT/CTE queries are allowed unless --write is provided",
            )))
        }
    }
}

fn execute_select_query(
    connection: &Connection,
    sql: &str,
    max_rows: usize,
) -> Result<QueryResult, WarehouseError> {
    let mut statement = connection.prepare(sql)?;
    // Column metadata is only known after execution.
    let _ = statement.query([] as [&dyn ToSql; 0])?;

    let column_count = statement.column_count();
    let mut columns = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let name = statement.column_name(index).unwrap().to_string();
        let dtype = statement.column_type(index);
        columns.push(SqlColumn {
            name,
            r#type: dtype.to_string(),
        });
    }

    let mut cursor = statement.query([] as [&dyn ToSql; 0])?;
    let mut rows = Vec::new();
    let mut truncated = false;
    while let Some(row) = cursor.next()? {
        if rows.len() >= max_rows {
            truncated = true;
            break;
        }

        let mut output = Vec::with_capacity(column_count);
        for index in 0..column_count {
            let value: DuckValue = row.get(index)?;
            output.push(to_json_value(value));
        }
        rows.push(output);
    }

    Ok(QueryResult {
        columns,
        row_count: rows.len(),
        rows,
        truncated,
    })
}

fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

fn count(connection: &Connection, sql: &str) -> Result<usize, WarehouseError> {
    let value: i64 = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(usize::try_from(value).unwrap_or(0))
}

fn staging_columns(connection: &Connection) -> Result<Vec<String>, WarehouseError> {
    let mut statement = connection.prepare("SELECT name FROM pragma_table_info('staging')")?;
    let mut rows = statement.query([] as [&dyn ToSql; 0])?;

    let mut names = Vec::new();
    while let Some(row) = rows.next()? {
        names.push(row.get::<_, String>(0)?);
    }
    Ok(names)
}

/// DuckDB reader expression for a source file, dispatched on extension.
fn reader_clause(path: &Path) -> Result<String, WarehouseError> {
    let escaped = path.display().to_string().replace('\'', "''");
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("csv") => Ok(format!("read_csv_auto('{escaped}')")),
        Some("parquet") => Ok(format!("read_parquet('{escaped}')")),
        _ => Err(WarehouseError::UnsupportedInput {
            path: path.display().to_string(),
        }),
    }
}

fn parse_day(value: &str) -> Result<Date, WarehouseError> {
    Date::parse(value, DAY_FORMAT).map_err(|_| WarehouseError::MalformedDay {
        value: value.to_owned(),
    })
}

fn normalize_sql(sql: &str) -> Result<&str, WarehouseError> {
    let normalized = sql.trim();
    if normalized.is_empty() {
        return Err(WarehouseError::QueryRejected(String::from(
            "query must not be empty",
        )));
    }
    Ok(normalized.trim_end_matches(';').trim())
}

fn enforce_read_only_query(sql: &str) -> Result<(), WarehouseError> {
    if !is_select_like(sql) {
        return Err(WarehouseError::QueryRejected(String::from(
            "read-only mode accepts only SELECT/CTE queries; use --write for write statements",
        )));
    }
    if has_multiple_statements(sql) {
        return Err(WarehouseError::QueryRejected(String::from(
            "multiple SQL statements are not allowed in read-only mode",
        )));
    }
    Ok(())
}

fn is_select_like(sql: &str) -> bool {
    let first_keyword = sql
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    matches!(
        first_keyword.as_str(),
        "SELECT" | "WITH" | "EXPLAIN" | "SHOW" | "DESCRIBE"
    )
}

fn has_multiple_statements(sql: &str) -> bool {
    sql.split(';')
        .filter(|part| !part.trim().is_empty())
        .count()
        > 1
}

fn to_json_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(value) => Value::Bool(value),
        DuckValue::TinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::SmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::Int(value) => Value::Number(Number::from(value)),
        DuckValue::BigInt(value) => Value::Number(Number::from(value)),
        DuckValue::UTinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::USmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::UInt(value) => Value::Number(Number::from(value)),
        DuckValue::UBigInt(value) => Value::Number(Number::from(value)),
        DuckValue::Float(value) => number_from_f64(f64::from(value)),
        DuckValue::Double(value) => number_from_f64(value),
        DuckValue::Text(value) => Value::String(value),
        other => Value::String(format!("{other:?}")),
    }
}

fn number_from_f64(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn resolve_capindex_home() -> PathBuf {
    if let Some(path) = env::var_os("CAPINDEX_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".capindex");
    }

    PathBuf::from(".capindex")
}
