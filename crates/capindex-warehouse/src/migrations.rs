use duckdb::Connection;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_observations",
        sql: r#"
CREATE TABLE IF NOT EXISTS observations (
    day DATE NOT NULL,
    ticker TEXT NOT NULL,
    adjusted_close DOUBLE NOT NULL,
    market_cap DOUBLE NOT NULL,
    loaded_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY(day, ticker)
);

CREATE TABLE IF NOT EXISTS ingest_log (
    source_path TEXT NOT NULL,
    rows_loaded BIGINT NOT NULL,
    rows_rejected BIGINT NOT NULL,
    days BIGINT NOT NULL,
    status TEXT NOT NULL,
    loaded_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    },
    Migration {
        version: "0002_artifacts",
        sql: r#"
CREATE TABLE IF NOT EXISTS index_performance (
    day DATE PRIMARY KEY,
    index_value DOUBLE NOT NULL,
    daily_return_pct DOUBLE NOT NULL,
    cumulative_return_pct DOUBLE NOT NULL
);

CREATE TABLE IF NOT EXISTS daily_composition (
    day DATE PRIMARY KEY,
    ticker_list TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS composition_changes (
    day DATE PRIMARY KEY,
    tickers_added TEXT NOT NULL,
    tickers_removed TEXT NOT NULL,
    intersection TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS summary_metrics (
    metric TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#,
    },
    Migration {
        version: "0003_indexes",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_observations_day ON observations(day);
CREATE INDEX IF NOT EXISTS idx_observations_ticker_day ON observations(ticker, day);
"#,
    },
];

pub fn apply_migrations(connection: &Connection) -> Result<(), duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let query = format!(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = '{}'",
            escape_sql_string(migration.version)
        );
        let applied_count: i64 = connection.query_row(query.as_str(), [], |row| row.get(0))?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            let insert = format!(
                "INSERT INTO schema_migrations (version) VALUES ('{}')",
                escape_sql_string(migration.version)
            );
            connection.execute_batch(insert.as_str())?;
        }
    }

    Ok(())
}

fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}
