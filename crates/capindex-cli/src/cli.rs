//! Command-line argument definitions for the `capindex` binary.
//!
//! | Command  | Purpose                                                        |
//! |----------|----------------------------------------------------------------|
//! | `load`   | Ingest a daily observation file (CSV or Parquet)               |
//! | `build`  | Construct the index series and persist its artifacts           |
//! | `report` | Print the summary metrics from the most recent build           |
//! | `export` | Write a build artifact table to a CSV file                     |
//! | `sql`    | Run ad-hoc SQL against the warehouse (read-only by default)    |

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "capindex",
    author,
    version,
    about = "Market-capitalization-ranked index construction and tracking"
)]
pub struct Cli {
    /// Output format for command results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Data directory holding the warehouse database. Defaults to
    /// $CAPINDEX_HOME, then ~/.capindex.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a daily observation file into the warehouse.
    Load(LoadArgs),
    /// Build the index series, composition deltas, and summary metrics.
    Build(BuildArgs),
    /// Print the summary metrics of the most recent build.
    Report,
    /// Export a build artifact table to CSV.
    Export(ExportArgs),
    /// Run SQL against the warehouse.
    Sql(SqlArgs),
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// CSV or Parquet file with Date, Ticker, Adjusted_Close, and
    /// Market_Cap columns.
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Number of constituents selected per trading day.
    #[arg(long, default_value_t = NonZeroUsize::new(100).unwrap())]
    pub index_size: NonZeroUsize,

    /// Trading-day window, counted back from the latest loaded day.
    #[arg(long, default_value_t = NonZeroUsize::new(30).unwrap())]
    pub days: NonZeroUsize,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Artifact table to export.
    #[arg(long, value_enum)]
    pub table: ArtifactTable,

    /// Destination CSV path.
    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ArtifactTable {
    IndexPerformance,
    DailyComposition,
    CompositionChanges,
    SummaryMetrics,
}

#[derive(Debug, Args)]
pub struct SqlArgs {
    /// SQL text to execute.
    pub query: String,

    /// Allow statements that modify the warehouse.
    #[arg(long, default_value_t = false)]
    pub write: bool,

    /// Maximum number of rows returned before truncation.
    #[arg(long, default_value_t = 10_000)]
    pub max_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_defaults_match_documented_values() {
        let cli = Cli::parse_from(["capindex", "build"]);
        match cli.command {
            Command::Build(args) => {
                assert_eq!(args.index_size.get(), 100);
                assert_eq!(args.days.get(), 30);
            }
            other => panic!("expected build command, got {other:?}"),
        }
    }

    #[test]
    fn sql_defaults_to_read_only() {
        let cli = Cli::parse_from(["capindex", "sql", "SELECT 1"]);
        match cli.command {
            Command::Sql(args) => {
                assert!(!args.write);
                assert_eq!(args.max_rows, 10_000);
            }
            other => panic!("expected sql command, got {other:?}"),
        }
    }
}
