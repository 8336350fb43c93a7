mod build;
mod export;
mod load;
mod report;
mod sql;

use capindex_warehouse::{Warehouse, WarehouseConfig};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Result payload shared by every command: a JSON body plus any
/// warnings collected along the way.
#[derive(Debug)]
pub struct CommandOutput {
    pub data: Value,
    pub warnings: Vec<String>,
}

impl CommandOutput {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

pub fn run(cli: &Cli) -> Result<CommandOutput, CliError> {
    let config = match &cli.data_dir {
        Some(dir) => WarehouseConfig::at(dir),
        None => WarehouseConfig::default(),
    };
    let warehouse = Warehouse::open(config)?;
    match &cli.command {
        Command::Load(args) => load::run(args, &warehouse),
        Command::Build(args) => build::run(args, &warehouse),
        Command::Report => report::run(&warehouse),
        Command::Export(args) => export::run(args, &warehouse),
        Command::Sql(args) => sql::run(args, &warehouse),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::cli::Cli;
    use crate::error::CliError;

    fn run_command(data_dir: &std::path::Path, tail: &[&str]) -> Result<super::CommandOutput, CliError> {
        let mut argv = vec!["capindex", "--data-dir", data_dir.to_str().unwrap()];
        argv.extend_from_slice(tail);
        super::run(&Cli::parse_from(argv))
    }

    fn seed_csv(dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.join("observations.csv");
        std::fs::write(
            &path,
            "Date,Ticker,Adjusted_Close,Market_Cap\n\
             2026-01-05,AAPL,180.0,2800.0\n\
             2026-01-05,MSFT,410.0,3100.0\n\
             2026-01-05,NVDA,120.0,2900.0\n\
             2026-01-06,AAPL,181.0,2810.0\n\
             2026-01-06,MSFT,408.0,3080.0\n\
             2026-01-06,NVDA,131.0,3150.0\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn load_build_report_pipeline_runs_end_to_end() {
        // given
        let tempdir = tempfile::tempdir().unwrap();
        let csv = seed_csv(tempdir.path());

        // when
        let loaded = run_command(tempdir.path(), &["load", csv.to_str().unwrap()]).unwrap();
        let built = run_command(
            tempdir.path(),
            &["build", "--index-size", "2", "--days", "30"],
        )
        .unwrap();
        let reported = run_command(tempdir.path(), &["report"]).unwrap();

        // then
        assert_eq!(loaded.data["rows_loaded"], 6);
        assert!(loaded.warnings.is_empty());

        assert_eq!(built.data["window_days"], 2);
        assert_eq!(built.data["first_day"], "2026-01-05");
        assert_eq!(built.data["last_day"], "2026-01-06");
        // Day one seeds MSFT+NVDA (both "added"); day two keeps the same
        // pair, so no further turnover.
        assert_eq!(built.data["total_added"], 2);
        assert_eq!(built.data["total_removed"], 0);

        let metrics = reported.data.as_array().unwrap();
        assert_eq!(metrics.len(), 5);
        assert!(metrics
            .iter()
            .any(|row| row["metric"] == "Aggregate Return (%)"));
    }

    #[test]
    fn report_before_build_fails_with_guidance() {
        // given
        let tempdir = tempfile::tempdir().unwrap();

        // when
        let error = run_command(tempdir.path(), &["report"]).unwrap_err();

        // then
        assert_eq!(error.exit_code(), 2);
        assert!(error.to_string().contains("capindex build"));
    }

    #[test]
    fn build_without_observations_fails_with_guidance() {
        // given
        let tempdir = tempfile::tempdir().unwrap();

        // when
        let error = run_command(tempdir.path(), &["build"]).unwrap_err();

        // then
        assert_eq!(error.exit_code(), 2);
        assert!(error.to_string().contains("capindex load"));
    }

    #[test]
    fn export_writes_artifact_csv() {
        // given
        let tempdir = tempfile::tempdir().unwrap();
        let csv = seed_csv(tempdir.path());
        run_command(tempdir.path(), &["load", csv.to_str().unwrap()]).unwrap();
        run_command(tempdir.path(), &["build", "--index-size", "2"]).unwrap();
        let destination = tempdir.path().join("performance.csv");

        // when
        let exported = run_command(
            tempdir.path(),
            &[
                "export",
                "--table",
                "index-performance",
                "--output",
                destination.to_str().unwrap(),
            ],
        )
        .unwrap();

        // then
        assert_eq!(exported.data["rows_exported"], 2);
        let contents = std::fs::read_to_string(&destination).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "day,index_value,daily_return_pct,cumulative_return_pct"
        );
        assert!(lines.next().unwrap().starts_with("2026-01-05,"));
    }

    #[test]
    fn sql_command_rejects_writes_without_flag() {
        // given
        let tempdir = tempfile::tempdir().unwrap();

        // when
        let error = run_command(
            tempdir.path(),
            &["sql", "DELETE FROM observations"],
        )
        .unwrap_err();

        // then
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn sql_command_reads_loaded_rows() {
        // given
        let tempdir = tempfile::tempdir().unwrap();
        let csv = seed_csv(tempdir.path());
        run_command(tempdir.path(), &["load", csv.to_str().unwrap()]).unwrap();

        // when
        let result = run_command(
            tempdir.path(),
            &["sql", "SELECT COUNT(*) AS n FROM observations"],
        )
        .unwrap();

        // then
        assert_eq!(result.data["rows"][0][0], 6);
    }
}
