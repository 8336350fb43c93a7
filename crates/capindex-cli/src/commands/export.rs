use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use capindex_warehouse::{QueryResult, Warehouse};
use log::info;
use serde_json::{json, Value};

use crate::cli::{ArtifactTable, ExportArgs};
use crate::commands::CommandOutput;
use crate::error::CliError;

// Export reads through the SQL layer so DATE columns come back as
// plain strings rather than driver-specific values.
const EXPORT_ROW_CAP: usize = 1_000_000;

pub fn run(args: &ExportArgs, warehouse: &Warehouse) -> Result<CommandOutput, CliError> {
    let result = warehouse.execute_query(select_sql(args.table), EXPORT_ROW_CAP, false)?;
    write_csv(&args.output, &result)?;
    info!(
        "exported {} row(s) from {} to {}",
        result.row_count,
        table_name(args.table),
        args.output.display()
    );

    Ok(command_output(args.table, &args.output, &result))
}

fn command_output(table: ArtifactTable, destination: &Path, result: &QueryResult) -> CommandOutput {
    let output = CommandOutput::ok(json!({
        "table": table_name(table),
        "output": destination.display().to_string(),
        "rows_exported": result.row_count,
    }));
    if result.truncated {
        output.with_warning(format!(
            "export stopped at {} row(s); the CSV is incomplete",
            result.row_count
        ))
    } else {
        output
    }
}

fn table_name(table: ArtifactTable) -> &'static str {
    match table {
        ArtifactTable::IndexPerformance => "index_performance",
        ArtifactTable::DailyComposition => "daily_composition",
        ArtifactTable::CompositionChanges => "composition_changes",
        ArtifactTable::SummaryMetrics => "summary_metrics",
    }
}

fn select_sql(table: ArtifactTable) -> &'static str {
    match table {
        ArtifactTable::IndexPerformance => {
            "SELECT CAST(day AS VARCHAR) AS day, index_value, daily_return_pct, \
             cumulative_return_pct FROM index_performance ORDER BY day"
        }
        ArtifactTable::DailyComposition => {
            "SELECT CAST(day AS VARCHAR) AS day, ticker_list FROM daily_composition ORDER BY day"
        }
        ArtifactTable::CompositionChanges => {
            "SELECT CAST(day AS VARCHAR) AS day, tickers_added, tickers_removed, intersection \
             FROM composition_changes ORDER BY day"
        }
        ArtifactTable::SummaryMetrics => "SELECT metric, value FROM summary_metrics",
    }
}

fn write_csv(path: &Path, result: &QueryResult) -> Result<(), CliError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let header: Vec<String> = result
        .columns
        .iter()
        .map(|column| escape_csv_field(&column.name))
        .collect();
    writeln!(writer, "{}", header.join(","))?;

    for row in &result.rows {
        let fields: Vec<String> = row
            .iter()
            .map(|value| escape_csv_field(&field_text(value)))
            .collect();
        writeln!(writer, "{}", fields.join(","))?;
    }

    writer.flush()?;
    Ok(())
}

fn field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_pass_through_unquoted() {
        assert_eq!(escape_csv_field("AAPL-MSFT"), "AAPL-MSFT");
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        assert_eq!(escape_csv_field("a,b"), "\"a,b\"");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        assert_eq!(escape_csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn null_values_export_as_empty_fields() {
        assert_eq!(field_text(&Value::Null), "");
        assert_eq!(field_text(&serde_json::json!(1.5)), "1.5");
    }

    #[test]
    fn capped_exports_carry_a_truncation_warning() {
        let result = QueryResult {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: EXPORT_ROW_CAP,
            truncated: true,
        };

        let output = command_output(
            ArtifactTable::IndexPerformance,
            Path::new("performance.csv"),
            &result,
        );
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].contains("incomplete"));
    }

    #[test]
    fn complete_exports_carry_no_warnings() {
        let result = QueryResult {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 3,
            truncated: false,
        };

        let output = command_output(
            ArtifactTable::SummaryMetrics,
            Path::new("summary.csv"),
            &result,
        );
        assert!(output.warnings.is_empty());
    }
}
