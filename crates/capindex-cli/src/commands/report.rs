use capindex_warehouse::Warehouse;
use serde_json::{json, Value};

use crate::commands::CommandOutput;
use crate::error::CliError;

pub fn run(warehouse: &Warehouse) -> Result<CommandOutput, CliError> {
    let result = warehouse.execute_query("SELECT metric, value FROM summary_metrics", 64, false)?;
    if result.rows.is_empty() {
        return Err(CliError::Command(String::from(
            "no build artifacts found; run 'capindex build' first",
        )));
    }

    let metrics: Vec<Value> = result
        .rows
        .iter()
        .map(|row| {
            json!({
                "metric": row.first().cloned().unwrap_or(Value::Null),
                "value": row.get(1).cloned().unwrap_or(Value::Null),
            })
        })
        .collect();
    Ok(CommandOutput::ok(Value::Array(metrics)))
}
