use capindex_core::engine;
use capindex_warehouse::Warehouse;
use log::info;
use serde_json::json;

use crate::cli::BuildArgs;
use crate::commands::CommandOutput;
use crate::error::CliError;

pub fn run(args: &BuildArgs, warehouse: &Warehouse) -> Result<CommandOutput, CliError> {
    let days = warehouse.trading_days(args.days.get())?;
    if days.is_empty() {
        return Err(CliError::Command(String::from(
            "no observations loaded; run 'capindex load' first",
        )));
    }

    let observations = warehouse.fetch_observations(args.days.get())?;
    info!(
        "building size-{} index over {} trading day(s)",
        args.index_size,
        days.len()
    );

    let output = engine::run(&observations, &days, args.index_size)?;
    warehouse.store_artifacts(&output)?;

    let first = output.series.points.first();
    let last = output.series.points.last();
    let data = json!({
        "index_size": args.index_size.get(),
        "window_days": days.len(),
        "first_day": first.map(|point| point.day.to_string()),
        "last_day": last.map(|point| point.day.to_string()),
        "final_index_value": last.map(|point| point.index_value),
        "aggregate_return_pct": output.summary.aggregate_return_pct,
        "total_added": output.summary.total_added,
        "total_removed": output.summary.total_removed,
        "degraded_days": output.degraded_days,
    });

    let mut result = CommandOutput::ok(data);
    for degraded in &output.degraded_days {
        result = result.with_warning(format!(
            "{}: only {} of {} requested constituents available",
            degraded.day, degraded.candidates, degraded.requested
        ));
    }
    Ok(result)
}
