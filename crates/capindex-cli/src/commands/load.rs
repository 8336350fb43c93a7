use capindex_warehouse::Warehouse;

use crate::cli::LoadArgs;
use crate::commands::CommandOutput;
use crate::error::CliError;

pub fn run(args: &LoadArgs, warehouse: &Warehouse) -> Result<CommandOutput, CliError> {
    let report = warehouse.load_observations(&args.file)?;
    let mut output = CommandOutput::ok(serde_json::to_value(&report)?);
    if report.rows_rejected > 0 {
        output = output.with_warning(format!(
            "{} row(s) violated value constraints and were excluded",
            report.rows_rejected
        ));
    }
    Ok(output)
}
