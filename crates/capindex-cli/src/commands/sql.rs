use capindex_warehouse::Warehouse;

use crate::cli::SqlArgs;
use crate::commands::CommandOutput;
use crate::error::CliError;

pub fn run(args: &SqlArgs, warehouse: &Warehouse) -> Result<CommandOutput, CliError> {
    let result = warehouse.execute_query(&args.query, args.max_rows, args.write)?;
    let truncated = result.truncated;
    let row_count = result.row_count;

    let mut output = CommandOutput::ok(serde_json::to_value(&result)?);
    if truncated {
        output = output.with_warning(format!(
            "result truncated at {row_count} row(s); raise --max-rows to see more"
        ));
    }
    Ok(output)
}
