//! Rendering of command results to stdout.

use crate::cli::OutputFormat;
use crate::commands::CommandOutput;
use crate::error::CliError;

pub fn render(output: &CommandOutput, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => render_json(output, pretty),
        OutputFormat::Table => render_table(output),
    }
}

fn render_json(output: &CommandOutput, pretty: bool) -> Result<(), CliError> {
    let envelope = serde_json::json!({
        "data": output.data,
        "warnings": output.warnings,
    });
    let payload = if pretty {
        serde_json::to_string_pretty(&envelope)?
    } else {
        serde_json::to_string(&envelope)?
    };
    println!("{payload}");
    Ok(())
}

fn render_table(output: &CommandOutput) -> Result<(), CliError> {
    if !output.warnings.is_empty() {
        println!("warnings:");
        for warning in &output.warnings {
            println!("  - {warning}");
        }
    }
    println!("data:");
    let pretty_data = serde_json::to_string_pretty(&output.data)?;
    for line in pretty_data.lines() {
        println!("  {line}");
    }
    Ok(())
}
