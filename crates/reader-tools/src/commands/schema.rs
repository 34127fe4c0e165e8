//! Schema command: JSON Schema for the reader settings document.

use clap::Args;
use reader_tools_core::Settings;
use tracing::{debug, instrument};

/// Arguments for the `schema` subcommand.
#[derive(Args, Debug, Default)]
pub struct SchemaArgs {}

/// The settings document schema as pretty-printed JSON.
pub fn settings_schema() -> anyhow::Result<String> {
    let schema = schemars::schema_for!(Settings);
    Ok(serde_json::to_string_pretty(&schema)?)
}

/// Print the settings schema. Output is JSON with or without `--json`.
#[instrument(name = "cmd_schema", skip_all)]
pub fn cmd_schema(_args: SchemaArgs) -> anyhow::Result<()> {
    debug!("executing schema command");
    println!("{}", settings_schema()?);
    Ok(())
}
