use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;
use crate::config;

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Print the effective configuration (secrets omitted)")]
    Show,

    #[command(about = "Fail if the configuration can't start a server")]
    Check,
}

pub fn handle(cmd: ConfigCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();

    match cmd {
        ConfigCommands::Show => output_value(&output_format, &serde_json::to_value(config)?),
        ConfigCommands::Check => {
            config.validate()?;
            output_success(
                &output_format,
                "Configuration is valid",
                Some(json!({ "environment": config.environment })),
            )
        }
    }
}
