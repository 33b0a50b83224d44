use clap::Subcommand;
use serde_json::json;

use crate::auth::password::hash_password;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Print an Argon2 hash for ADMIN_PASSWORD_HASH")]
    HashPassword {
        #[arg(help = "Password to hash")]
        password: String,
    },
}

pub fn handle(cmd: AdminCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AdminCommands::HashPassword { password } => {
            if password.is_empty() {
                anyhow::bail!("password must not be empty");
            }
            let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("hashing failed: {}", e))?;
            match output_format {
                OutputFormat::Json => output_success(&output_format, "Password hashed", Some(json!({ "hash": hash }))),
                OutputFormat::Text => {
                    println!("{}", hash);
                    Ok(())
                }
            }
        }
    }
}
