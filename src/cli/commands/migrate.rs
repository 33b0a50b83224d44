use crate::cli::{utils::output_success, OutputFormat};
use crate::config;
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let database = &config::config().database;
    DatabaseManager::migrate(database).await?;
    output_success(&output_format, "Schema is up to date", None)
}
