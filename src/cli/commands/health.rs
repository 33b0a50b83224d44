use serde_json::Value;
use std::time::Duration;

use crate::cli::utils::output_value;
use crate::cli::OutputFormat;

pub async fn handle(base_url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let url = format!("{}/health", base_url.trim_end_matches('/'));
    let client = reqwest::Client::builder().timeout(Duration::from_secs(5)).build()?;

    let response = client.get(&url).send().await?;
    let status = response.status();
    let body: Value = response.json().await?;

    output_value(&output_format, &body)?;
    if !status.is_success() {
        anyhow::bail!("{} returned {}", url, status);
    }
    Ok(())
}
