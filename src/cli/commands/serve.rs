use crate::config;

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let mut config = config::config().clone();
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting Classcify API in {:?} mode", config.environment);
    crate::serve(&config).await
}
