use classcify_api::{config, init_tracing, serve};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = config::config();
    tracing::info!("Starting Classcify API in {:?} mode", config.environment);

    serve(config).await
}
