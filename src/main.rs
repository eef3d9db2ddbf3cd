use anyhow::Result;
use tracing_subscriber::EnvFilter;

use yatra::config::Config;
use yatra::web;

#[tokio::main]
async fn main() -> Result<()> {
    // Local development keeps keys in .env
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    web::run(config).await
}
