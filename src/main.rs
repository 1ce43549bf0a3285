use anyhow::Context;
use env_logger::Env;
use satirist::config::AppConfig;
use satirist::pipeline::Satirist;
use satirist::server::run_server;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse the specified (or default) .env file before the logger reads RUST_LOG
    let dotenv_path = env::var("SATIRIST_DOTENV_PATH").unwrap_or_else(|_| ".env".to_string());
    let dotenv_result = dotenvy::from_path(&dotenv_path);

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match dotenv_result {
        Ok(()) => log::info!("Loaded env from {}", dotenv_path),
        Err(err) => log::debug!("No .env loaded from {}: {}", dotenv_path, err),
    }

    let config = AppConfig::from_env().context("Reading configuration")?;
    let satirist = Satirist::from_config(&config).context("Building satire pipeline")?;

    run_server(&config.server, satirist).await
}
