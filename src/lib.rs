pub mod agent;
pub mod config;
pub mod facts;
pub mod flow;
pub mod http;
pub mod logging;
pub mod model;
pub mod providers;

use anyhow::{Context, Result};
use std::env;
use tracing::info;

use config::Config;
use flow::{Flow, run_flow};
use http::HttpExecutor;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cfg = Config::from_env()?;
    info!(
        openai_base_url = %cfg.openai_base_url,
        gateway_base_url = %cfg.gateway_base_url,
        retry_attempts = cfg.retry.attempts,
        retry_mode = cfg.retry.mode.as_str(),
        http_timeout_secs = cfg.http_timeout_secs,
        "loaded runtime configuration"
    );

    let executor =
        HttpExecutor::new(cfg.http_timeout_secs).context("Failed to initialize HTTP client")?;

    let flow = Flow::parse(env::args().nth(1).as_deref())?;
    let output = run_flow(flow, &executor, &cfg).await?;
    println!("{output}");
    Ok(())
}
