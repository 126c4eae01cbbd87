//! COVID-19 case sync
//!
//! Appends the confirmed cases published since the last run to a Postgres table.

// covidsync/src/main.rs
mod api;
mod config;
mod db;
mod errors;
mod sync;
mod utils;

use anyhow::{Context, Result};
use config::{AppConfig, LogConfig};
use log::error;
use std::process::ExitCode;

/// Main entry point, meant to be started by an external scheduler once per tick
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let log_config = LogConfig::from_lookup(|key| std::env::var(key).ok());
    let _logger = match utils::logging::init(&log_config) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            return ExitCode::FAILURE;
        }
    };

    match run_app().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    let app_config = AppConfig::from_env().context("Failed to load configuration from the environment")?;

    let pool = db::bootstrap(&app_config.database)
        .await
        .context("Could not connect to the database, program has exited")?;

    let today = chrono::Local::now().date_naive();
    let result = sync::run_sync_flow(&pool, &app_config, today).await;
    pool.close().await;

    result.context("Sync run failed")?;
    Ok(())
}
