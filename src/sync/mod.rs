// covidsync/src/sync/mod.rs
pub(crate) mod logic;

use chrono::NaiveDate;
use log::info;
use sqlx::PgPool;

use crate::api::HttpCovidApi;
use crate::config::AppConfig;
use crate::db::state::{SyncState, read_sync_state};
use crate::db::store::PgCaseStore;
use crate::errors::Result;
pub use logic::SyncOutcome;

/// Public entry point for the sync process.
/// Reads the persisted state, then hands over to the runner with live collaborators.
pub async fn run_sync_flow(pool: &PgPool, app_config: &AppConfig, today: NaiveDate) -> Result<SyncOutcome> {
    let sync_config = &app_config.sync;

    let state = read_sync_state(pool, &sync_config.target).await?;
    match state {
        SyncState::NoPriorState => info!(
            "No prior data in {}, syncing the full history",
            sync_config.target.qualified_name()
        ),
        SyncState::LastDate(last) => info!(
            "Last persisted date in {} is {}",
            sync_config.target.qualified_name(),
            last
        ),
    }

    let api = HttpCovidApi::new(&app_config.api)?;
    let store = PgCaseStore::new(pool.clone(), sync_config.target.clone());
    logic::SyncRunner::new(&api, &store, sync_config.on_persist_failure)
        .run(&sync_config.country, state.start_date(), today)
        .await
}
