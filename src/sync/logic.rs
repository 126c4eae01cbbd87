// covidsync/src/sync/logic.rs
use chrono::{Days, NaiveDate};
use log::{debug, error, info, warn};

use crate::api::{CovidApi, DateRange, FetchOutcome, HttpFailure};
use crate::config::PersistFailurePolicy;
use crate::db::store::CaseStore;
use crate::errors::{AppError, Result};

/// Which slice of history to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeDecision {
    FullHistory,
    UpToDate,
    Window(DateRange),
}

/// Terminal state of one run that did not abort the process.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    CountryListUnavailable(HttpFailure),
    UnknownCountry,
    UpToDate,
    RemoteFailure(HttpFailure),
    NoNewRecords,
    Persisted { rows: u64 },
    PersistFailed { kind: &'static str, message: String },
}

/// Decides the request window from the first missing day.
///
/// A start of yesterday or later means the last persisted day is at most two
/// days old and nothing is requested; otherwise the window runs up to today.
pub fn decide_range(start_date: Option<NaiveDate>, today: NaiveDate) -> RangeDecision {
    let Some(start) = start_date else {
        return RangeDecision::FullHistory;
    };
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    if start >= yesterday {
        RangeDecision::UpToDate
    } else {
        RangeDecision::Window(DateRange { from: start, to: today })
    }
}

pub struct SyncRunner<'a, A: CovidApi, S: CaseStore> {
    api: &'a A,
    store: &'a S,
    on_persist_failure: PersistFailurePolicy,
}

impl<'a, A: CovidApi, S: CaseStore> SyncRunner<'a, A, S> {
    pub fn new(api: &'a A, store: &'a S, on_persist_failure: PersistFailurePolicy) -> Self {
        SyncRunner {
            api,
            store,
            on_persist_failure,
        }
    }

    /// Validates the country, fetches the missing cases and appends them.
    ///
    /// # Arguments
    /// * `country` - Display name, matched case-insensitively against `/countries`.
    /// * `start_date` - First day to fetch, `None` for the full history.
    /// * `today` - Upper bound of the request window.
    ///
    /// Exactly one line is logged for whichever branch ends the run. Only
    /// transport failures, undecodable payloads and, under
    /// `PersistFailurePolicy::Fail`, persistence failures come back as `Err`.
    pub async fn run(
        &self,
        country: &str,
        start_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<SyncOutcome> {
        let countries = match self.api.countries().await? {
            FetchOutcome::Success(countries) => countries,
            FetchOutcome::Failed(failure) => {
                error!("Countries list is unavailable: {}", failure);
                return Ok(SyncOutcome::CountryListUnavailable(failure));
            }
        };

        let Some(matched) = countries.iter().find(|c| c.matches(country)) else {
            error!("Country '{}' is not in the list of available countries", country);
            return Ok(SyncOutcome::UnknownCountry);
        };
        debug!("Matched country {} ({})", matched.country, matched.iso2);

        let range = match decide_range(start_date, today) {
            RangeDecision::UpToDate => {
                info!("Data is up to date!");
                return Ok(SyncOutcome::UpToDate);
            }
            RangeDecision::FullHistory => None,
            RangeDecision::Window(range) => Some(range),
        };

        let records = match self
            .api
            .confirmed_cases(matched.path_segment(), range)
            .await?
        {
            FetchOutcome::Success(records) => records,
            FetchOutcome::Failed(failure) => {
                warn!("{}", failure);
                return Ok(SyncOutcome::RemoteFailure(failure));
            }
        };

        if records.is_empty() {
            info!("Data have been read successfully, no new records for '{}'", matched.country);
            return Ok(SyncOutcome::NoNewRecords);
        }

        let persisted = async {
            // first run: the table is created explicitly before the first insert
            if start_date.is_none() {
                self.store.ensure_table().await?;
            }
            self.store.append(&records).await
        }
        .await;

        match persisted {
            Ok(rows) => {
                info!(
                    "Data have been read successfully, {} rows inserted in postgres database",
                    rows
                );
                Ok(SyncOutcome::Persisted { rows })
            }
            Err(e) => match self.on_persist_failure {
                PersistFailurePolicy::Continue => {
                    error!(
                        "Something went wrong with the connection to postgres, error type: {}, error message: {}",
                        e.kind(),
                        e
                    );
                    Ok(SyncOutcome::PersistFailed {
                        kind: e.kind(),
                        message: e.to_string(),
                    })
                }
                PersistFailurePolicy::Fail => Err(AppError::Persist(e)),
            },
        }
    }
}
