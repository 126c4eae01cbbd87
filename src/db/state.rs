// covidsync/src/db/state.rs
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use log::debug;
use sqlx::PgPool;

use crate::config::TableTarget;
use crate::errors::{AppError, Result};

/// What the target table says about previous runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Table absent or empty.
    NoPriorState,
    /// Latest `Date` already persisted.
    LastDate(NaiveDate),
}

impl SyncState {
    /// First day that still has to be fetched.
    pub fn start_date(&self) -> Option<NaiveDate> {
        match self {
            SyncState::NoPriorState => None,
            SyncState::LastDate(last) => last.checked_add_days(Days::new(1)),
        }
    }
}

/// Matches the table under the configured owner, or under the connecting role
/// (`current_user`, who created it through `ensure_table`) when none is set.
pub const TABLE_EXISTS_SQL: &str = "SELECT tablename::text FROM pg_catalog.pg_tables
         WHERE schemaname = $1
           AND tablename = $2
           AND tableowner = COALESCE($3::text, current_user)";

pub fn max_date_sql(target: &TableTarget) -> String {
    format!(r#"SELECT MAX("Date")::text FROM {}"#, target.quoted())
}

pub async fn table_exists(pool: &PgPool, target: &TableTarget) -> Result<bool> {
    let found: Option<String> = sqlx::query_scalar(TABLE_EXISTS_SQL)
        .bind(&target.schema)
        .bind(&target.name)
        .bind(target.owner.as_deref())
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

pub async fn read_sync_state(pool: &PgPool, target: &TableTarget) -> Result<SyncState> {
    if !table_exists(pool, target).await? {
        debug!("Table {} does not exist yet", target.qualified_name());
        return Ok(SyncState::NoPriorState);
    }

    let max_date: Option<String> = sqlx::query_scalar(&max_date_sql(target))
        .fetch_one(pool)
        .await?;

    let state = state_from_max_date(max_date.as_deref())?;
    if state == SyncState::NoPriorState {
        debug!("Table {} exists but holds no rows", target.qualified_name());
    }
    Ok(state)
}

/// `MAX("Date")` is NULL on an empty table.
pub fn state_from_max_date(max_date: Option<&str>) -> Result<SyncState> {
    match max_date {
        Some(raw) => Ok(SyncState::LastDate(parse_stored_date(raw)?)),
        None => Ok(SyncState::NoPriorState),
    }
}

/// Accepts the shapes the `Date` column has been written in: RFC 3339 text,
/// Postgres timestamptz text, naive ISO timestamps and bare dates.
///
/// Offset-carrying values are normalized to UTC before the date is taken,
/// since timestamptz text is rendered in the session's `TimeZone`.
pub fn parse_stored_date(raw: &str) -> Result<NaiveDate> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.with_timezone(&Utc).date_naive());
        }
    }
    let naive = s.trim_end_matches('Z');
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Ok(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| AppError::MalformedStoredDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_start_date_is_day_after_last_persisted() {
        assert_eq!(SyncState::LastDate(ymd(2023, 5, 1)).start_date(), Some(ymd(2023, 5, 2)));
        assert_eq!(SyncState::LastDate(ymd(2020, 12, 31)).start_date(), Some(ymd(2021, 1, 1)));
        assert_eq!(SyncState::NoPriorState.start_date(), None);
    }

    #[test]
    fn test_parse_stored_date_shapes() -> anyhow::Result<()> {
        assert_eq!(parse_stored_date("2023-05-01T00:00:00Z")?, ymd(2023, 5, 1));
        assert_eq!(parse_stored_date("2023-05-01 00:00:00+00")?, ymd(2023, 5, 1));
        assert_eq!(parse_stored_date("2023-05-01 00:00:00.5+00:00")?, ymd(2023, 5, 1));
        assert_eq!(parse_stored_date("2023-05-01T00:00:00")?, ymd(2023, 5, 1));
        assert_eq!(parse_stored_date("2023-05-01 13:45:00")?, ymd(2023, 5, 1));
        assert_eq!(parse_stored_date("2023-05-01")?, ymd(2023, 5, 1));
        Ok(())
    }

    #[test]
    fn test_offset_timestamps_resolve_to_utc_day() -> anyhow::Result<()> {
        // 2023-05-01T00:00Z as rendered under a UTC-4 session
        assert_eq!(parse_stored_date("2023-04-30 20:00:00-04")?, ymd(2023, 5, 1));
        assert_eq!(parse_stored_date("2023-04-30T20:00:00-04:00")?, ymd(2023, 5, 1));
        // and under UTC+9
        assert_eq!(parse_stored_date("2023-05-01 09:00:00+09")?, ymd(2023, 5, 1));

        let state = state_from_max_date(Some("2023-04-30 20:00:00-04"))?;
        assert_eq!(state.start_date(), Some(ymd(2023, 5, 2)));
        Ok(())
    }

    #[test]
    fn test_empty_table_has_no_prior_state() -> anyhow::Result<()> {
        assert_eq!(state_from_max_date(None)?, SyncState::NoPriorState);
        assert_eq!(
            state_from_max_date(Some("2023-05-01T00:00:00Z"))?,
            SyncState::LastDate(ymd(2023, 5, 1))
        );
        assert!(state_from_max_date(Some("not a date")).is_err());
        Ok(())
    }

    #[test]
    fn test_table_lookup_filters_schema_name_and_owner() {
        assert!(TABLE_EXISTS_SQL.contains("FROM pg_catalog.pg_tables"));
        assert!(TABLE_EXISTS_SQL.contains("schemaname = $1"));
        assert!(TABLE_EXISTS_SQL.contains("tablename = $2"));
        // no configured owner falls back to the role that created the table
        assert!(TABLE_EXISTS_SQL.contains("tableowner = COALESCE($3::text, current_user)"));
    }

    #[test]
    fn test_max_date_sql_reads_quoted_target() {
        let target = TableTarget {
            schema: "public".to_string(),
            name: "xm_stg_covid_api".to_string(),
            owner: None,
        };
        assert_eq!(
            max_date_sql(&target),
            r#"SELECT MAX("Date")::text FROM "public"."xm_stg_covid_api""#
        );
    }

    #[test]
    fn test_parse_stored_date_rejects_garbage() {
        let err = parse_stored_date("yesterday-ish").unwrap_err();
        assert!(matches!(err, AppError::MalformedStoredDate(ref v) if v == "yesterday-ish"));
        assert!(parse_stored_date("2023-13-01").is_err());
    }
}
