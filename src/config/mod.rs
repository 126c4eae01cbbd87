// covidsync/src/config/mod.rs
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Country whose confirmed cases are synced.
pub const COUNTRY: &str = "dominican republic";
pub const TABLE_SCHEMA: &str = "public";
pub const TABLE_NAME: &str = "xm_stg_covid_api";

pub const DATABASE_URL_VAR: &str = "POSTGRES_POSTGRES";
const API_BASE_URL_VAR: &str = "COVID_API_BASE_URL";
const HTTP_TIMEOUT_VAR: &str = "COVID_HTTP_TIMEOUT_SECS";
const DB_CONNECT_TIMEOUT_VAR: &str = "COVID_DB_CONNECT_TIMEOUT_SECS";
const TABLE_OWNER_VAR: &str = "COVID_TABLE_OWNER";
const PERSIST_FAILURE_VAR: &str = "COVID_ON_PERSIST_FAILURE";
const LOG_FILE_VAR: &str = "COVID_LOG_FILE";
const LOG_LEVEL_VAR: &str = "COVID_LOG_LEVEL";

const DEFAULT_API_BASE_URL: &str = "https://api.covid19api.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_FILE: &str = "log.txt";
const DEFAULT_LOG_LEVEL: &str = "debug";

/// What to do when appending fetched records to the table fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistFailurePolicy {
    /// Log the failure and end the run normally.
    #[default]
    Continue,
    /// Surface the failure to the caller, which exits non-zero.
    Fail,
}

impl std::str::FromStr for PersistFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" | "log" => Ok(PersistFailurePolicy::Continue),
            "fail" | "abort" => Ok(PersistFailurePolicy::Fail),
            other => Err(anyhow::anyhow!(
                "unknown persist failure policy '{}', expected 'continue' or 'fail'",
                other
            )),
        }
    }
}

/// Schema-qualified table the cases are appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTarget {
    pub schema: String,
    pub name: String,
    /// Expected `tableowner` in `pg_catalog.pg_tables`, `None` means the connecting role.
    pub owner: Option<String>,
}

impl TableTarget {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Double-quoted identifier pair for use in SQL text.
    pub fn quoted(&self) -> String {
        format!(
            r#""{}"."{}""#,
            self.schema.replace('"', "\"\""),
            self.name.replace('"', "\"\"")
        )
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub file: PathBuf,
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Left unvalidated here so the bootstrapper can log the failure.
    pub url: Option<String>,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub country: String,
    pub target: TableTarget,
    pub on_persist_failure: PersistFailurePolicy,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log: LogConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub sync: SyncConfig,
}

impl LogConfig {
    /// Never fails, the logger has to come up before anything else can be reported.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        LogConfig {
            file: non_empty(&lookup, LOG_FILE_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            level: non_empty(&lookup, LOG_LEVEL_VAR)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url_str = non_empty(&lookup, API_BASE_URL_VAR)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let base_url = Url::parse(&base_url_str)
            .with_context(|| format!("{} is not a valid URL: {}", API_BASE_URL_VAR, base_url_str))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow::anyhow!(
                "{} must be an http(s) base URL, got {}",
                API_BASE_URL_VAR,
                base_url_str
            ));
        }

        let on_persist_failure = match non_empty(&lookup, PERSIST_FAILURE_VAR) {
            Some(raw) => raw
                .parse::<PersistFailurePolicy>()
                .with_context(|| format!("Failed to parse {}", PERSIST_FAILURE_VAR))?,
            None => PersistFailurePolicy::default(),
        };

        let owner = non_empty(&lookup, TABLE_OWNER_VAR);

        Ok(AppConfig {
            log: LogConfig::from_lookup(&lookup),
            database: DatabaseConfig {
                url: non_empty(&lookup, DATABASE_URL_VAR),
                connect_timeout: parse_secs(&lookup, DB_CONNECT_TIMEOUT_VAR)?,
            },
            api: ApiConfig {
                base_url,
                timeout: parse_secs(&lookup, HTTP_TIMEOUT_VAR)?,
            },
            sync: SyncConfig {
                country: COUNTRY.to_string(),
                target: TableTarget {
                    schema: TABLE_SCHEMA.to_string(),
                    name: TABLE_NAME.to_string(),
                    owner,
                },
                on_persist_failure,
            },
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match non_empty(lookup, key) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{} must be a whole number of seconds, got '{}'", key, raw))?,
        None => DEFAULT_TIMEOUT_SECS,
    };
    if secs == 0 {
        return Err(anyhow::anyhow!("{} must be greater than zero", key));
    }
    Ok(Duration::from_secs(secs))
}
