// covidsync/src/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("The environment variable {0} is not set or empty, program has exited")]
    MissingDatabaseUrl(&'static str),

    #[error("There was an operational error when trying to connect to postgres: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Stored value {0:?} in the Date column is not a recognizable date")]
    MalformedStoredDate(String),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Failure kinds for writes to the case table.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("could not open a transaction: {0}")]
    Begin(#[source] sqlx::Error),

    #[error("could not create table {table}: {source}")]
    CreateTable {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("could not insert {rows} rows into {table}: {source}")]
    Insert {
        table: String,
        rows: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("could not commit the transaction: {0}")]
    Commit(#[source] sqlx::Error),
}

impl PersistError {
    pub fn kind(&self) -> &'static str {
        match self {
            PersistError::Begin(_) => "Begin",
            PersistError::CreateTable { .. } => "CreateTable",
            PersistError::Insert { .. } => "Insert",
            PersistError::Commit(_) => "Commit",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
