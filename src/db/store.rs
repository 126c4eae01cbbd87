// covidsync/src/db/store.rs
use async_trait::async_trait;
use log::debug;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::api::CaseRecord;
use crate::config::TableTarget;
use crate::errors::PersistError;

/// Postgres caps a statement at 65535 bind parameters; 10 columns per row.
const INSERT_CHUNK_ROWS: usize = 1000;

const COLUMNS: &str =
    r#""Country", "CountryCode", "Province", "City", "CityCode", "Lat", "Lon", "Cases", "Status", "Date""#;

/// Append-only sink for case records.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Creates the target table with its fixed schema if it is missing.
    async fn ensure_table(&self) -> Result<(), PersistError>;

    /// Inserts every record in one transaction, returns the row count.
    async fn append(&self, records: &[CaseRecord]) -> Result<u64, PersistError>;
}

pub struct PgCaseStore {
    pool: PgPool,
    target: TableTarget,
}

impl PgCaseStore {
    pub fn new(pool: PgPool, target: TableTarget) -> Self {
        PgCaseStore { pool, target }
    }
}

pub fn create_table_sql(target: &TableTarget) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {} (
    "Country" TEXT NOT NULL,
    "CountryCode" TEXT,
    "Province" TEXT,
    "City" TEXT,
    "CityCode" TEXT,
    "Lat" TEXT,
    "Lon" TEXT,
    "Cases" BIGINT NOT NULL,
    "Status" TEXT,
    "Date" TIMESTAMPTZ NOT NULL
)"#,
        target.quoted()
    )
}

fn insert_query<'a>(target: &TableTarget, chunk: &'a [CaseRecord]) -> QueryBuilder<'a, Postgres> {
    let mut builder =
        QueryBuilder::new(format!("INSERT INTO {} ({}) ", target.quoted(), COLUMNS));
    builder.push_values(chunk, |mut row, record| {
        row.push_bind(&record.country)
            .push_bind(&record.country_code)
            .push_bind(&record.province)
            .push_bind(&record.city)
            .push_bind(&record.city_code)
            .push_bind(&record.lat)
            .push_bind(&record.lon)
            .push_bind(record.cases)
            .push_bind(&record.status)
            .push_bind(record.date);
    });
    builder
}

#[async_trait]
impl CaseStore for PgCaseStore {
    async fn ensure_table(&self) -> Result<(), PersistError> {
        sqlx::query(&create_table_sql(&self.target))
            .execute(&self.pool)
            .await
            .map_err(|source| PersistError::CreateTable {
                table: self.target.qualified_name(),
                source,
            })?;
        debug!("Ensured table {} exists", self.target.qualified_name());
        Ok(())
    }

    async fn append(&self, records: &[CaseRecord]) -> Result<u64, PersistError> {
        let mut tx = self.pool.begin().await.map_err(PersistError::Begin)?;
        let mut written = 0;
        for chunk in records.chunks(INSERT_CHUNK_ROWS) {
            let result = insert_query(&self.target, chunk)
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|source| PersistError::Insert {
                    table: self.target.qualified_name(),
                    rows: records.len(),
                    source,
                })?;
            written += result.rows_affected();
        }
        tx.commit().await.map_err(PersistError::Commit)?;
        Ok(written)
    }
}
