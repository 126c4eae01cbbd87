// covidsync/src/api/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Entry of `GET /countries`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountryRecord {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Slug", default)]
    pub slug: String,
    #[serde(rename = "ISO2", default)]
    pub iso2: String,
}

impl CountryRecord {
    pub fn matches(&self, name: &str) -> bool {
        self.country.trim().to_lowercase() == name.trim().to_lowercase()
    }

    /// The slug is the canonical path key, the display name is the fallback.
    pub fn path_segment(&self) -> &str {
        if self.slug.trim().is_empty() {
            self.country.trim()
        } else {
            self.slug.trim()
        }
    }
}

/// One day of confirmed cases for a country (or one of its provinces).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CaseRecord {
    pub country: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub city_code: String,
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub lon: String,
    pub cases: i64,
    #[serde(default)]
    pub status: String,
    pub date: DateTime<Utc>,
}

/// Inclusive `from`/`to` window sent as query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("from", self.from.format("%Y-%m-%d").to_string()),
            ("to", self.to.format("%Y-%m-%d").to_string()),
        ]
    }
}
