// covidsync/src/api/mod.rs
pub(crate) mod models;
pub(crate) mod outcome;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ApiConfig;
use crate::errors::{AppError, Result};
pub use models::{CaseRecord, CountryRecord, DateRange};
pub use outcome::{FetchOutcome, HttpFailure};

/// The two endpoints of the COVID-19 API the sync needs.
#[async_trait]
pub trait CovidApi: Send + Sync {
    async fn countries(&self) -> Result<FetchOutcome<Vec<CountryRecord>>>;

    /// `range = None` requests the full history.
    async fn confirmed_cases(
        &self,
        country: &str,
        range: Option<DateRange>,
    ) -> Result<FetchOutcome<Vec<CaseRecord>>>;
}

#[derive(Debug, Clone)]
pub struct HttpCovidApi {
    client: Client,
    base_url: Url,
}

impl HttpCovidApi {
    pub fn new(api_config: &ApiConfig) -> Result<Self> {
        let client = reqwest::ClientBuilder::new()
            .timeout(api_config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpCovidApi {
            client,
            base_url: api_config.base_url.clone(),
        })
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        endpoint_url(&self.base_url, segments)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<FetchOutcome<T>> {
        debug!("GET {} {:?}", url, query);
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let reason = response
                .extensions()
                .get::<hyper::ext::ReasonPhrase>()
                .and_then(|phrase| std::str::from_utf8(phrase.as_bytes()).ok())
                .map(str::to_string);
            return Ok(FetchOutcome::Failed(HttpFailure::from_status_and_reason(
                status,
                reason.as_deref(),
            )));
        }
        let body = response.bytes().await?;
        Ok(FetchOutcome::Success(serde_json::from_slice(&body)?))
    }
}

#[async_trait]
impl CovidApi for HttpCovidApi {
    async fn countries(&self) -> Result<FetchOutcome<Vec<CountryRecord>>> {
        let url = self.endpoint(&["countries"])?;
        self.get_json(url, &[]).await
    }

    async fn confirmed_cases(
        &self,
        country: &str,
        range: Option<DateRange>,
    ) -> Result<FetchOutcome<Vec<CaseRecord>>> {
        let url = self.endpoint(&["dayone", "country", country, "status", "confirmed"])?;
        match range {
            Some(range) => self.get_json(url, &range.query_pairs()).await,
            None => self.get_json(url, &[]).await,
        }
    }
}

fn endpoint_url(base_url: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| AppError::Config(format!("API base URL cannot take a path: {}", base_url)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_country_name() -> anyhow::Result<()> {
        let base = Url::parse("https://api.covid19api.com")?;
        let url = endpoint_url(
            &base,
            &["dayone", "country", "dominican republic", "status", "confirmed"],
        )?;
        assert_eq!(
            url.as_str(),
            "https://api.covid19api.com/dayone/country/dominican%20republic/status/confirmed"
        );
        Ok(())
    }

    #[test]
    fn test_endpoint_keeps_base_path() -> anyhow::Result<()> {
        let base = Url::parse("http://localhost:8080/v1/")?;
        let url = endpoint_url(&base, &["countries"])?;
        assert_eq!(url.as_str(), "http://localhost:8080/v1/countries");
        Ok(())
    }

    #[test]
    fn test_client_builds_from_config() -> anyhow::Result<()> {
        let api = HttpCovidApi::new(&ApiConfig {
            base_url: Url::parse("https://api.covid19api.com")?,
            timeout: std::time::Duration::from_secs(3),
        })?;
        assert_eq!(api.endpoint(&["countries"])?.path(), "/countries");
        Ok(())
    }
}
