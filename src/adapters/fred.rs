use crate::adapters::http::{build_client, ensure_success, require_key};
use crate::domain::model::RateObservations;
use crate::domain::ports::RateSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_FRED_BASE_URL: &str = "https://api.stlouisfed.org";

const SOURCE_NAME: &str = "FRED";
const US_10Y_SERIES: &str = "DGS10";
/// FRED 以 "." 表示當日無資料
const MISSING_VALUE: &str = ".";

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

/// St. Louis Fed FRED 美國 10 年期公債殖利率（DGS10）
pub struct FredClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    series_id: String,
}

impl FredClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            series_id: US_10Y_SERIES.to_string(),
        })
    }
}

#[async_trait]
impl RateSource for FredClient {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn observations(&self, start: NaiveDate, end: NaiveDate) -> Result<RateObservations> {
        let api_key = require_key(SOURCE_NAME, self.api_key.as_deref())?;
        let url = format!("{}/fred/series/observations", self.base_url);
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();

        tracing::debug!("📡 FRED {} {}..{}", self.series_id, start, end);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("series_id", self.series_id.as_str()),
                ("api_key", api_key),
                ("file_type", "json"),
                ("observation_start", start.as_str()),
                ("observation_end", end.as_str()),
            ])
            .send()
            .await?;
        let body: ObservationsResponse = ensure_success(SOURCE_NAME, response).await?.json().await?;

        let observations: RateObservations = body
            .observations
            .into_iter()
            .filter(|obs| obs.value != MISSING_VALUE)
            .filter_map(|obs| {
                let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d").ok()?;
                let value = obs.value.trim().parse::<f64>().ok()?;
                Some((date, value))
            })
            .collect();

        tracing::debug!("FRED returned {} daily observations", observations.len());
        Ok(observations)
    }
}
