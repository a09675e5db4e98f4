use crate::adapters::http::{build_client, ensure_success, require_key};
use crate::domain::model::RateObservations;
use crate::domain::ports::RateSource;
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;

pub const DEFAULT_ECOS_BASE_URL: &str = "https://ecos.bok.or.kr/api";

const SOURCE_NAME: &str = "ECOS";
/// 市場利率（日資料）
const MARKET_RATE_STAT_CODE: &str = "817Y002";
/// 國庫債 10 年期
const KTB_10Y_ITEM_CODE: &str = "010200000";
const NO_DATA_CODE: &str = "INFO-200";

/// ECOS 統計表與項目代碼
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcosSeriesCode {
    pub stat_code: String,
    pub item_code: String,
}

impl Default for EcosSeriesCode {
    fn default() -> Self {
        Self {
            stat_code: MARKET_RATE_STAT_CODE.to_string(),
            item_code: KTB_10Y_ITEM_CODE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EcosTable<T> {
    #[serde(default = "Vec::new")]
    row: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct EcosResult {
    #[serde(rename = "CODE", default)]
    code: String,
    #[serde(rename = "MESSAGE", default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ItemListResponse {
    #[serde(rename = "StatisticItemList")]
    item_list: Option<EcosTable<ItemRow>>,
}

#[derive(Debug, Deserialize)]
struct ItemRow {
    #[serde(rename = "ITEM_NAME", default)]
    item_name: String,
    #[serde(rename = "ITEM_CODE", default)]
    item_code: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "StatisticSearch")]
    search: Option<EcosTable<SearchRow>>,
    #[serde(rename = "RESULT")]
    result: Option<EcosResult>,
}

#[derive(Debug, Deserialize)]
struct SearchRow {
    #[serde(rename = "TIME", default)]
    time: String,
    #[serde(rename = "DATA_VALUE", default)]
    data_value: Option<String>,
}

/// 韓國銀行 ECOS 國庫債 10 年期殖利率
pub struct EcosClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    series: OnceCell<EcosSeriesCode>,
}

impl EcosClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            series: OnceCell::new(),
        })
    }

    /// 第一次使用時解析序列代碼，之後沿用同一個值
    pub async fn series_code(&self, api_key: &str) -> &EcosSeriesCode {
        self.series
            .get_or_init(|| async {
                match self.lookup_series_code(api_key).await {
                    Ok(Some(code)) => code,
                    Ok(None) => {
                        tracing::info!(
                            "ECOS item list has no 10Y KTB entry, using default item code"
                        );
                        EcosSeriesCode::default()
                    }
                    Err(e) => {
                        tracing::warn!("ECOS item lookup failed ({}), using default item code", e);
                        EcosSeriesCode::default()
                    }
                }
            })
            .await
    }

    async fn lookup_series_code(&self, api_key: &str) -> Result<Option<EcosSeriesCode>> {
        let url = format!(
            "{}/StatisticItemList/{}/json/kr/1/100/{}",
            self.base_url, api_key, MARKET_RATE_STAT_CODE
        );
        let response = self.client.get(&url).send().await?;
        let body: ItemListResponse = ensure_success(SOURCE_NAME, response).await?.json().await?;

        let found = body
            .item_list
            .map(|table| table.row)
            .unwrap_or_default()
            .into_iter()
            .find(|row| row.item_name.contains("국고채") && row.item_name.contains("10년"))
            .map(|row| EcosSeriesCode {
                stat_code: MARKET_RATE_STAT_CODE.to_string(),
                item_code: row.item_code,
            });

        if let Some(code) = &found {
            tracing::debug!("Resolved ECOS 10Y KTB item code: {}", code.item_code);
        }
        Ok(found)
    }
}

#[async_trait]
impl RateSource for EcosClient {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn observations(&self, start: NaiveDate, end: NaiveDate) -> Result<RateObservations> {
        let api_key = require_key(SOURCE_NAME, self.api_key.as_deref())?;
        let series = self.series_code(api_key).await;

        tracing::debug!(
            "📡 ECOS StatisticSearch {}/{} {}..{}",
            series.stat_code,
            series.item_code,
            start,
            end
        );

        let url = format!(
            "{}/StatisticSearch/{}/json/kr/1/10000/{}/D/{}/{}/{}",
            self.base_url,
            api_key,
            series.stat_code,
            start.format("%Y%m%d"),
            end.format("%Y%m%d"),
            series.item_code
        );
        let response = self.client.get(&url).send().await?;
        let body: SearchResponse = ensure_success(SOURCE_NAME, response).await?.json().await?;

        if let Some(result) = body.result {
            if result.code != NO_DATA_CODE {
                return Err(AppError::UpstreamError {
                    source_name: SOURCE_NAME.to_string(),
                    code: result.code,
                    message: result.message,
                });
            }
        }

        let observations: RateObservations = body
            .search
            .map(|table| table.row)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|row| {
                let date = NaiveDate::parse_from_str(&row.time, "%Y%m%d").ok()?;
                let value = row.data_value?.trim().parse::<f64>().ok()?;
                Some((date, value))
            })
            .collect();

        tracing::debug!("ECOS returned {} daily observations", observations.len());
        Ok(observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_series_code_falls_back_to_default() {
        let server = MockServer::start();
        let list_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/StatisticItemList/key/json/kr/1/100/817Y002");
            then.status(500);
        });

        let client =
            EcosClient::new(server.base_url(), Some("key".to_string()), Duration::from_secs(5))
                .unwrap();
        let code = client.series_code("key").await;

        list_mock.assert();
        assert_eq!(code, &EcosSeriesCode::default());
    }

    #[tokio::test]
    async fn test_series_code_resolved_once() {
        let server = MockServer::start();
        let list_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/StatisticItemList/key/json/kr/1/100/817Y002");
            then.status(200).json_body(serde_json::json!({
                "StatisticItemList": {
                    "list_total_count": 2,
                    "row": [
                        {"ITEM_NAME": "국고채(3년)", "ITEM_CODE": "010200000"},
                        {"ITEM_NAME": "국고채(10년)", "ITEM_CODE": "010210000"}
                    ]
                }
            }));
        });

        let client =
            EcosClient::new(server.base_url(), Some("key".to_string()), Duration::from_secs(5))
                .unwrap();
        let first = client.series_code("key").await.clone();
        let second = client.series_code("key").await.clone();

        list_mock.assert_hits(1);
        assert_eq!(first.item_code, "010210000");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_no_data_result_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path_contains("/StatisticItemList/");
            then.status(200).json_body(serde_json::json!({}));
        });
        server.mock(|when, then| {
            when.method(GET).path_contains("/StatisticSearch/");
            then.status(200).json_body(serde_json::json!({
                "RESULT": {"CODE": "INFO-200", "MESSAGE": "해당하는 데이터가 없습니다."}
            }));
        });

        let client =
            EcosClient::new(server.base_url(), Some("key".to_string()), Duration::from_secs(5))
                .unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();

        let observations = client.observations(start, end).await.unwrap();
        assert!(observations.is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_is_error() {
        let client = EcosClient::new(DEFAULT_ECOS_BASE_URL, None, Duration::from_secs(5)).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();

        let err = client.observations(date, date).await.unwrap_err();
        assert!(matches!(err, AppError::MissingCredential { .. }));
    }
}
