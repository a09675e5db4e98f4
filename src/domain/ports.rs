use crate::domain::model::{AnalysisParams, CorpEntry, PeriodReport, RateObservations, ReportPeriod};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn dart_api_key(&self) -> Option<&str>;
    fn ecos_api_key(&self) -> Option<&str>;
    fn fred_api_key(&self) -> Option<&str>;
    fn dart_base_url(&self) -> &str;
    fn ecos_base_url(&self) -> &str;
    fn fred_base_url(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn cache_ttl(&self) -> Duration;
    fn cache_capacity(&self) -> usize;
    fn analysis_params(&self) -> AnalysisParams;
}

/// 公開揭露資料來源（DART）
#[async_trait]
pub trait DisclosureSource: Send + Sync {
    /// 查無資料時回傳 `Ok(None)`，不視為錯誤
    async fn period_report(
        &self,
        corp_code: &str,
        period: ReportPeriod,
    ) -> Result<Option<PeriodReport>>;

    async fn search_corp(&self, keyword: &str, limit: usize) -> Result<Vec<CorpEntry>>;
}

/// 利率序列來源（ECOS、FRED）
#[async_trait]
pub trait RateSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn observations(&self, start: NaiveDate, end: NaiveDate) -> Result<RateObservations>;
}

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    /// `ttl` 為 `None` 時使用快取預設存活時間
    async fn put(&self, key: String, value: String, ttl: Option<Duration>);
}
