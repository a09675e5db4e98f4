use crate::adapters::{DartClient, EcosClient, FredClient, TtlCache};
use crate::core::companies::{find_company, supported_ids};
use crate::core::{Cache, ConfigProvider, DisclosureSource, RateSource};
use crate::domain::model::{
    AnalysisParams, AnalysisResult, Company, CorpEntry, DurationPair, QuarterRecord,
    RateObservations, ReportPeriod,
};
use crate::domain::services::change::round_to;
use crate::domain::services::{aggregate, align_to_dates, duration, qoq_change, rate_change};
use crate::utils::error::{AppError, CategorizedError, ErrorCategory, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range};
use chrono::{Datelike, Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

pub const MIN_QUARTERS: usize = 2;
pub const MAX_YEAR_COUNT: usize = 20;
pub const CORP_SEARCH_LIMIT: usize = 20;
const DISPLAY_UNIT: f64 = 100_000_000.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub company_id: String,
    pub year_count: usize,
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            company_id: "samsung".to_string(),
            year_count: 3,
        }
    }
}

/// 分析引擎的外部依賴
#[derive(Clone)]
pub struct AnalysisDeps {
    pub disclosure: Arc<dyn DisclosureSource>,
    pub us_rates: Arc<dyn RateSource>,
    pub kr_rates: Arc<dyn RateSource>,
    pub cache: Arc<dyn Cache>,
}

pub struct AnalysisEngine {
    deps: AnalysisDeps,
    params: AnalysisParams,
}

impl AnalysisEngine {
    pub fn new(deps: AnalysisDeps, params: AnalysisParams) -> Self {
        Self { deps, params }
    }

    /// 以設定建立 DART / FRED / ECOS 客戶端與記憶體快取
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let timeout = config.request_timeout();
        let deps = AnalysisDeps {
            disclosure: Arc::new(DartClient::new(
                config.dart_base_url(),
                config.dart_api_key().map(str::to_string),
                timeout,
            )?),
            us_rates: Arc::new(FredClient::new(
                config.fred_base_url(),
                config.fred_api_key().map(str::to_string),
                timeout,
            )?),
            kr_rates: Arc::new(EcosClient::new(
                config.ecos_base_url(),
                config.ecos_api_key().map(str::to_string),
                timeout,
            )?),
            cache: Arc::new(TtlCache::new(config.cache_ttl(), config.cache_capacity())),
        };
        Ok(Self::new(deps, config.analysis_params()))
    }

    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> std::result::Result<AnalysisResult, CategorizedError> {
        self.analyze_as_of(request, Local::now().date_naive()).await
    }

    /// 以 `today` 作為基準日執行分析：資本 → 資料量檢查 → FRED → ECOS → 計算
    pub async fn analyze_as_of(
        &self,
        request: &AnalysisRequest,
        today: NaiveDate,
    ) -> std::result::Result<AnalysisResult, CategorizedError> {
        let company = find_company(&request.company_id).ok_or_else(|| {
            CategorizedError::new(
                ErrorCategory::Input,
                format!("Unsupported company: {}", request.company_id),
                format!("Supported companies: {}", supported_ids().join(", ")),
            )
        })?;
        validate_range("year_count", request.year_count, 1, MAX_YEAR_COUNT).map_err(|e| {
            CategorizedError::from_cause(ErrorCategory::Input, "Invalid year count", e)
        })?;

        tracing::info!(
            "🚀 Starting duration analysis for {} ({}), {} years",
            company.name,
            company.id,
            request.year_count
        );

        // 1. 資本總計
        let records = self
            .quarter_records(&company, request.year_count, today)
            .await
            .map_err(|e| {
                CategorizedError::from_cause(ErrorCategory::Dart, "Failed to fetch capital data", e)
            })?;

        if records.len() < MIN_QUARTERS {
            return Err(CategorizedError::new(
                ErrorCategory::Data,
                "Insufficient data",
                format!(
                    "At least {} quarters of data are required, found {}",
                    MIN_QUARTERS,
                    records.len()
                ),
            ));
        }

        let quarters: Vec<NaiveDate> = records.iter().map(|r| r.quarter_end).collect();
        let (start, end) = self.rate_window(&quarters)?;

        // 2. 利率序列
        let us_observations = self
            .rate_observations(self.deps.us_rates.as_ref(), start, end)
            .await
            .map_err(|e| {
                CategorizedError::from_cause(ErrorCategory::Fred, "US 10Y rate lookup failed", e)
            })?;
        let kr_observations = self
            .rate_observations(self.deps.kr_rates.as_ref(), start, end)
            .await
            .map_err(|e| {
                CategorizedError::from_cause(ErrorCategory::Ecos, "KR 10Y rate lookup failed", e)
            })?;

        // 3. 對齊與計算
        let result = self.compute(&company, &records, &us_observations, &kr_observations);

        tracing::info!(
            "✅ Analysis complete for {}: {} quarters, US10Y duration {:?}, KR10Y duration {:?}",
            company.id,
            result.quarters.len(),
            result.duration.us10y.summary,
            result.duration.kr10y.summary
        );
        Ok(result)
    }

    /// 公司名稱關鍵字查詢 corp_code（除錯用）
    pub async fn search_corp(
        &self,
        keyword: &str,
    ) -> std::result::Result<Vec<CorpEntry>, CategorizedError> {
        validate_non_empty_string("keyword", keyword).map_err(|e| {
            CategorizedError::from_cause(ErrorCategory::Input, "Keyword is required", e)
        })?;

        self.deps
            .disclosure
            .search_corp(keyword.trim(), CORP_SEARCH_LIMIT)
            .await
            .map_err(|e| {
                CategorizedError::from_cause(ErrorCategory::Dart, "Corp code search failed", e)
            })
    }

    fn compute(
        &self,
        company: &Company,
        records: &[QuarterRecord],
        us_observations: &RateObservations,
        kr_observations: &RateObservations,
    ) -> AnalysisResult {
        let quarters: Vec<NaiveDate> = records.iter().map(|r| r.quarter_end).collect();
        let lookback = self.params.max_lookback_days;

        let us10y_level = align_to_dates(us_observations, &quarters, lookback);
        let kr10y_level = align_to_dates(kr_observations, &quarters, lookback);

        let capital: Vec<Option<f64>> = records.iter().map(|r| Some(r.capital as f64)).collect();
        let capital_qoq = qoq_change(&capital);
        let us10y_change = rate_change(&us10y_level);
        let kr10y_change = rate_change(&kr10y_level);

        let threshold = self.params.outlier_threshold;
        let duration = DurationPair {
            us10y: duration(&capital_qoq, &us10y_change, threshold),
            kr10y: duration(&capital_qoq, &kr10y_change, threshold),
        };

        AnalysisResult {
            capital_level: records.iter().map(|r| to_display_units(Some(r.capital))).collect(),
            asset_level: records.iter().map(|r| to_display_units(r.asset)).collect(),
            liability_level: records.iter().map(|r| to_display_units(r.liability)).collect(),
            quarters,
            us10y_level,
            kr10y_level,
            capital_qoq,
            us10y_change,
            kr10y_change,
            duration,
            company: company.name.clone(),
        }
    }

    /// 利率查詢區間：最早季末往前 lookback 天至最晚季末
    fn rate_window(&self, quarters: &[NaiveDate]) -> Result<(NaiveDate, NaiveDate)> {
        let (Some(first), Some(last)) = (quarters.iter().min(), quarters.iter().max()) else {
            return Err(AppError::DataInsufficient {
                message: "No quarter dates to align".to_string(),
            });
        };
        let start = first
            .checked_sub_signed(chrono::Duration::days(i64::from(self.params.max_lookback_days)))
            .ok_or_else(|| AppError::ConfigError {
                message: format!("Lookback window underflows before {}", first),
            })?;
        Ok((start, *last))
    }

    async fn quarter_records(
        &self,
        company: &Company,
        year_count: usize,
        today: NaiveDate,
    ) -> Result<Vec<QuarterRecord>> {
        let key = format!("dart:equity:{}:{}:{}", company.corp_code, year_count, today);
        self.cached(key, || self.fetch_quarter_records(company, year_count, today))
            .await
    }

    /// 逐期查詢報告；單期失敗只記錄並略過，金鑰未設定則直接失敗
    async fn fetch_quarter_records(
        &self,
        company: &Company,
        year_count: usize,
        today: NaiveDate,
    ) -> Result<Vec<QuarterRecord>> {
        let end_year = today.year();
        let start_year = end_year - year_count as i32;
        let periods = ReportPeriod::range(start_year, end_year, today);

        let mut reports = Vec::with_capacity(periods.len());
        let mut last_error = None;

        for period in periods {
            match self.deps.disclosure.period_report(&company.corp_code, period).await {
                Ok(Some(report)) => reports.push(report),
                Ok(None) => {
                    tracing::debug!("No DART data for {} {}", period.year, period.code.label());
                }
                Err(e @ AppError::MissingCredential { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "DART lookup failed ({} {}): {}",
                        period.year,
                        period.code.label(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        aggregate(&reports, Some(year_count)).map_err(|e| last_error.unwrap_or(e))
    }

    async fn rate_observations(
        &self,
        source: &dyn RateSource,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateObservations> {
        let key = format!("{}:10y:{}:{}", source.name().to_ascii_lowercase(), start, end);
        self.cached(key, || source.observations(start, end)).await
    }

    /// 快取命中則直接還原；快取內容損毀時視為未命中
    async fn cached<T, F, Fut>(&self, key: String, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(raw) = self.deps.cache.get(&key).await {
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    tracing::debug!("Cache hit: {}", key);
                    return Ok(value);
                }
                Err(e) => tracing::warn!("Discarding unreadable cache entry {}: {}", key, e),
            }
        }

        let value = fetch().await?;
        match serde_json::to_string(&value) {
            Ok(raw) => self.deps.cache.put(key, raw, None).await,
            Err(e) => tracing::warn!("Could not cache {}: {}", key, e),
        }
        Ok(value)
    }
}

/// 韓元換算為億韓元，小數 1 位；0 或缺值皆視為缺值
fn to_display_units(amount: Option<i64>) -> Option<f64> {
    match amount {
        Some(value) if value != 0 => Some(round_to(value as f64 / DISPLAY_UNIT, 1)),
        _ => None,
    }
}
