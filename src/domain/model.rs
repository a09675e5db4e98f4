use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 日期 → 殖利率（%）。非營業日不會出現在對照表中
pub type RateObservations = BTreeMap<NaiveDate, f64>;

/// 與水準序列逐位對齊的變化率，第 0 筆固定為 `None`
pub type ChangeSeries = Vec<Option<f64>>;

/// 與變化率序列逐位對齊的敏感度比值
pub type DurationSeries = Vec<Option<f64>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub corp_code: String,
}

/// 財報編製基礎：個別(OFS) 或合併(CFS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportBasis {
    Standalone,
    Consolidated,
    Other,
}

impl ReportBasis {
    pub fn from_code(code: &str) -> Self {
        match code {
            "OFS" => ReportBasis::Standalone,
            "CFS" => ReportBasis::Consolidated,
            _ => ReportBasis::Other,
        }
    }
}

/// DART 定期報告種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportCode {
    FirstQuarter,
    HalfYear,
    ThirdQuarter,
    Annual,
}

impl ReportCode {
    pub const ALL: [ReportCode; 4] = [
        ReportCode::FirstQuarter,
        ReportCode::HalfYear,
        ReportCode::ThirdQuarter,
        ReportCode::Annual,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ReportCode::FirstQuarter => "11013",
            ReportCode::HalfYear => "11012",
            ReportCode::ThirdQuarter => "11014",
            ReportCode::Annual => "11011",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportCode::FirstQuarter => "1Q",
            ReportCode::HalfYear => "2Q",
            ReportCode::ThirdQuarter => "3Q",
            ReportCode::Annual => "4Q",
        }
    }

    fn quarter_end_month_day(&self) -> (u32, u32) {
        match self {
            ReportCode::FirstQuarter => (3, 31),
            ReportCode::HalfYear => (6, 30),
            ReportCode::ThirdQuarter => (9, 30),
            ReportCode::Annual => (12, 31),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub year: i32,
    pub code: ReportCode,
}

impl ReportPeriod {
    pub fn new(year: i32, code: ReportCode) -> Self {
        Self { year, code }
    }

    pub fn quarter_end(&self) -> NaiveDate {
        let (month, day) = self.code.quarter_end_month_day();
        // 季末日期固定存在，只有年份超出 chrono 範圍才會失敗
        NaiveDate::from_ymd_opt(self.year, month, day).unwrap_or(NaiveDate::MAX)
    }

    /// `start_year..=end_year` 內所有季末不晚於 `as_of` 的報告期
    pub fn range(start_year: i32, end_year: i32, as_of: NaiveDate) -> Vec<ReportPeriod> {
        (start_year..=end_year)
            .flat_map(|year| {
                ReportCode::ALL
                    .into_iter()
                    .map(move |code| ReportPeriod::new(year, code))
            })
            .filter(|period| period.quarter_end() <= as_of)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub account_name: String,
    pub basis: ReportBasis,
    pub amount: Option<i64>,
}

impl LineItem {
    /// 由 DART 原始欄位建立，金額為空、"-" 或無法解析時視為缺值
    pub fn from_raw(account_name: &str, basis_code: &str, raw_amount: &str) -> Self {
        Self {
            account_name: account_name.to_string(),
            basis: ReportBasis::from_code(basis_code),
            amount: parse_amount(raw_amount),
        }
    }
}

pub fn parse_amount(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }
    trimmed.replace(',', "").parse::<i64>().ok()
}

/// 單一報告期的主要帳戶
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub period: ReportPeriod,
    pub items: Vec<LineItem>,
}

impl PeriodReport {
    pub fn quarter_end(&self) -> NaiveDate {
        self.period.quarter_end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterRecord {
    pub quarter_end: NaiveDate,
    pub capital: i64,
    pub asset: Option<i64>,
    pub liability: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationOutcome {
    pub series: DurationSeries,
    pub summary: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationPair {
    pub us10y: DurationOutcome,
    pub kr10y: DurationOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub quarters: Vec<NaiveDate>,
    pub capital_level: Vec<Option<f64>>,
    pub asset_level: Vec<Option<f64>>,
    pub liability_level: Vec<Option<f64>>,
    pub us10y_level: Vec<Option<f64>>,
    pub kr10y_level: Vec<Option<f64>>,
    pub capital_qoq: ChangeSeries,
    pub us10y_change: ChangeSeries,
    pub kr10y_change: ChangeSeries,
    pub duration: DurationPair,
    pub company: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpEntry {
    pub corp_name: String,
    pub corp_code: String,
    pub stock_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub dart_api: bool,
    pub ecos_api: bool,
    pub fred_api: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParams {
    pub max_lookback_days: u32,
    pub outlier_threshold: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            max_lookback_days: 10,
            outlier_threshold: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234,567"), Some(1_234_567));
        assert_eq!(parse_amount("-5,000"), Some(-5_000));
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_report_period_quarter_end() {
        let period = ReportPeriod::new(2024, ReportCode::HalfYear);
        assert_eq!(period.quarter_end(), NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        assert_eq!(ReportCode::Annual.code(), "11011");
    }

    #[test]
    fn test_report_period_range_skips_future_quarters() {
        let as_of = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
        let periods = ReportPeriod::range(2023, 2024, as_of);
        assert_eq!(periods.len(), 6);
        assert_eq!(periods.last().unwrap().code, ReportCode::HalfYear);
    }

    #[test]
    fn test_report_basis_from_code() {
        assert_eq!(ReportBasis::from_code("OFS"), ReportBasis::Standalone);
        assert_eq!(ReportBasis::from_code("CFS"), ReportBasis::Consolidated);
        assert_eq!(ReportBasis::from_code(""), ReportBasis::Other);
    }
}
