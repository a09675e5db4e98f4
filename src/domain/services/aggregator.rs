use crate::domain::model::{PeriodReport, QuarterRecord, ReportBasis};
use crate::utils::error::{AppError, Result};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccountKind {
    Capital,
    Asset,
    Liability,
}

impl AccountKind {
    fn classify(account_name: &str) -> Option<Self> {
        if account_name.contains("자본총계") || account_name == "자본 총계" {
            Some(AccountKind::Capital)
        } else if account_name.contains("자산총계") || account_name == "자산 총계" {
            Some(AccountKind::Asset)
        } else if account_name.contains("부채총계") || account_name == "부채 총계" {
            Some(AccountKind::Liability)
        } else {
            None
        }
    }
}

/// 從單一報告期取出個別(OFS)基礎的資本、資產、負債總計。
/// 合併(CFS)科目一律捨棄；沒有資本總計的報告不產生紀錄
fn quarter_from_report(report: &PeriodReport) -> Option<QuarterRecord> {
    let mut capital = None;
    let mut asset = None;
    let mut liability = None;

    for item in &report.items {
        if item.basis != ReportBasis::Standalone {
            continue;
        }
        let Some(amount) = item.amount else {
            continue;
        };

        match AccountKind::classify(&item.account_name) {
            Some(AccountKind::Capital) => capital = Some(amount),
            Some(AccountKind::Asset) => asset = Some(amount),
            Some(AccountKind::Liability) => liability = Some(amount),
            None => {}
        }
    }

    capital.map(|capital| QuarterRecord {
        quarter_end: report.quarter_end(),
        capital,
        asset,
        liability,
    })
}

/// 彙整季末紀錄：依日期去重（先出現者優先）、遞增排序，
/// 指定 `year_count` 時只保留最近 `year_count * 4` 季
pub fn aggregate(
    reports: &[PeriodReport],
    year_count: Option<usize>,
) -> Result<Vec<QuarterRecord>> {
    let mut seen = HashSet::new();
    let mut records: Vec<QuarterRecord> = reports
        .iter()
        .filter_map(quarter_from_report)
        .filter(|record| seen.insert(record.quarter_end))
        .collect();

    records.sort_by_key(|record| record.quarter_end);

    if let Some(years) = year_count {
        let keep = years.saturating_mul(4);
        if records.len() > keep {
            records.drain(..records.len() - keep);
        }
    }

    if records.is_empty() {
        return Err(AppError::DataInsufficient {
            message: "No capital (자본총계) figures found in the standalone statements".to_string(),
        });
    }

    tracing::debug!("Aggregated {} quarter records", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{LineItem, ReportCode, ReportPeriod};
    use chrono::NaiveDate;

    fn report(year: i32, code: ReportCode, items: Vec<LineItem>) -> PeriodReport {
        PeriodReport {
            period: ReportPeriod::new(year, code),
            items,
        }
    }

    fn ofs(name: &str, amount: &str) -> LineItem {
        LineItem::from_raw(name, "OFS", amount)
    }

    fn cfs(name: &str, amount: &str) -> LineItem {
        LineItem::from_raw(name, "CFS", amount)
    }

    #[test]
    fn test_only_standalone_basis_is_used() {
        let reports = vec![report(
            2024,
            ReportCode::FirstQuarter,
            vec![
                cfs("자본총계", "999"),
                ofs("자본총계", "1,000"),
                ofs("자산총계", "5,000"),
                ofs("부채총계", "4,000"),
                cfs("부채총계", "8,888"),
            ],
        )];

        let records = aggregate(&reports, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].capital, 1_000);
        assert_eq!(records[0].asset, Some(5_000));
        assert_eq!(records[0].liability, Some(4_000));
    }

    #[test]
    fn test_consolidated_only_report_yields_nothing() {
        let reports = vec![report(2024, ReportCode::FirstQuarter, vec![cfs("자본총계", "1,000")])];

        let err = aggregate(&reports, None).unwrap_err();
        assert!(matches!(err, AppError::DataInsufficient { .. }));
    }

    #[test]
    fn test_report_without_capital_is_skipped() {
        let reports = vec![
            report(2024, ReportCode::FirstQuarter, vec![ofs("자산총계", "5,000"), ofs("자본총계", "-")]),
            report(2024, ReportCode::HalfYear, vec![ofs("자본 총계", "1,100")]),
        ];

        let records = aggregate(&reports, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quarter_end, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        assert_eq!(records[0].asset, None);
    }

    #[test]
    fn test_dedup_first_wins_and_sorted() {
        let reports = vec![
            report(2024, ReportCode::HalfYear, vec![ofs("자본총계", "300")]),
            report(2023, ReportCode::Annual, vec![ofs("자본총계", "200")]),
            report(2024, ReportCode::HalfYear, vec![ofs("자본총계", "999")]),
            report(2023, ReportCode::ThirdQuarter, vec![ofs("자본총계", "100")]),
        ];

        let records = aggregate(&reports, None).unwrap();
        let capitals: Vec<i64> = records.iter().map(|r| r.capital).collect();
        assert_eq!(capitals, vec![100, 200, 300]);
        assert!(records.windows(2).all(|w| w[0].quarter_end < w[1].quarter_end));
    }

    #[test]
    fn test_trailing_year_window() {
        let reports: Vec<PeriodReport> = (2021..=2024)
            .flat_map(|year| {
                ReportCode::ALL
                    .into_iter()
                    .map(move |code| report(year, code, vec![ofs("자본총계", "1,000")]))
            })
            .collect();

        let records = aggregate(&reports, Some(2)).unwrap();
        assert_eq!(records.len(), 8);
        assert_eq!(records[0].quarter_end, NaiveDate::from_ymd_opt(2023, 3, 31).unwrap());
        assert_eq!(records[7].quarter_end, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_empty_input_is_data_insufficient() {
        assert!(matches!(aggregate(&[], Some(3)), Err(AppError::DataInsufficient { .. })));
    }
}
