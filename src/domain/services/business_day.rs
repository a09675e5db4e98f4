use crate::domain::model::RateObservations;
use chrono::{Duration, NaiveDate};

/// 取 `target` 當日的利率；若當日無資料（週末、假日），
/// 依序往前找 `1..=max_lookback_days` 天內最近的一筆
pub fn match_rate(
    observations: &RateObservations,
    target: NaiveDate,
    max_lookback_days: u32,
) -> Option<f64> {
    if let Some(value) = observations.get(&target) {
        return Some(*value);
    }

    (1..=i64::from(max_lookback_days))
        .filter_map(|offset| target.checked_sub_signed(Duration::days(offset)))
        .find_map(|date| observations.get(&date).copied())
}

/// 將每個季末日期對齊到利率序列
pub fn align_to_dates(
    observations: &RateObservations,
    dates: &[NaiveDate],
    max_lookback_days: u32,
) -> Vec<Option<f64>> {
    dates
        .iter()
        .map(|date| match_rate(observations, *date, max_lookback_days))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_exact_date_wins() {
        let mut obs = RateObservations::new();
        obs.insert(date(2024, 3, 29), 3.40);
        obs.insert(date(2024, 3, 31), 3.45);

        assert_eq!(match_rate(&obs, date(2024, 3, 31), 10), Some(3.45));
    }

    #[test]
    fn test_falls_back_to_closest_prior_business_day() {
        let mut obs = RateObservations::new();
        obs.insert(date(2024, 3, 27), 3.30);
        obs.insert(date(2024, 3, 29), 3.40);

        // 2024-03-31 為週日
        assert_eq!(match_rate(&obs, date(2024, 3, 31), 10), Some(3.40));
    }

    #[test]
    fn test_never_looks_past_window() {
        let mut obs = RateObservations::new();
        obs.insert(date(2024, 3, 21), 3.10);

        assert_eq!(match_rate(&obs, date(2024, 3, 31), 9), None);
        // 視窗含端點
        assert_eq!(match_rate(&obs, date(2024, 3, 31), 10), Some(3.10));
    }

    #[test]
    fn test_ignores_later_dates() {
        let mut obs = RateObservations::new();
        obs.insert(date(2024, 4, 1), 3.50);

        assert_eq!(match_rate(&obs, date(2024, 3, 31), 10), None);
    }

    #[test]
    fn test_zero_lookback_only_matches_exact() {
        let mut obs = RateObservations::new();
        obs.insert(date(2024, 3, 29), 3.40);

        assert_eq!(match_rate(&obs, date(2024, 3, 30), 0), None);
    }

    #[test]
    fn test_align_to_dates() {
        let mut obs = RateObservations::new();
        obs.insert(date(2023, 12, 29), 3.18);
        obs.insert(date(2024, 3, 29), 3.42);

        let quarter_ends = [date(2023, 12, 31), date(2024, 3, 31), date(2024, 6, 30)];
        let aligned = align_to_dates(&obs, &quarter_ends, 10);
        assert_eq!(aligned, vec![Some(3.18), Some(3.42), None]);
    }
}
